//! Line-oriented menus over an [`AdoptionRepository`].
//!
//! Menus are numbered from 1 and `0` backs out. Every free-text prompt is retried up to the
//! configured attempt budget before the operation is cancelled back to the menu. Repository
//! failures are reported to the user and never end the session.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use pet_adoption::adoption::validation::{self, PasswordPolicy};
use pet_adoption::adoption::{
    AdoptionRepository, DashboardAction, Decision, NewPet, Pet, PetChanges, PetQuery,
    RecordStore, RepositoryError, Role, Session, User, UserChanges,
};
use tracing::warn;

pub(crate) struct Prompter<R, W> {
    input: R,
    output: W,
    max_attempts: u32,
    closed: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub(crate) fn new(input: R, output: W, max_attempts: u32) -> Self {
        Self {
            input,
            output,
            max_attempts: max_attempts.max(1),
            closed: false,
        }
    }

    /// True once the input stream has ended.
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// One raw line without its terminator; `None` at end of input.
    pub(crate) fn line(&mut self, label: &str) -> io::Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.closed = true;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    /// Ask until `parse` accepts the input. `None` when attempts run out or input ends.
    pub(crate) fn ask<T>(
        &mut self,
        label: &str,
        mut parse: impl FnMut(&str) -> Result<T, String>,
    ) -> io::Result<Option<T>> {
        for attempt in 1..=self.max_attempts {
            let Some(raw) = self.line(label)? else {
                return Ok(None);
            };
            match parse(&raw) {
                Ok(value) => return Ok(Some(value)),
                Err(reason) => {
                    let remaining = self.max_attempts - attempt;
                    if remaining > 0 {
                        self.say(format!("{reason} ({remaining} attempts left)"))?;
                    } else {
                        self.say(reason)?;
                    }
                }
            }
        }

        warn!(
            prompt = label.trim(),
            attempts = self.max_attempts,
            "prompt cancelled after repeated invalid input"
        );
        self.say("Too many invalid attempts, returning to menu.")?;
        Ok(None)
    }

    /// Numbered menu choice in `1..=max`. `0`, exhausted attempts, and end of input give `None`.
    pub(crate) fn choose(&mut self, label: &str, max: usize) -> io::Result<Option<usize>> {
        let choice = self.ask(label, |raw| match raw.trim().parse::<usize>() {
            Ok(choice) if choice <= max => Ok(choice),
            _ => Err(format!("Please enter a number between 0 and {max}.")),
        })?;
        Ok(choice.filter(|choice| *choice > 0))
    }

    pub(crate) fn confirm(&mut self, label: &str) -> io::Result<Option<bool>> {
        self.ask(label, |raw| match raw.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            _ => Err("Please answer y or n.".to_string()),
        })
    }
}

fn failure(err: &RepositoryError) -> String {
    warn!(error = %err, kind = ?err.kind(), "operation failed");
    format!("Error: {err}")
}

fn password_hint(policy: PasswordPolicy) -> &'static str {
    match policy {
        PasswordPolicy::Basic => "Password: ",
        PasswordPolicy::Strict => "Password (8+ chars, letters and digits): ",
    }
}

fn describe_pet(pet: &Pet) -> String {
    format!(
        "{} | {} | {} yrs | Vaccinated: {} | {}",
        pet.name,
        pet.breed,
        pet.age,
        if pet.vaccinated { "Yes" } else { "No" },
        pet.availability_label()
    )
}

fn age_prompt(raw: &str) -> Result<u32, String> {
    validation::parse_age(raw).map_err(|err| err.to_string())
}

fn whole_years(raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse()
        .map_err(|_| "Please enter a whole number of years.".to_string())
}

/// The interactive session: main menu, login, and the role dashboards.
pub(crate) struct Console<'a, S, R, W> {
    repository: &'a mut AdoptionRepository<S>,
    prompter: Prompter<R, W>,
}

impl<'a, S: RecordStore, R: BufRead, W: Write> Console<'a, S, R, W> {
    pub(crate) fn new(repository: &'a mut AdoptionRepository<S>, prompter: Prompter<R, W>) -> Self {
        Self {
            repository,
            prompter,
        }
    }

    pub(crate) fn run(mut self) -> io::Result<()> {
        self.prompter.say("Welcome to the Pet Adoption System")?;
        loop {
            self.prompter
                .say("\n=== MAIN MENU ===\n1. Login\n2. Register\n3. Exit")?;
            match self.prompter.choose("Enter choice: ", 3)? {
                Some(1) => self.login()?,
                Some(2) => self.register()?,
                Some(_) => break,
                None if self.prompter.is_closed() => break,
                None => {}
            }
        }
        self.prompter.say("Goodbye!")
    }

    fn login(&mut self) -> io::Result<()> {
        self.prompter
            .say("\n=== LOGIN ===\n1. Admin\n2. User\n0. Back to main menu")?;
        let role = match self.prompter.choose("Login as: ", 2)? {
            Some(1) => Role::Admin,
            Some(_) => Role::User,
            None => return Ok(()),
        };

        for _ in 0..self.prompter.max_attempts {
            let Some(username) = self.prompter.line("Username: ")? else {
                return Ok(());
            };
            let Some(password) = self.prompter.line("Password: ")? else {
                return Ok(());
            };
            match self.repository.authenticate(role, &username, &password) {
                Ok(session) => return self.dashboard(session),
                Err(err) => self.prompter.say(format!("Login failed: {err}"))?,
            }
        }
        self.prompter
            .say("Too many failed login attempts, returning to menu.")
    }

    /// Username and password prompts shared by registration and admin creation.
    fn credentials(&mut self) -> io::Result<Option<(String, String)>> {
        let repository = &*self.repository;
        let Some(username) = self.prompter.ask(
            "Username (4-20 letters, digits, or single spaces): ",
            |raw| {
                validation::validate_username(raw).map_err(|err| err.to_string())?;
                if repository.find_user(raw).is_some() {
                    return Err(format!("Username '{raw}' is already taken."));
                }
                Ok(raw.to_string())
            },
        )?
        else {
            return Ok(None);
        };

        let policy = repository.policy().password;
        let Some(password) = self.prompter.ask(password_hint(policy), |raw| {
            policy
                .validate(raw)
                .map(|()| raw.to_string())
                .map_err(|err| err.to_string())
        })?
        else {
            return Ok(None);
        };
        Ok(Some((username, password)))
    }

    fn register(&mut self) -> io::Result<()> {
        self.prompter.say("\n=== REGISTER ===")?;
        let Some((username, password)) = self.credentials()? else {
            return Ok(());
        };
        let message = match self.repository.register(&username, &password) {
            Ok(()) => format!("Registration successful. Welcome, {username}!"),
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn dashboard(&mut self, session: Session) -> io::Result<()> {
        self.prompter
            .say(format!("\nWelcome, {}!", session.username()))?;
        if session.via_default_credentials() {
            self.prompter.say(
                "Signed in with the default administrator credentials. Change them soon.",
            )?;
        }

        let title = match session.user() {
            User::Admin(_) => "ADMIN DASHBOARD",
            User::Regular(_) => "USER DASHBOARD",
        };
        let actions = session.dashboard();
        let mut menu = format!("\n=== {title} ===");
        for (position, action) in actions.iter().enumerate() {
            menu.push_str(&format!("\n{}. {}", position + 1, action.label()));
        }

        loop {
            self.prompter.say(&menu)?;
            let Some(choice) = self.prompter.choose("Enter choice: ", actions.len())? else {
                if self.prompter.is_closed() {
                    return Ok(());
                }
                continue;
            };

            match actions[choice - 1] {
                DashboardAction::AddAdmin => self.add_admin()?,
                DashboardAction::ManageUsers => self.manage_users()?,
                DashboardAction::ManagePets => self.manage_pets()?,
                DashboardAction::ProcessApplications => self.process_applications()?,
                DashboardAction::SearchPets => self.search_pets()?,
                DashboardAction::BrowsePets => self.browse_pets(session.username())?,
                DashboardAction::CheckStatus => self.check_status(session.username())?,
                DashboardAction::ViewHistory => self.view_history()?,
                DashboardAction::Logout => {
                    return self.prompter.say("Logging out...");
                }
            }
        }
    }

    // Admin

    fn add_admin(&mut self) -> io::Result<()> {
        self.prompter.say("\n=== ADD NEW ADMIN ===")?;
        let Some((username, password)) = self.credentials()? else {
            return Ok(());
        };
        let message = match self.repository.add_admin(&username, &password) {
            Ok(()) => format!("Admin '{username}' added."),
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn manage_users(&mut self) -> io::Result<()> {
        let listing: Vec<(usize, String, Role)> = self
            .repository
            .users_sorted()
            .into_iter()
            .map(|(index, user)| (index, user.username().to_string(), user.role()))
            .collect();

        self.prompter.say("\n=== USER ACCOUNTS ===")?;
        for (position, (_, username, role)) in listing.iter().enumerate() {
            self.prompter
                .say(format!("{}. {} ({})", position + 1, username, role.label()))?;
        }
        self.prompter.say("0. Back")?;
        let Some(choice) = self.prompter.choose("Select user: ", listing.len())? else {
            return Ok(());
        };
        let (index, username, _) = &listing[choice - 1];
        let index = *index;

        self.prompter
            .say("1. Edit Username\n2. Edit Password\n3. Delete User\n0. Back")?;
        let message = match self.prompter.choose("Enter choice: ", 3)? {
            Some(1) => {
                let Some(new_username) = self.prompter.ask("New username: ", |raw| {
                    validation::validate_username(raw)
                        .map(|()| raw.to_string())
                        .map_err(|err| err.to_string())
                })?
                else {
                    return Ok(());
                };
                let changes = UserChanges {
                    username: Some(new_username),
                    ..UserChanges::default()
                };
                match self.repository.update_user(index, changes) {
                    Ok(user) => format!("Username changed to '{}'.", user.username()),
                    Err(err) => failure(&err),
                }
            }
            Some(2) => {
                let policy = self.repository.policy().password;
                let Some(password) = self.prompter.ask(password_hint(policy), |raw| {
                    policy
                        .validate(raw)
                        .map(|()| raw.to_string())
                        .map_err(|err| err.to_string())
                })?
                else {
                    return Ok(());
                };
                let changes = UserChanges {
                    password: Some(password),
                    ..UserChanges::default()
                };
                match self.repository.update_user(index, changes) {
                    Ok(user) => format!("Password updated for '{}'.", user.username()),
                    Err(err) => failure(&err),
                }
            }
            Some(_) => {
                let label = format!("Delete '{username}'? (y/n): ");
                if self.prompter.confirm(&label)? != Some(true) {
                    return Ok(());
                }
                match self.repository.delete_user(index) {
                    Ok(user) => format!("User '{}' deleted.", user.username()),
                    Err(err) => failure(&err),
                }
            }
            None => return Ok(()),
        };
        self.prompter.say(message)
    }

    fn manage_pets(&mut self) -> io::Result<()> {
        loop {
            self.prompter.say(
                "\n=== MANAGE PETS ===\n1. Add Pet\n2. Edit Pet\n3. Delete Pet\n4. View All Pets\n0. Back",
            )?;
            match self.prompter.choose("Enter choice: ", 4)? {
                Some(1) => self.add_pet()?,
                Some(2) => self.edit_pet()?,
                Some(3) => self.delete_pet()?,
                Some(_) => self.list_pets()?,
                None => return Ok(()),
            }
        }
    }

    fn ask_name(&mut self, label: &str) -> io::Result<Option<String>> {
        self.prompter.ask(label, |raw| {
            validation::validate_name(raw)
                .map(|()| raw.to_string())
                .map_err(|err| err.to_string())
        })
    }

    fn ask_breed(&mut self, label: &str) -> io::Result<Option<String>> {
        self.prompter.ask(label, |raw| {
            validation::validate_breed(raw)
                .map(|()| raw.to_string())
                .map_err(|err| err.to_string())
        })
    }

    fn add_pet(&mut self) -> io::Result<()> {
        let Some(name) = self.ask_name("Pet name: ")? else {
            return Ok(());
        };
        let Some(breed) = self.ask_breed("Breed: ")? else {
            return Ok(());
        };
        let Some(age) = self
            .prompter
            .ask("Age (e.g. '2', '3 years', or '6 months'): ", age_prompt)?
        else {
            return Ok(());
        };
        let Some(vaccinated) = self.prompter.confirm("Vaccinated? (y/n): ")? else {
            return Ok(());
        };

        let new_pet = NewPet {
            name,
            breed,
            age,
            vaccinated,
        };
        let message = match self.repository.add_pet(new_pet) {
            Ok(pet) => format!("Added {}.", pet.name),
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn list_pets(&mut self) -> io::Result<()> {
        if self.repository.pets().is_empty() {
            return self.prompter.say("No pets on record.");
        }
        let lines: Vec<String> = self
            .repository
            .pets()
            .iter()
            .enumerate()
            .map(|(index, pet)| format!("{}. {}", index + 1, describe_pet(pet)))
            .collect();
        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    fn select_pet(&mut self) -> io::Result<Option<usize>> {
        self.list_pets()?;
        let count = self.repository.pets().len();
        if count == 0 {
            return Ok(None);
        }
        self.prompter.say("0. Back")?;
        Ok(self
            .prompter
            .choose("Select pet: ", count)?
            .map(|choice| choice - 1))
    }

    fn edit_pet(&mut self) -> io::Result<()> {
        let Some(index) = self.select_pet()? else {
            return Ok(());
        };
        let pet = self.repository.pets()[index].clone();
        self.prompter.say(format!(
            "1. Name: {}\n2. Breed: {}\n3. Age: {}\n4. Vaccinated: {}\n0. Back",
            pet.name,
            pet.breed,
            pet.age,
            if pet.vaccinated { "Yes" } else { "No" }
        ))?;

        let changes = match self.prompter.choose("Field to edit: ", 4)? {
            Some(1) => self.ask_name("New name: ")?.map(|name| PetChanges {
                name: Some(name),
                ..PetChanges::default()
            }),
            Some(2) => self.ask_breed("New breed: ")?.map(|breed| PetChanges {
                breed: Some(breed),
                ..PetChanges::default()
            }),
            Some(3) => self
                .prompter
                .ask("New age: ", age_prompt)?
                .map(|age| PetChanges {
                    age: Some(age),
                    ..PetChanges::default()
                }),
            Some(_) => self
                .prompter
                .confirm("Vaccinated? (y/n): ")?
                .map(|vaccinated| PetChanges {
                    vaccinated: Some(vaccinated),
                    ..PetChanges::default()
                }),
            None => None,
        };
        let Some(changes) = changes else {
            return Ok(());
        };

        let message = match self.repository.edit_pet(index, changes) {
            Ok(pet) => format!("Updated: {}", describe_pet(pet)),
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn delete_pet(&mut self) -> io::Result<()> {
        let Some(index) = self.select_pet()? else {
            return Ok(());
        };
        let label = format!("Delete {}? (y/n): ", self.repository.pets()[index].name);
        if self.prompter.confirm(&label)? != Some(true) {
            return Ok(());
        }

        let message = match self.repository.delete_pet(index) {
            Ok(removal) if removal.withdrawn_applications.is_empty() => {
                format!("{} removed.", removal.pet.name)
            }
            Ok(removal) => format!(
                "{} removed; {} pending application(s) withdrawn.",
                removal.pet.name,
                removal.withdrawn_applications.len()
            ),
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn process_applications(&mut self) -> io::Result<()> {
        let pending: Vec<(usize, String)> = self
            .repository
            .pending_applications()
            .into_iter()
            .map(|(index, application)| {
                (
                    index,
                    format!(
                        "#{} {} -> {}",
                        application.id, application.username, application.pet_name
                    ),
                )
            })
            .collect();

        self.prompter.say("\n=== PENDING APPLICATIONS ===")?;
        if pending.is_empty() {
            return self.prompter.say("No pending applications.");
        }
        for (position, (_, summary)) in pending.iter().enumerate() {
            self.prompter.say(format!("{}. {}", position + 1, summary))?;
        }
        self.prompter.say("0. Back")?;
        let Some(choice) = self.prompter.choose("Select application: ", pending.len())? else {
            return Ok(());
        };
        let index = pending[choice - 1].0;

        self.prompter.say("1. Approve\n2. Reject\n0. Back")?;
        let decision = match self.prompter.choose("Decision: ", 2)? {
            Some(1) => Decision::Approve,
            Some(_) => Decision::Reject,
            None => return Ok(()),
        };

        let message = match self.repository.process_application(index, decision) {
            Ok(outcome) => match outcome.adopted_pet {
                Some(pet_index) => format!(
                    "Application #{} approved. {} is now adopted.",
                    outcome.application.id,
                    self.repository.pets()[pet_index].name
                ),
                None => format!(
                    "Application #{} {}.",
                    outcome.application.id,
                    outcome.application.status.label().to_ascii_lowercase()
                ),
            },
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn search_pets(&mut self) -> io::Result<()> {
        self.prompter
            .say("\n=== SEARCH PETS ===\n1. By Name\n2. By Breed\n3. By Age Range\n0. Back")?;
        let query = match self.prompter.choose("Enter choice: ", 3)? {
            Some(1) => self
                .prompter
                .line("Name contains: ")?
                .map(PetQuery::NameContains),
            Some(2) => self
                .prompter
                .line("Breed contains: ")?
                .map(PetQuery::BreedContains),
            Some(_) => {
                let Some(min) = self.prompter.ask("Minimum age: ", whole_years)? else {
                    return Ok(());
                };
                let Some(max) = self.prompter.ask("Maximum age: ", whole_years)? else {
                    return Ok(());
                };
                Some(PetQuery::AgeRange { min, max })
            }
            None => None,
        };
        let Some(query) = query else {
            return Ok(());
        };

        let results: Vec<String> = self
            .repository
            .search_pets(&query)
            .into_iter()
            .map(|(_, pet)| describe_pet(pet))
            .collect();
        if results.is_empty() {
            return self.prompter.say("No pets found.");
        }
        for line in results {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    // Regular user

    fn browse_pets(&mut self, username: &str) -> io::Result<()> {
        let available: Vec<(String, String)> = self
            .repository
            .available_pets()
            .into_iter()
            .map(|(_, pet)| (pet.name.clone(), describe_pet(pet)))
            .collect();

        self.prompter.say("\n=== AVAILABLE PETS ===")?;
        if available.is_empty() {
            return self.prompter.say("No pets are available right now.");
        }
        for (position, (_, summary)) in available.iter().enumerate() {
            self.prompter.say(format!("{}. {}", position + 1, summary))?;
        }
        self.prompter.say("0. Back")?;
        let Some(choice) = self.prompter.choose("Apply for: ", available.len())? else {
            return Ok(());
        };

        let pet_name = &available[choice - 1].0;
        let message = match self.repository.create_application(username, pet_name) {
            Ok(application) => format!(
                "Application submitted for {}! (#{})",
                application.pet_name, application.id
            ),
            Err(err) => failure(&err),
        };
        self.prompter.say(message)
    }

    fn check_status(&mut self, username: &str) -> io::Result<()> {
        let lines: Vec<String> = self
            .repository
            .applications_for(username)
            .into_iter()
            .map(|application| {
                format!(
                    "Application #{}: {} - {}",
                    application.id, application.pet_name, application.status
                )
            })
            .collect();

        self.prompter.say("\n=== APPLICATION STATUS ===")?;
        if lines.is_empty() {
            return self.prompter.say("No applications found.");
        }
        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    fn view_history(&mut self) -> io::Result<()> {
        let lines: Vec<String> = self
            .repository
            .adopted_pets()
            .into_iter()
            .map(|pet| format!("{} ({})", pet.name, pet.breed))
            .collect();

        self.prompter.say("\n=== ADOPTION HISTORY ===")?;
        if lines.is_empty() {
            return self.prompter.say("No adoption history found.");
        }
        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use pet_adoption::adoption::{
        AdoptionPolicy, ApplicationLedger, ApplicationStatus, MemoryStore, Snapshot,
    };

    fn repository() -> AdoptionRepository<MemoryStore> {
        let snapshot = Snapshot {
            users: vec![User::admin("admin", "admin123")],
            pets: vec![
                Pet::new("Whiskers", "Siamese", 2, true).expect("valid pet"),
                Pet::new("Rex", "Labrador", 3, true).expect("valid pet"),
            ],
            ledger: ApplicationLedger::default(),
            pets_initialized: true,
        };
        let policy = AdoptionPolicy {
            seed_sample_pets: false,
            ..AdoptionPolicy::default()
        };
        AdoptionRepository::open(MemoryStore::with_snapshot(snapshot), policy)
            .expect("repository opens")
    }

    fn drive(repository: &mut AdoptionRepository<MemoryStore>, script: &[&str]) -> String {
        let mut input = script.join("\n");
        input.push('\n');
        let mut output = Vec::new();
        let prompter = Prompter::new(Cursor::new(input), &mut output, 3);
        Console::new(repository, prompter)
            .run()
            .expect("session runs");
        String::from_utf8(output).expect("utf8 output")
    }

    #[test]
    fn user_registers_applies_and_checks_status() {
        let mut repository = repository();
        let output = drive(
            &mut repository,
            &[
                "2", "jane", "hunter2", // register
                "1", "2", "jane", "hunter2", // login as user
                "1", "2", // browse, apply for Rex
                "2", // check status
                "4", // logout
                "3",
            ],
        );

        assert!(output.contains("Registration successful. Welcome, jane!"));
        assert!(output.contains("Application submitted for Rex! (#1)"));
        assert!(output.contains("Application #1: Rex - Pending"));
        assert!(output.contains("Logging out..."));
        assert!(output.ends_with("Goodbye!\n"));
        assert_eq!(repository.applications().len(), 1);
        assert_eq!(repository.applications()[0].username, "jane");
    }

    #[test]
    fn admin_approves_pending_application() {
        let mut repository = repository();
        repository.register("jane", "hunter2").expect("registers");
        repository
            .create_application("jane", "Rex")
            .expect("applied");

        let output = drive(
            &mut repository,
            &[
                "1", "1", "admin", "admin123", // login as admin
                "4", "1", "1", // process, first pending, approve
                "6", "3",
            ],
        );

        assert!(output.contains("#1 jane -> Rex"));
        assert!(output.contains("Application #1 approved. Rex is now adopted."));
        assert_eq!(
            repository.applications()[0].status,
            ApplicationStatus::Approved
        );
        assert!(repository.pets()[1].adopted);
    }

    #[test]
    fn admin_adds_pet_with_month_age() {
        let mut repository = repository();
        let output = drive(
            &mut repository,
            &[
                "1", "1", "admin", "admin123",
                "3", "1", "Biscuit", "Corgi", "18 months", "n", // add pet
                "0", "6", "3",
            ],
        );

        assert!(output.contains("Added Biscuit."));
        let biscuit = &repository.pets()[2];
        assert_eq!(biscuit.age, 1);
        assert!(!biscuit.vaccinated);
    }

    #[test]
    fn invalid_input_is_retried_then_cancelled() {
        let mut repository = repository();
        let output = drive(
            &mut repository,
            &["2", "ab", "a!", "x", "3"],
        );

        assert_eq!(output.matches("(2 attempts left)").count(), 1);
        assert_eq!(output.matches("(1 attempts left)").count(), 1);
        assert!(output.contains("Too many invalid attempts, returning to menu."));
        assert_eq!(repository.users().len(), 1);
    }

    #[test]
    fn bad_credentials_are_reported() {
        let mut repository = repository();
        let output = drive(
            &mut repository,
            &["1", "2", "admin", "admin123", "ghost", "nope", "jane", "x", "3"],
        );

        assert_eq!(output.matches("Login failed:").count(), 3);
        assert!(output.contains("Too many failed login attempts"));
    }

    #[test]
    fn default_admin_login_is_flagged() {
        let mut repository = repository();
        repository.delete_user(0).expect("deleted");
        repository.register("jane", "hunter2").expect("registers");

        let output = drive(
            &mut repository,
            &["1", "1", "admin", "admin123", "6", "3"],
        );

        assert!(output.contains("default administrator credentials"));
        assert!(output.contains("=== ADMIN DASHBOARD ==="));
    }

    #[test]
    fn end_of_input_closes_the_session() {
        let mut repository = repository();
        let output = drive(&mut repository, &["1", "2", "jane"]);

        assert!(output.ends_with("Goodbye!\n"));
    }

    #[test]
    fn failed_save_is_reported_without_ending_the_session() {
        let mut repository = repository();
        repository.store().fail_writes(true);

        let output = drive(&mut repository, &["2", "jane", "hunter2", "3"]);

        assert!(output.contains("Error: store unavailable"));
        assert!(output.ends_with("Goodbye!\n"));
        assert_eq!(repository.users().len(), 1);
    }
}
