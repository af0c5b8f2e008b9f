use tracing::{info, warn};

use super::auth::{
    self, AuthError, DefaultAdmin, Session, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME,
};
use super::codec::ApplicationLedger;
use super::domain::{Application, ApplicationId, ApplicationStatus, Decision, Pet, Role, User};
use super::search::PetQuery;
use super::store::{RecordStore, StoreError};
use super::validation::{self, PasswordPolicy, ValidationError};
use crate::error::ErrorKind;

/// Rules the repository applies on top of the record validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdoptionPolicy {
    pub password: PasswordPolicy,
    pub default_admin: DefaultAdmin,
    /// Seed the two sample pets when the store has never held pets.
    pub seed_sample_pets: bool,
}

impl Default for AdoptionPolicy {
    fn default() -> Self {
        Self {
            password: PasswordPolicy::Basic,
            default_admin: DefaultAdmin::Enabled,
            seed_sample_pets: true,
        }
    }
}

/// Fields for a new pet, validated by [`AdoptionRepository::add_pet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPet {
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub vaccinated: bool,
}

/// Partial pet update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetChanges {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<u32>,
    pub vaccinated: Option<bool>,
}

/// Partial account update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Result of deciding an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub application: Application,
    /// Index of the pet marked adopted, when the decision was an approval and a pet matched.
    pub adopted_pet: Option<usize>,
}

/// Result of deleting a pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetRemoval {
    pub pet: Pet,
    pub withdrawn_applications: Vec<ApplicationId>,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("index {index} is out of range ({len} records)")]
    OutOfRange { index: usize, len: usize },
    #[error("username '{0}' already exists")]
    DuplicateUsername(String),
    #[error("no user named '{0}'")]
    UnknownUser(String),
    #[error("no available pet named '{0}'")]
    PetUnavailable(String),
    #[error("no application ids left after {last}")]
    IdsExhausted { last: ApplicationId },
    #[error("application {id} is already {status}")]
    AlreadyDecided {
        id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::OutOfRange { .. } | RepositoryError::IdsExhausted { .. } => {
                ErrorKind::OutOfRange
            }
            RepositoryError::Store(_) => ErrorKind::FileOperation,
            RepositoryError::Invalid(_)
            | RepositoryError::DuplicateUsername(_)
            | RepositoryError::UnknownUser(_)
            | RepositoryError::PetUnavailable(_)
            | RepositoryError::AlreadyDecided { .. } => ErrorKind::InvalidInput,
        }
    }
}

fn check_index(index: usize, len: usize) -> Result<(), RepositoryError> {
    if index < len {
        Ok(())
    } else {
        Err(RepositoryError::OutOfRange { index, len })
    }
}

/// Which file is rewritten first when a change spans pets and applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOrder {
    PetsFirst,
    LedgerFirst,
}

fn sample_pets() -> Vec<Pet> {
    vec![
        Pet {
            name: "Whiskers".to_string(),
            breed: "Siamese".to_string(),
            age: 2,
            vaccinated: true,
            adopted: false,
        },
        Pet {
            name: "Rex".to_string(),
            breed: "Labrador".to_string(),
            age: 3,
            vaccinated: true,
            adopted: false,
        },
    ]
}

/// Authoritative users, pets, and applications with write-through persistence.
///
/// Every mutation builds the new collection, hands it to the store, and only replaces the
/// in-memory copy once the store accepted it. A failed save leaves the repository unchanged.
pub struct AdoptionRepository<S> {
    store: S,
    policy: AdoptionPolicy,
    users: Vec<User>,
    pets: Vec<Pet>,
    ledger: ApplicationLedger,
}

impl<S: RecordStore> AdoptionRepository<S> {
    /// Load the store, creating the bootstrap administrator when no users exist.
    pub fn open(store: S, policy: AdoptionPolicy) -> Result<Self, StoreError> {
        let snapshot = store.load()?;
        let mut repository = Self {
            store,
            policy,
            users: snapshot.users,
            pets: snapshot.pets,
            ledger: snapshot.ledger,
        };

        if repository.users.is_empty() {
            let users = vec![User::admin(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)];
            repository.store.save_users(&users)?;
            repository.users = users;
            warn!(
                username = DEFAULT_ADMIN_USERNAME,
                "no users found, created bootstrap administrator"
            );
        }

        if !snapshot.pets_initialized && policy.seed_sample_pets {
            let pets = sample_pets();
            repository.store.save_pets(&pets)?;
            repository.pets = pets;
            info!("seeded sample pets");
        }

        info!(
            users = repository.users.len(),
            pets = repository.pets.len(),
            applications = repository.ledger.applications.len(),
            "adoption records loaded"
        );
        Ok(repository)
    }

    pub fn policy(&self) -> AdoptionPolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn commit_users(&mut self, users: Vec<User>) -> Result<(), RepositoryError> {
        self.store.save_users(&users)?;
        self.users = users;
        Ok(())
    }

    fn commit_pets(&mut self, pets: Vec<Pet>) -> Result<(), RepositoryError> {
        self.store.save_pets(&pets)?;
        self.pets = pets;
        Ok(())
    }

    fn commit_ledger(&mut self, ledger: ApplicationLedger) -> Result<(), RepositoryError> {
        self.store.save_applications(&ledger)?;
        self.ledger = ledger;
        Ok(())
    }

    /// Persist a change that touches both pets and applications. Memory is replaced only once
    /// both saves succeed; if the second save fails the first file is rewritten with the
    /// current in-memory contents.
    fn commit_pets_and_ledger(
        &mut self,
        pets: Vec<Pet>,
        ledger: ApplicationLedger,
        order: WriteOrder,
    ) -> Result<(), RepositoryError> {
        match order {
            WriteOrder::PetsFirst => {
                self.store.save_pets(&pets)?;
                if let Err(err) = self.store.save_applications(&ledger) {
                    if let Err(restore) = self.store.save_pets(&self.pets) {
                        warn!(error = %restore, "could not restore pets file after failed save");
                    }
                    return Err(err.into());
                }
            }
            WriteOrder::LedgerFirst => {
                self.store.save_applications(&ledger)?;
                if let Err(err) = self.store.save_pets(&pets) {
                    if let Err(restore) = self.store.save_applications(&self.ledger) {
                        warn!(
                            error = %restore,
                            "could not restore applications file after failed save"
                        );
                    }
                    return Err(err.into());
                }
            }
        }

        self.pets = pets;
        self.ledger = ledger;
        Ok(())
    }

    // Users

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Users ordered by username, paired with their index for follow-up operations.
    pub fn users_sorted(&self) -> Vec<(usize, &User)> {
        let mut users: Vec<_> = self.users.iter().enumerate().collect();
        users.sort_by(|(_, a), (_, b)| a.username().cmp(b.username()));
        users
    }

    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username() == username)
    }

    fn ensure_username_free(
        &self,
        username: &str,
        except: Option<usize>,
    ) -> Result<(), RepositoryError> {
        let taken = self
            .users
            .iter()
            .enumerate()
            .any(|(index, user)| Some(index) != except && user.username() == username);
        if taken {
            Err(RepositoryError::DuplicateUsername(username.to_string()))
        } else {
            Ok(())
        }
    }

    /// Append a user after checking the username rules, uniqueness, and password policy.
    pub fn add_user(&mut self, user: User) -> Result<(), RepositoryError> {
        validation::validate_username(user.username())?;
        self.policy.password.validate(user.password())?;
        self.ensure_username_free(user.username(), None)?;

        let mut users = self.users.clone();
        let (username, role) = (user.username().to_string(), user.role());
        users.push(user);
        self.commit_users(users)?;

        info!(%username, role = role.label(), "user added");
        Ok(())
    }

    /// Self-service registration always creates a regular user.
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), RepositoryError> {
        self.add_user(User::regular(username, password))
    }

    pub fn add_admin(&mut self, username: &str, password: &str) -> Result<(), RepositoryError> {
        self.add_user(User::admin(username, password))
    }

    pub fn update_user(
        &mut self,
        index: usize,
        changes: UserChanges,
    ) -> Result<&User, RepositoryError> {
        check_index(index, self.users.len())?;

        if let Some(username) = changes.username.as_deref() {
            validation::validate_username(username)?;
            self.ensure_username_free(username, Some(index))?;
        }
        if let Some(password) = changes.password.as_deref() {
            self.policy.password.validate(password)?;
        }

        let mut users = self.users.clone();
        let account = users[index].account_mut();
        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(password) = changes.password {
            account.password = password;
        }
        self.commit_users(users)?;

        let user = &self.users[index];
        info!(index, username = user.username(), "user updated");
        Ok(user)
    }

    pub fn delete_user(&mut self, index: usize) -> Result<User, RepositoryError> {
        check_index(index, self.users.len())?;

        let mut users = self.users.clone();
        let removed = users.remove(index);
        self.commit_users(users)?;

        info!(index, username = removed.username(), "user deleted");
        Ok(removed)
    }

    pub fn authenticate(
        &self,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        auth::login(&self.users, self.policy.default_admin, role, username, password)
    }

    // Pets

    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    pub fn available_pets(&self) -> Vec<(usize, &Pet)> {
        self.pets
            .iter()
            .enumerate()
            .filter(|(_, pet)| pet.is_available())
            .collect()
    }

    /// Adoption history: every pet that has been adopted.
    pub fn adopted_pets(&self) -> Vec<&Pet> {
        self.pets.iter().filter(|pet| pet.adopted).collect()
    }

    pub fn add_pet(&mut self, new_pet: NewPet) -> Result<&Pet, RepositoryError> {
        let pet = Pet::new(new_pet.name, new_pet.breed, new_pet.age, new_pet.vaccinated)?;

        let mut pets = self.pets.clone();
        pets.push(pet);
        self.commit_pets(pets)?;

        let index = self.pets.len() - 1;
        let pet = &self.pets[index];
        info!(index, name = %pet.name, "pet added");
        Ok(pet)
    }

    pub fn edit_pet(
        &mut self,
        index: usize,
        changes: PetChanges,
    ) -> Result<&Pet, RepositoryError> {
        check_index(index, self.pets.len())?;
        if let Some(name) = changes.name.as_deref() {
            validation::validate_name(name)?;
        }
        if let Some(breed) = changes.breed.as_deref() {
            validation::validate_breed(breed)?;
        }

        let mut pets = self.pets.clone();
        let pet = &mut pets[index];
        if let Some(name) = changes.name {
            pet.name = name;
        }
        if let Some(breed) = changes.breed {
            pet.breed = breed;
        }
        if let Some(age) = changes.age {
            pet.age = age;
        }
        if let Some(vaccinated) = changes.vaccinated {
            pet.vaccinated = vaccinated;
        }
        self.commit_pets(pets)?;

        let pet = &self.pets[index];
        info!(index, name = %pet.name, "pet updated");
        Ok(pet)
    }

    /// Remove a pet. Pending applications naming it are withdrawn unless another pet still
    /// carries the same name. Pets and applications are saved together or not at all.
    pub fn delete_pet(&mut self, index: usize) -> Result<PetRemoval, RepositoryError> {
        check_index(index, self.pets.len())?;

        let mut pets = self.pets.clone();
        let removed = pets.remove(index);
        let name_still_listed = pets.iter().any(|pet| pet.name == removed.name);

        let mut ledger = self.ledger.clone();
        let mut withdrawn_applications = Vec::new();
        if !name_still_listed {
            ledger.applications.retain(|application| {
                let orphaned = application.is_pending() && application.pet_name == removed.name;
                if orphaned {
                    withdrawn_applications.push(application.id);
                }
                !orphaned
            });
        }

        if withdrawn_applications.is_empty() {
            self.commit_pets(pets)?;
        } else {
            self.commit_pets_and_ledger(pets, ledger, WriteOrder::PetsFirst)?;
            info!(
                count = withdrawn_applications.len(),
                "withdrew pending applications for deleted pet"
            );
        }
        info!(index, name = %removed.name, "pet deleted");

        Ok(PetRemoval {
            pet: removed,
            withdrawn_applications,
        })
    }

    pub fn search_pets(&self, query: &PetQuery) -> Vec<(usize, &Pet)> {
        self.pets
            .iter()
            .enumerate()
            .filter(|(_, pet)| query.matches(pet))
            .collect()
    }

    // Applications

    pub fn applications(&self) -> &[Application] {
        &self.ledger.applications
    }

    pub fn pending_applications(&self) -> Vec<(usize, &Application)> {
        self.ledger
            .applications
            .iter()
            .enumerate()
            .filter(|(_, application)| application.is_pending())
            .collect()
    }

    pub fn applications_for(&self, username: &str) -> Vec<&Application> {
        self.ledger
            .applications
            .iter()
            .filter(|application| application.username == username)
            .collect()
    }

    /// The id the next created application will receive.
    pub fn next_application_id(&self) -> ApplicationId {
        self.ledger.next_id
    }

    pub fn create_application(
        &mut self,
        username: &str,
        pet_name: &str,
    ) -> Result<&Application, RepositoryError> {
        if self.find_user(username).is_none() {
            return Err(RepositoryError::UnknownUser(username.to_string()));
        }
        if !self
            .pets
            .iter()
            .any(|pet| pet.name == pet_name && pet.is_available())
        {
            return Err(RepositoryError::PetUnavailable(pet_name.to_string()));
        }

        let mut ledger = self.ledger.clone();
        let id = ledger.allocate_id().ok_or(RepositoryError::IdsExhausted {
            last: self.ledger.next_id,
        })?;
        ledger
            .applications
            .push(Application::pending(id, username, pet_name));
        self.commit_ledger(ledger)?;

        info!(%id, username, pet_name, "application created");
        let index = self.ledger.applications.len() - 1;
        Ok(&self.ledger.applications[index])
    }

    /// Decide a pending application. Approval marks the first pet with the application's pet
    /// name as adopted; rejection leaves pets untouched.
    pub fn process_application(
        &mut self,
        index: usize,
        decision: Decision,
    ) -> Result<ProcessOutcome, RepositoryError> {
        check_index(index, self.ledger.applications.len())?;
        let current = &self.ledger.applications[index];
        if current.status.is_terminal() {
            return Err(RepositoryError::AlreadyDecided {
                id: current.id,
                status: current.status,
            });
        }

        let mut ledger = self.ledger.clone();
        ledger.applications[index].status = decision.resulting_status();
        let application = ledger.applications[index].clone();

        let adopted_pet = match decision {
            Decision::Approve => self
                .pets
                .iter()
                .position(|pet| pet.name == application.pet_name),
            Decision::Reject => None,
        };

        match adopted_pet {
            Some(pet_index) => {
                let mut pets = self.pets.clone();
                pets[pet_index].adopted = true;
                self.commit_pets_and_ledger(pets, ledger, WriteOrder::LedgerFirst)?;
            }
            None => {
                self.commit_ledger(ledger)?;
                if decision == Decision::Approve {
                    warn!(
                        id = %application.id,
                        pet_name = %application.pet_name,
                        "approved application names no listed pet"
                    );
                }
            }
        }

        info!(
            id = %application.id,
            status = application.status.label(),
            "application processed"
        );
        Ok(ProcessOutcome {
            application,
            adopted_pet,
        })
    }
}
