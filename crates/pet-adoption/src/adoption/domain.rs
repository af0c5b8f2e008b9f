use std::fmt;

use serde::Serialize;

use super::validation::{self, ValidationError};

/// Sequential identifier assigned to applications at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ApplicationId(pub u32);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An animal listed for adoption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub vaccinated: bool,
    pub adopted: bool,
}

impl Pet {
    /// Build a new, unadopted pet after checking the name and breed rules.
    pub fn new(
        name: impl Into<String>,
        breed: impl Into<String>,
        age: u32,
        vaccinated: bool,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let breed = breed.into();
        validation::validate_name(&name)?;
        validation::validate_breed(&breed)?;

        Ok(Self {
            name,
            breed,
            age,
            vaccinated,
            adopted: false,
        })
    }

    pub fn is_available(&self) -> bool {
        !self.adopted
    }

    pub fn availability_label(&self) -> &'static str {
        if self.adopted {
            "Adopted"
        } else {
            "Available"
        }
    }
}

/// Lifecycle of an adoption application. Approved and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome chosen by an administrator for a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub const fn resulting_status(self) -> ApplicationStatus {
        match self {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// A request by a user to adopt a pet, referenced by pet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: ApplicationId,
    pub username: String,
    pub pet_name: String,
    pub status: ApplicationStatus,
}

impl Application {
    pub fn pending(
        id: ApplicationId,
        username: impl Into<String>,
        pet_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            pet_name: pet_name.into(),
            status: ApplicationStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// Coarse role used for login selection and the on-disk role column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const fn code(self) -> u8 {
        match self {
            Role::Admin => 0,
            Role::User => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Role::Admin),
            1 => Some(Role::User),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

/// Credentials shared by every account kind. Passwords are held in plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A registered user, tagged by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum User {
    Admin(Account),
    Regular(Account),
}

impl User {
    pub fn admin(username: impl Into<String>, password: impl Into<String>) -> Self {
        User::Admin(Account::new(username, password))
    }

    pub fn regular(username: impl Into<String>, password: impl Into<String>) -> Self {
        User::Regular(Account::new(username, password))
    }

    pub fn with_role(role: Role, account: Account) -> Self {
        match role {
            Role::Admin => User::Admin(account),
            Role::User => User::Regular(account),
        }
    }

    pub fn account(&self) -> &Account {
        match self {
            User::Admin(account) | User::Regular(account) => account,
        }
    }

    pub fn account_mut(&mut self) -> &mut Account {
        match self {
            User::Admin(account) | User::Regular(account) => account,
        }
    }

    pub fn username(&self) -> &str {
        &self.account().username
    }

    pub fn password(&self) -> &str {
        &self.account().password
    }

    pub fn role(&self) -> Role {
        match self {
            User::Admin(_) => Role::Admin,
            User::Regular(_) => Role::User,
        }
    }

    /// Plaintext comparison against the stored credentials.
    pub fn matches_credentials(&self, username: &str, password: &str) -> bool {
        let account = self.account();
        account.username == username && account.password == password
    }

    /// Menu entries offered to this user after login.
    pub fn dashboard(&self) -> &'static [DashboardAction] {
        match self {
            User::Admin(_) => &ADMIN_DASHBOARD,
            User::Regular(_) => &USER_DASHBOARD,
        }
    }
}

/// Actions reachable from a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    AddAdmin,
    ManageUsers,
    ManagePets,
    ProcessApplications,
    SearchPets,
    BrowsePets,
    CheckStatus,
    ViewHistory,
    Logout,
}

impl DashboardAction {
    pub const fn label(self) -> &'static str {
        match self {
            DashboardAction::AddAdmin => "Add Admin",
            DashboardAction::ManageUsers => "Manage User Accounts",
            DashboardAction::ManagePets => "Manage Pets",
            DashboardAction::ProcessApplications => "Process Applications",
            DashboardAction::SearchPets => "Search Pets",
            DashboardAction::BrowsePets => "Browse Pets",
            DashboardAction::CheckStatus => "Check Application Status",
            DashboardAction::ViewHistory => "View Adoption History",
            DashboardAction::Logout => "Logout",
        }
    }
}

static ADMIN_DASHBOARD: [DashboardAction; 6] = [
    DashboardAction::AddAdmin,
    DashboardAction::ManageUsers,
    DashboardAction::ManagePets,
    DashboardAction::ProcessApplications,
    DashboardAction::SearchPets,
    DashboardAction::Logout,
];

static USER_DASHBOARD: [DashboardAction; 4] = [
    DashboardAction::BrowsePets,
    DashboardAction::CheckStatus,
    DashboardAction::ViewHistory,
    DashboardAction::Logout,
];
