//! Login against the user list.
//!
//! Passwords are compared in plaintext. Alongside the normal lookup there is a default
//! administrator credential pair that logs in as an administrator whether or not a matching
//! record exists. It is on by default for parity with existing deployments and can be turned
//! off with [`DefaultAdmin::Disabled`].

use tracing::{info, warn};

use super::domain::{DashboardAction, Role, User};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Whether the default administrator credentials are honoured at login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DefaultAdmin {
    #[default]
    Enabled,
    Disabled,
}

impl DefaultAdmin {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enabled" | "on" | "true" | "1" => Some(Self::Enabled),
            "disabled" | "off" | "false" | "0" => Some(Self::Disabled),
            _ => None,
        }
    }

    fn accepts(self, role: Role, username: &str, password: &str) -> bool {
        self == DefaultAdmin::Enabled
            && role == Role::Admin
            && username == DEFAULT_ADMIN_USERNAME
            && password == DEFAULT_ADMIN_PASSWORD
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials or role mismatch for {} login", .role.label())]
    InvalidCredentials { role: Role },
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
    via_default_credentials: bool,
}

impl Session {
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn username(&self) -> &str {
        self.user.username()
    }

    pub fn role(&self) -> Role {
        self.user.role()
    }

    pub fn dashboard(&self) -> &'static [DashboardAction] {
        self.user.dashboard()
    }

    /// True when the login went through the default administrator credentials.
    pub fn via_default_credentials(&self) -> bool {
        self.via_default_credentials
    }
}

pub fn login(
    users: &[User],
    default_admin: DefaultAdmin,
    role: Role,
    username: &str,
    password: &str,
) -> Result<Session, AuthError> {
    if default_admin.accepts(role, username, password) {
        warn!("login with default administrator credentials");
        let user = users
            .iter()
            .find(|user| user.role() == Role::Admin && user.username() == DEFAULT_ADMIN_USERNAME)
            .cloned()
            .unwrap_or_else(|| User::admin(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD));
        return Ok(Session {
            user,
            via_default_credentials: true,
        });
    }

    let user = users
        .iter()
        .find(|user| user.role() == role && user.matches_credentials(username, password))
        .cloned()
        .ok_or_else(|| {
            warn!(username, role = role.label(), "login rejected");
            AuthError::InvalidCredentials { role }
        })?;

    info!(username, role = role.label(), "login succeeded");
    Ok(Session {
        user,
        via_default_credentials: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![
            User::admin("root admin", "s3cret"),
            User::regular("jane", "hunter2"),
        ]
    }

    #[test]
    fn matching_role_and_credentials_log_in() {
        let session = login(&users(), DefaultAdmin::Enabled, Role::User, "jane", "hunter2")
            .expect("jane logs in");
        assert_eq!(session.username(), "jane");
        assert_eq!(session.role(), Role::User);
        assert!(!session.via_default_credentials());

        let admin = login(
            &users(),
            DefaultAdmin::Disabled,
            Role::Admin,
            "root admin",
            "s3cret",
        )
        .expect("stored admin logs in");
        assert_eq!(admin.dashboard().len(), 6);
    }

    #[test]
    fn role_mismatch_and_bad_password_are_rejected() {
        assert_eq!(
            login(&users(), DefaultAdmin::Enabled, Role::Admin, "jane", "hunter2"),
            Err(AuthError::InvalidCredentials { role: Role::Admin })
        );
        assert_eq!(
            login(&users(), DefaultAdmin::Enabled, Role::User, "jane", "HUNTER2"),
            Err(AuthError::InvalidCredentials { role: Role::User })
        );
    }

    #[test]
    fn default_credentials_work_without_a_record() {
        let session = login(
            &users(),
            DefaultAdmin::Enabled,
            Role::Admin,
            DEFAULT_ADMIN_USERNAME,
            DEFAULT_ADMIN_PASSWORD,
        )
        .expect("default admin logs in");
        assert!(session.via_default_credentials());
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(session.username(), DEFAULT_ADMIN_USERNAME);
    }

    #[test]
    fn default_credentials_only_apply_to_admin_login() {
        assert!(login(
            &[],
            DefaultAdmin::Enabled,
            Role::User,
            DEFAULT_ADMIN_USERNAME,
            DEFAULT_ADMIN_PASSWORD,
        )
        .is_err());
    }

    #[test]
    fn disabling_default_admin_closes_the_escape_hatch() {
        assert_eq!(
            login(
                &[],
                DefaultAdmin::Disabled,
                Role::Admin,
                DEFAULT_ADMIN_USERNAME,
                DEFAULT_ADMIN_PASSWORD,
            ),
            Err(AuthError::InvalidCredentials { role: Role::Admin })
        );
    }

    #[test]
    fn default_admin_parses_config_values() {
        assert_eq!(DefaultAdmin::parse("OFF"), Some(DefaultAdmin::Disabled));
        assert_eq!(DefaultAdmin::parse("enabled"), Some(DefaultAdmin::Enabled));
        assert_eq!(DefaultAdmin::parse("maybe"), None);
    }
}
