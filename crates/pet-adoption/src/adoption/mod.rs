//! Users, pets, and adoption applications.
//!
//! Records are validated at construction boundaries, owned by [`AdoptionRepository`], and
//! written through a [`RecordStore`] after every mutation.

pub mod auth;
pub mod codec;
pub mod domain;
pub mod repository;
pub mod search;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, DefaultAdmin, Session, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
pub use codec::{ApplicationLedger, CodecError};
pub use domain::{
    Account, Application, ApplicationId, ApplicationStatus, DashboardAction, Decision, Pet, Role,
    User,
};
pub use repository::{
    AdoptionPolicy, AdoptionRepository, NewPet, PetChanges, PetRemoval, ProcessOutcome,
    RepositoryError, UserChanges,
};
pub use search::PetQuery;
pub use store::{Collection, FileStore, MemoryStore, RecordStore, Snapshot, StoreError};
pub use validation::{PasswordPolicy, ValidationError};
