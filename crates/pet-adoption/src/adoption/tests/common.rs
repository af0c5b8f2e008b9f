use crate::adoption::codec::ApplicationLedger;
use crate::adoption::domain::{Pet, User};
use crate::adoption::repository::{AdoptionPolicy, AdoptionRepository, NewPet};
use crate::adoption::store::{MemoryStore, Snapshot};

pub(super) fn pet(name: &str, breed: &str, age: u32) -> Pet {
    Pet::new(name, breed, age, true).expect("valid pet")
}

pub(super) fn new_pet(name: &str, breed: &str, age: u32) -> NewPet {
    NewPet {
        name: name.to_string(),
        breed: breed.to_string(),
        age,
        vaccinated: false,
    }
}

pub(super) fn policy() -> AdoptionPolicy {
    AdoptionPolicy {
        seed_sample_pets: false,
        ..AdoptionPolicy::default()
    }
}

/// Admin, two regular users, three pets (two named Rex), no applications.
pub(super) fn snapshot() -> Snapshot {
    Snapshot {
        users: vec![
            User::admin("admin", "admin123"),
            User::regular("jane", "hunter2"),
            User::regular("mark", "letmein"),
        ],
        pets: vec![
            pet("Whiskers", "Siamese", 2),
            pet("Rex", "Labrador", 3),
            pet("Rex", "Beagle", 5),
        ],
        ledger: ApplicationLedger::default(),
        pets_initialized: true,
    }
}

pub(super) fn build_repository() -> (AdoptionRepository<MemoryStore>, MemoryStore) {
    let store = MemoryStore::with_snapshot(snapshot());
    let repository = AdoptionRepository::open(store.clone(), policy()).expect("repository opens");
    (repository, store)
}
