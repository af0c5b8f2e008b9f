use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::codec::{self, ApplicationLedger, CodecError};
use super::domain::{Pet, User};

pub const USERS_FILE: &str = "users.dat";
pub const PETS_FILE: &str = "pets.dat";
pub const APPLICATIONS_FILE: &str = "applications.dat";

/// The three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Pets,
    Applications,
}

/// Everything the repository needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub pets: Vec<Pet>,
    pub ledger: ApplicationLedger,
    /// False when no pets file existed yet, so first-run seeding can tell "empty" from "new".
    pub pets_initialized: bool,
}

/// Storage abstraction so the repository can be exercised without touching disk.
pub trait RecordStore {
    fn load(&self) -> Result<Snapshot, StoreError>;
    fn save_users(&self, users: &[User]) -> Result<(), StoreError>;
    fn save_pets(&self, pets: &[Pet]) -> Result<(), StoreError>;
    fn save_applications(&self, ledger: &ApplicationLedger) -> Result<(), StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn load(&self) -> Result<Snapshot, StoreError> {
        (**self).load()
    }

    fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        (**self).save_users(users)
    }

    fn save_pets(&self, pets: &[Pet]) -> Result<(), StoreError> {
        (**self).save_pets(pets)
    }

    fn save_applications(&self, ledger: &ApplicationLedger) -> Result<(), StoreError> {
        (**self).save_applications(ledger)
    }
}

/// Failure to read or write a persistence file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot access {}: {source}", path.display())]
    FileOperation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt data in {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Flat files in a single data directory. Every save truncates and rewrites the whole file.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn open_existing(&self, file: &str) -> Result<Option<(PathBuf, File)>, StoreError> {
        let path = self.path_for(file);
        match File::open(&path) {
            Ok(handle) => Ok(Some((path, handle))),
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                debug!(path = %path.display(), "persistence file missing, starting empty");
                Ok(None)
            }
            Err(source) => Err(StoreError::FileOperation { path, source }),
        }
    }

    fn read_file<T>(
        &self,
        file: &str,
        decode: impl FnOnce(BufReader<File>) -> Result<T, CodecError>,
    ) -> Result<Option<T>, StoreError> {
        let Some((path, handle)) = self.open_existing(file)? else {
            return Ok(None);
        };
        decode(BufReader::new(handle))
            .map(Some)
            .map_err(|source| classify(path, source))
    }

    fn write_file(
        &self,
        file: &str,
        encode: impl FnOnce(&mut BufWriter<File>) -> Result<(), CodecError>,
    ) -> Result<(), StoreError> {
        let path = self.path_for(file);
        let handle = File::create(&path).map_err(|source| StoreError::FileOperation {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(handle);
        encode(&mut writer).map_err(|source| classify(path.clone(), source))?;
        writer
            .into_inner()
            .map_err(|err| StoreError::FileOperation {
                path: path.clone(),
                source: err.into_error(),
            })?;
        debug!(path = %path.display(), "persistence file rewritten");
        Ok(())
    }
}

fn classify(path: PathBuf, source: CodecError) -> StoreError {
    match source {
        CodecError::Io(source) => StoreError::FileOperation { path, source },
        other => StoreError::Corrupt {
            path,
            source: other,
        },
    }
}

impl RecordStore for FileStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let users = self.read_file(USERS_FILE, codec::read_users)?;
        let pets = self.read_file(PETS_FILE, codec::read_pets)?;
        let ledger = self.read_file(APPLICATIONS_FILE, codec::read_applications)?;

        Ok(Snapshot {
            users: users.unwrap_or_default(),
            pets_initialized: pets.is_some(),
            pets: pets.unwrap_or_default(),
            ledger: ledger.unwrap_or_default(),
        })
    }

    fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        self.write_file(USERS_FILE, |writer| codec::write_users(writer, users))
    }

    fn save_pets(&self, pets: &[Pet]) -> Result<(), StoreError> {
        self.write_file(PETS_FILE, |writer| codec::write_pets(writer, pets))
    }

    fn save_applications(&self, ledger: &ApplicationLedger) -> Result<(), StoreError> {
        self.write_file(APPLICATIONS_FILE, |writer| {
            codec::write_applications(writer, ledger)
        })
    }
}

/// In-process store. Clones share state, so a caller can keep a handle and inspect writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Snapshot,
    writes: usize,
    failing: Vec<Collection>,
}

impl MemoryStore {
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                snapshot,
                ..MemoryState::default()
            })),
        }
    }

    /// Current persisted contents.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    /// Number of successful saves since construction.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Make every subsequent save fail, simulating an unwritable data directory.
    pub fn fail_writes(&self, fail: bool) {
        for collection in [Collection::Users, Collection::Pets, Collection::Applications] {
            self.fail_writes_to(collection, fail);
        }
    }

    /// Make saves of one collection fail while the others keep succeeding.
    pub fn fail_writes_to(&self, collection: Collection, fail: bool) {
        let mut state = self.lock();
        state.failing.retain(|failing| *failing != collection);
        if fail {
            state.failing.push(collection);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(
        &self,
        collection: Collection,
        apply: impl FnOnce(&mut Snapshot),
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.failing.contains(&collection) {
            return Err(StoreError::Unavailable("memory store is read-only".to_string()));
        }
        apply(&mut state.snapshot);
        state.writes += 1;
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.snapshot())
    }

    fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        self.save(Collection::Users, |snapshot| {
            snapshot.users = users.to_vec()
        })
    }

    fn save_pets(&self, pets: &[Pet]) -> Result<(), StoreError> {
        self.save(Collection::Pets, |snapshot| {
            snapshot.pets = pets.to_vec();
            snapshot.pets_initialized = true;
        })
    }

    fn save_applications(&self, ledger: &ApplicationLedger) -> Result<(), StoreError> {
        self.save(Collection::Applications, |snapshot| {
            snapshot.ledger = ledger.clone()
        })
    }
}
