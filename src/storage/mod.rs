//! Whole-document persistence for the finance book and the user list.
//!
//! Every mutation rewrites the complete document. There is no locking across
//! processes; two writers sharing a file overwrite each other's last save.

pub mod file;

pub use file::JsonFileStore;

/// Errors that can occur when reading or writing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing file could not be read or written.
    Io(String),
    /// The stored document is not valid JSON for the expected shape.
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "storage io error: {e}"),
            StoreError::Corrupt(e) => write!(f, "stored data is corrupt: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Abstraction over where a document of type `T` lives.
pub trait Store<T>: Send {
    /// Reads the current document; a store that was never written yields the
    /// default document.
    fn load(&self) -> Result<T, StoreError>;
    /// Replaces the stored document with `value`.
    fn save(&mut self, value: &T) -> Result<(), StoreError>;
}

impl<T, S: Store<T> + ?Sized> Store<T> for Box<S> {
    fn load(&self) -> Result<T, StoreError> {
        (**self).load()
    }

    fn save(&mut self, value: &T) -> Result<(), StoreError> {
        (**self).save(value)
    }
}

/// In-memory store used primarily for tests.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    value: T,
    saves: usize,
}

impl<T> MemoryStore<T> {
    pub fn new(value: T) -> Self {
        Self { value, saves: 0 }
    }

    /// Number of times the document has been written.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl<T: Clone + Send> Store<T> for MemoryStore<T> {
    fn load(&self) -> Result<T, StoreError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, value: &T) -> Result<(), StoreError> {
        self.value = value.clone();
        self.saves += 1;
        Ok(())
    }
}
