//! Config persistence capability

use alloc::string::{String, ToString};

use crate::error::StorageError;

/// Backing store of the persisted config record
///
/// The firmware implements this on top of its flash filesystem. Callers
/// treat every failure as non-fatal.
pub trait ConfigStorage {
    /// Read the stored record
    fn read(&mut self) -> Result<String, StorageError>;

    /// Replace the stored record
    fn write(&mut self, contents: &str) -> Result<(), StorageError>;
}

/// In-memory storage
///
/// Can be switched into a failing mode to exercise degraded paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Option<String>,
    failing: bool,
    writes: usize,
}

impl MemoryStorage {
    pub const fn new() -> Self {
        Self {
            contents: None,
            failing: false,
            writes: 0,
        }
    }

    /// Storage pre-filled with `contents`
    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Some(contents.to_string()),
            ..Self::new()
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Make every following read and write fail
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Number of successful writes
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl ConfigStorage for MemoryStorage {
    fn read(&mut self) -> Result<String, StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable("memory storage is failing".to_string()));
        }
        self.contents.clone().ok_or(StorageError::NotFound)
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable("memory storage is failing".to_string()));
        }
        self.contents = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }
}

impl<S: ConfigStorage + ?Sized> ConfigStorage for &mut S {
    fn read(&mut self) -> Result<String, StorageError> {
        (**self).read()
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        (**self).write(contents)
    }
}
