//! The storage capability the entry store persists through, plus an in-memory
//! implementation that records every call for tests and throwaway sessions.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StorageError;

/// Durable key/value byte storage. Calls are synchronous from the store's
/// point of view; whatever the backend does internally is its own business.
pub trait Storage {
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// `Ok(None)` means nothing has been saved under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Removing a key that was never saved is not an error.
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Rc<S> {
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load(key)
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        (**self).clear(key)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load(key)
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        (**self).clear(key)
    }
}

/// One recorded call against [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Save { key: String, value: Vec<u8> },
    Load { key: String },
    Clear { key: String },
}

/// HashMap-backed storage. Keeps a log of calls and can be told to reject
/// writes so callers can exercise their failure paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, Vec<u8>>>,
    calls: RefCell<Vec<StorageCall>>,
    fail_writes: Cell<bool>,
    fail_reads: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `value` already stored under `key`, without logging a call.
    pub fn seeded(key: &str, value: impl Into<Vec<u8>>) -> Self {
        let storage = Self::default();
        storage
            .values
            .borrow_mut()
            .insert(key.to_string(), value.into());
        storage
    }

    /// While set, `save` and `clear` fail with [`StorageError::Unavailable`]
    /// and leave the stored values untouched.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// While set, `load` fails with [`StorageError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.values.borrow().get(key).cloned()
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: StorageCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            Err(StorageError::Unavailable("writes disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.record(StorageCall::Save {
            key: key.to_string(),
            value: value.to_vec(),
        });
        self.check_writable()?;
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.record(StorageCall::Load {
            key: key.to_string(),
        });
        if self.fail_reads.get() {
            return Err(StorageError::Unavailable("disk unreadable".into()));
        }
        Ok(self.raw(key))
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.record(StorageCall::Clear {
            key: key.to_string(),
        });
        self.check_writable()?;
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}
