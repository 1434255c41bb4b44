//! Thread-safe handle to a store
//!
//! All state sits behind one mutex so each operation sees and leaves the
//! store and its indices consistent as a unit.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::manager::TaskManager;

#[derive(Debug, Clone)]
pub struct SharedTaskManager {
    inner: Arc<Mutex<TaskManager>>,
}

impl SharedTaskManager {
    pub fn new(manager: TaskManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Run `op` with exclusive access to the store
    pub fn with<T>(&self, op: impl FnOnce(&mut TaskManager) -> T) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::OperationFailed("task store lock poisoned".to_string()))?;
        Ok(op(&mut guard))
    }

    /// Unwrap the store once no other handle is left
    pub fn into_inner(self) -> Result<TaskManager> {
        let mutex = Arc::try_unwrap(self.inner)
            .map_err(|_| Error::OperationFailed("task store is still shared".to_string()))?;
        mutex
            .into_inner()
            .map_err(|_| Error::OperationFailed("task store lock poisoned".to_string()))
    }
}
