use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Engine cursor identifier, as reported by the engine's cursor callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorType(pub i32);

/// Opaque host cursor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(pub u64);

/// Creates host cursors on demand.
pub trait CursorFactory: Send + Sync {
    fn create_cursor(&self, cursor: CursorType) -> CursorHandle;
}

/// Lazily filled, append-only map from engine cursor type to host cursor.
///
/// Each type is created at most once per cache; later lookups return the
/// stored handle.
pub struct CursorHandleCache<F> {
    factory: F,
    handles: Mutex<HashMap<CursorType, CursorHandle>>,
}

impl<F: CursorFactory> CursorHandleCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, cursor: CursorType) -> CursorHandle {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        *handles
            .entry(cursor)
            .or_insert_with(|| self.factory.create_cursor(cursor))
    }

    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
