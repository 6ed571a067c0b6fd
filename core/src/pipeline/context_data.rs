// payout_engine/src/pipeline/context_data.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable pipeline context.
///
/// Every step handler receives a clone of the same `ContextData<T>`; clones
/// point at one `parking_lot::RwLock<T>`.
///
/// IMPORTANT: guards returned by [`ContextData::read`] and [`ContextData::write`]
/// are blocking and MUST be dropped before any `.await` point. Handlers copy
/// what they need out of the guard, release it, then do their I/O.
#[derive(Debug)]
pub struct ContextData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    ContextData(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Copies the current value out from under a read lock.
  pub fn snapshot(&self) -> T
  where
    T: Clone,
  {
    self.0.read().clone()
  }
}

impl<T: Send + Sync + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for ContextData<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_the_same_value() {
    let a = ContextData::new(1_u32);
    let b = a.clone();
    *b.write() += 41;
    assert_eq!(*a.read(), 42);
    assert_eq!(a.snapshot(), 42);
  }
}
