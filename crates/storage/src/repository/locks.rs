use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::{Postgres, Transaction};
use tokio::sync::OwnedMutexGuard;

use crate::error::Result;
use crate::models::{RaceId, ResultKind};

/// The unit of exclusive points recalculation: one race, one result kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecalculationScope {
    pub race_id: RaceId,
    pub kind: ResultKind,
}

/// Exclusive hold on a [`RecalculationScope`].
///
/// Dropping the lease releases the scope. A Postgres lease is an open
/// transaction holding a transaction-level advisory lock, so every process
/// sharing the database sees it.
pub enum ScopeLease {
    Local(OwnedMutexGuard<()>),
    Postgres(Transaction<'static, Postgres>),
}

impl ScopeLease {
    pub async fn release(self) -> Result<()> {
        match self {
            Self::Local(guard) => drop(guard),
            Self::Postgres(tx) => tx.commit().await?,
        }
        Ok(())
    }
}

/// One async mutex per scope, created on first use.
#[derive(Default)]
pub struct ScopeLocks {
    scopes: Mutex<HashMap<RecalculationScope, Arc<tokio::sync::Mutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while another holder owns the scope.
    pub fn try_acquire(&self, scope: RecalculationScope) -> Option<ScopeLease> {
        let lock = self.scopes.lock().entry(scope).or_default().clone();
        lock.try_lock_owned().ok().map(ScopeLease::Local)
    }
}
