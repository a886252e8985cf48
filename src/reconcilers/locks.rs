// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keyed locks serializing work on the same MirrorPeer across reconcilers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct PairingLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PairingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other invocation holds `pairing`
    pub async fn lock(&self, pairing: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(pairing.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock of a pairing that no longer exists. A lock that is
    /// still held or waited on stays, so later callers queue behind it.
    pub fn forget(&self, pairing: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(pairing)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(pairing);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
