pub mod error;
pub mod invite;
pub mod queries;

use std::collections::BTreeMap;
use std::sync::Mutex;

use rally_types::models::{Challenge, Completion, Group, User};
use tracing::info;

pub use error::StoreError;

/// In-memory entity tables. Keys are ids, so iteration follows insertion order.
#[derive(Default)]
pub(crate) struct Tables {
    pub groups: BTreeMap<i64, Group>,
    pub users: BTreeMap<i64, User>,
    pub challenges: BTreeMap<i64, Challenge>,
    pub completions: BTreeMap<i64, Completion>,
    pub ids: IdCounters,
}

/// Per-entity id sequences. Ids start at 1 and are never handed out twice.
#[derive(Default)]
pub(crate) struct IdCounters {
    group: i64,
    user: i64,
    challenge: i64,
    completion: i64,
}

impl IdCounters {
    pub fn next_group(&mut self) -> i64 {
        self.group += 1;
        self.group
    }

    pub fn next_user(&mut self) -> i64 {
        self.user += 1;
        self.user
    }

    pub fn next_challenge(&mut self) -> i64 {
        self.challenge += 1;
        self.challenge
    }

    pub fn next_completion(&mut self) -> i64 {
        self.completion += 1;
        self.completion
    }
}

/// The store owns every group, user, challenge and completion.
///
/// One instance is built by the process entry point and shared behind an
/// `Arc`. Operations are `async` so a persistent backend can take its place
/// without touching callers; the in-memory tables never block on I/O.
pub struct Store {
    tables: Mutex<Tables>,
}

impl Store {
    pub fn new() -> Self {
        info!("In-memory store initialised");
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    pub(crate) fn with_tables<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Tables) -> Result<T, StoreError>,
    {
        let tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        f(&tables)
    }

    pub(crate) fn with_tables_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Tables) -> Result<T, StoreError>,
    {
        let mut tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut tables)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
