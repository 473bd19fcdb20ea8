//! `DuckDB` connection pool for a single store file.
//!
//! All pooled connections are clones of one root connection, so they share a
//! single database instance and see each other's committed writes.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ::duckdb::Connection;

/// Access mode for store connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Guarded read queries.
    ReadOnly,
    /// Table replacement.
    ReadWrite,
}

#[derive(Default)]
struct PoolState {
    root: Option<Connection>,
    read_only: Vec<Connection>,
    read_write: Vec<Connection>,
}

impl PoolState {
    fn idle(&mut self, mode: AccessMode) -> &mut Vec<Connection> {
        match mode {
            AccessMode::ReadOnly => &mut self.read_only,
            AccessMode::ReadWrite => &mut self.read_write,
        }
    }
}

struct PoolInner {
    db_path: PathBuf,
    max_idle: usize,
    state: Mutex<PoolState>,
}

impl PoolInner {
    // A panic while holding the lock leaves only connection handles behind,
    // which are still usable.
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps up to `max_idle` open connections per access mode.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                db_path: path.into(),
                max_idle: max_idle.max(1),
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    /// Take an idle connection for `mode`, or clone a new one from the root.
    ///
    /// # Errors
    /// Returns an error if the store file cannot be opened or configured.
    pub fn acquire(&self, mode: AccessMode) -> Result<PooledConnection, ::duckdb::Error> {
        let mut state = self.inner.lock_state();
        let connection = match state.idle(mode).pop() {
            Some(connection) => connection,
            None => {
                if state.root.is_none() {
                    state.root = Some(open_root(self.inner.db_path.as_path())?);
                }
                match state.root.as_ref() {
                    Some(root) => root.try_clone()?,
                    None => open_root(self.inner.db_path.as_path())?,
                }
            }
        };
        drop(state);

        Ok(PooledConnection {
            mode,
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }
}

/// Connection handle that returns to the pool when dropped.
pub struct PooledConnection {
    mode: AccessMode,
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the connection out.
        self.connection
            .as_ref()
            .expect("pooled connection is present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut state = self.pool.lock_state();
        let max_idle = self.pool.max_idle;
        let idle = state.idle(self.mode);
        if idle.len() < max_idle {
            idle.push(connection);
        }
    }
}

fn open_root(path: &Path) -> Result<Connection, ::duckdb::Error> {
    let connection = Connection::open(path)?;
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(connection)
}
