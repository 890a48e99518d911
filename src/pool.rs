//! The connection pool: lazy singleton construction, borrow/release
//! discipline, and defunct classification (spec.md §4.4, §5).
//!
//! Grounded on the teacher's lazy-provider wiring in
//! `scim_server/registration.rs` (build-then-publish-once shape) generalized
//! to a generic connection pool, plus the bounded-worker pattern the teacher
//! uses for its in-memory storage locking (`storage/mod.rs`).

use crate::directory::{
    DirectoryConnection, DirectoryConnector, DirectoryFailure, DirectoryResult, SearchRequest,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

const STATE_NONE: u8 = 0;
const STATE_CREATING: u8 = 1;
const STATE_OPEN: u8 = 2;
const STATE_CLOSED: u8 = 3;

/// A connection pool over one [`DirectoryConnector`]. Bounded to `max_size`
/// concurrent borrows via a semaphore; idle connections are recycled from a
/// deque rather than rebuilt on every borrow.
pub struct Pool<C: DirectoryConnector> {
    connector: C,
    idle: AsyncMutex<VecDeque<C::Connection>>,
    permits: Semaphore,
    state: AtomicU8,
}

impl<C: DirectoryConnector> Pool<C> {
    fn new(connector: C, max_size: usize) -> Self {
        Self {
            connector,
            idle: AsyncMutex::new(VecDeque::new()),
            permits: Semaphore::new(max_size),
            state: AtomicU8::new(STATE_OPEN),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::Release);
    }

    async fn checkout(&self) -> DirectoryResult<C::Connection> {
        let mut idle = self.idle.lock().await;
        while let Some(conn) = idle.pop_front() {
            if !conn.is_closed() {
                return Ok(conn);
            }
            log::debug!("discarding defunct idle connection");
        }
        drop(idle);
        self.connector.connect().await
    }

    async fn checkin(&self, conn: C::Connection, defunct: bool) {
        if defunct || conn.is_closed() {
            log::warn!("releasing connection as defunct, not returning to idle set");
            return;
        }
        self.idle.lock().await.push_back(conn);
    }

    /// Run `f` with a borrowed, bound connection. The connection is always
    /// either returned to the idle set or dropped as defunct when `f`
    /// finishes: there is no path that borrows without resolving, by
    /// construction (the borrow never escapes this function).
    pub async fn execute<F, Fut, T>(&self, f: F) -> DirectoryResult<T>
    where
        F: FnOnce(C::Connection) -> Fut,
        Fut: std::future::Future<Output = (C::Connection, DirectoryResult<T>)>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("pool semaphore is never closed while the pool is alive");

        let conn = self.checkout().await?;
        let (conn, result) = f(conn).await;
        let defunct = result
            .as_ref()
            .err()
            .is_some_and(|e: &DirectoryFailure| crate::directory::is_defunct_code(e.result_code));
        self.checkin(conn, defunct).await;
        result
    }

    /// A search constrained to match at most one entry, correcting a
    /// mis-shaped request (spec.md §4.4, Open Question #2: the request's
    /// `size_limit`/`streaming` fields are normalized before the search is
    /// issued, and a second entry beyond the first is treated as an error
    /// rather than silently dropped).
    pub async fn search_single_entry(
        &self,
        request: &SearchRequest,
    ) -> Result<Option<crate::directory::DirectoryEntry>, SingleEntrySearchError> {
        let corrected = if request.is_single_entry_shaped() {
            request.clone()
        } else {
            log::debug!("correcting mis-shaped single-entry search request");
            request.as_single_entry()
        };

        let mut entries = self
            .execute(|mut conn| async move {
                let result = conn.search(&corrected).await;
                (conn, result)
            })
            .await
            .map_err(SingleEntrySearchError::Directory)?;

        if entries.len() > 1 {
            return Err(SingleEntrySearchError::TooManyResults {
                base_dn: corrected.base_dn.clone(),
            });
        }

        Ok(entries.drain(..).next())
    }
}

/// The outcome of [`Pool::search_single_entry`] beyond a plain directory
/// failure: a second match is a distinct, typed condition (spec.md §4.4:
/// "fails with TooManyResults if more than one entry matches"), not folded
/// into [`DirectoryFailure`] under some invented result code.
#[derive(Debug)]
pub enum SingleEntrySearchError {
    Directory(DirectoryFailure),
    TooManyResults { base_dn: String },
}

/// Holds at most one live [`Pool`] per process, resolving the construction
/// race spec.md §4.4 describes: whichever caller finishes building a pool
/// first under the publish lock wins, and the loser's pool is simply
/// dropped (which closes it, since nothing else holds a reference).
pub struct LazyPool<C: DirectoryConnector> {
    published: Mutex<Option<Arc<Pool<C>>>>,
}

impl<C: DirectoryConnector> Default for LazyPool<C> {
    fn default() -> Self {
        Self {
            published: Mutex::new(None),
        }
    }
}

impl<C: DirectoryConnector + Clone> LazyPool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the published pool, building and publishing one if none
    /// exists yet. Pool construction happens outside any lock; only the
    /// compare-and-publish step is synchronous.
    pub async fn get_or_create(&self, connector: &C, max_size: usize) -> Arc<Pool<C>> {
        if let Some(existing) = self.published.lock().expect("lock poisoned").clone() {
            if !existing.is_closed() {
                return existing;
            }
        }

        let candidate = Arc::new(Pool::new(connector.clone(), max_size));

        let mut guard = self.published.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(winner) if !winner.is_closed() => {
                log::debug!("lost the pool construction race, closing redundant pool");
                candidate.close();
                winner.clone()
            }
            _ => {
                *guard = Some(candidate.clone());
                candidate
            }
        }
    }
}
