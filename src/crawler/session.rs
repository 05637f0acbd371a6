//! Fixed-capacity pool of HTTP sessions
//!
//! Each session is a `reqwest::Client` carrying one browser identity. A
//! semaphore bounds the number of sessions checked out at once; idle sessions
//! wait in a mutex-guarded list. A session marked unusable is dropped when it
//! is returned and a fresh identity replaces it on the next acquire.

use crate::crawler::headers::{build_browser_headers, random_user_agent};
use crate::crawler::source::SourceError;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// One HTTP client with a fixed identity
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub user_agent: &'static str,
    client: Client,
}

impl Session {
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Pool of reusable sessions
#[derive(Debug)]
pub struct SessionPool {
    idle: Mutex<Vec<Session>>,
    permits: Arc<Semaphore>,
    capacity: usize,
    next_id: AtomicU64,
}

impl SessionPool {
    /// Creates an empty pool; sessions are built lazily on first use
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);

        Arc::new(Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of sessions waiting in the idle list
    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    /// Checks out a session, waiting while all of them are in use
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledSession, SourceError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SourceError::Network("session pool closed".to_string()))?;

        let reused = self.lock_idle().pop();
        let session = match reused {
            Some(session) => session,
            None => self.create_session()?,
        };

        Ok(PooledSession {
            session: Some(session),
            pool: Arc::clone(self),
            usable: true,
            _permit: permit,
        })
    }

    fn create_session(&self) -> Result<Session, SourceError> {
        let user_agent = random_user_agent(&mut rand::thread_rng());

        let client = Client::builder()
            .default_headers(build_browser_headers(user_agent))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {}", e)))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Created session {} ({})", id, user_agent);

        Ok(Session {
            id,
            user_agent,
            client,
        })
    }

    fn release(&self, session: Session, usable: bool) {
        if !usable {
            tracing::debug!("Discarding session {}", session.id);
            return;
        }

        let mut idle = self.lock_idle();
        if idle.len() < self.capacity {
            idle.push(session);
        }
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<Session>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A checked-out session, returned to the pool on drop
#[derive(Debug)]
pub struct PooledSession {
    session: Option<Session>,
    pool: Arc<SessionPool>,
    usable: bool,
    _permit: OwnedSemaphorePermit,
}

impl PooledSession {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Marks the session as burnt so it is dropped instead of pooled
    pub fn discard(&mut self) {
        self.usable = false;
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session, self.usable);
        }
    }
}
