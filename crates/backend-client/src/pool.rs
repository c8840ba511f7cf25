//! Bounded pool of backend connections.
//!
//! Capacity is fixed at construction. Connections are created lazily on
//! `acquire` and live until they break; a broken connection's slot is
//! freed on checkin and refilled by a later `acquire`. Checkin happens
//! on guard drop, so a handler that errors, returns early, or unwinds
//! still checks its client in exactly once.
//!
//! Invariant: idle + checked-out + connecting never exceeds capacity.

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use viz_common::{VizError, VizResult};

use crate::client::{BackendClient, Connector};

/// Instrumented event counters, readable by tests and diagnostics.
#[derive(Debug, Default)]
pub struct PoolCounters {
    acquires: AtomicU64,
    releases: AtomicU64,
    misreleases: AtomicU64,
    timeouts: AtomicU64,
    evictions: AtomicU64,
}

impl PoolCounters {
    pub fn acquires(&self) -> u64 {
        self.acquires.load(Ordering::Relaxed)
    }
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }
    pub fn misreleases(&self) -> u64 {
        self.misreleases.load(Ordering::Relaxed)
    }
    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

struct Inner {
    idle: Vec<(u64, BackendClient)>,
    outstanding: HashSet<u64>,
    connecting: usize,
    next_id: u64,
}

impl Inner {
    fn live(&self) -> usize {
        self.idle.len() + self.outstanding.len() + self.connecting
    }
}

/// Bounded pool of connections to one backend endpoint.
pub struct ClientPool {
    name: String,
    capacity: usize,
    acquire_timeout: Duration,
    connector: Arc<dyn Connector>,
    inner: Mutex<Inner>,
    notify: Notify,
    counters: PoolCounters,
}

impl std::fmt::Debug for ClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPool")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("outstanding", &self.outstanding())
            .field("live", &self.live())
            .finish_non_exhaustive()
    }
}

impl ClientPool {
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        acquire_timeout: Duration,
        connector: Arc<dyn Connector>,
    ) -> Arc<Self> {
        let name = name.into();
        info!(pool = %name, capacity, "client pool created");
        Arc::new(Self {
            name,
            capacity,
            acquire_timeout,
            connector,
            inner: Mutex::new(Inner {
                idle: Vec::with_capacity(capacity),
                outstanding: HashSet::new(),
                connecting: 0,
                next_id: 0,
            }),
            notify: Notify::new(),
            counters: PoolCounters::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn counters(&self) -> &PoolCounters {
        &self.counters
    }

    /// Handles currently checked out.
    pub fn outstanding(&self) -> usize {
        self.inner.lock().expect("pool lock poisoned").outstanding.len()
    }

    /// Live connections (idle + checked out + connecting).
    pub fn live(&self) -> usize {
        self.inner.lock().expect("pool lock poisoned").live()
    }

    /// Check out a connection, waiting up to the configured timeout for
    /// one to become available.
    pub async fn acquire(self: &Arc<Self>) -> VizResult<PooledClient> {
        match tokio::time::timeout(self.acquire_timeout, self.acquire_inner()).await {
            Ok(result) => result,
            Err(_) => {
                self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(pool = %self.name, "acquire timed out");
                Err(VizError::PoolTimeout(self.name.clone()))
            }
        }
    }

    async fn acquire_inner(self: &Arc<Self>) -> VizResult<PooledClient> {
        loop {
            // Register for wakeups before inspecting state, so a
            // checkin between the unlock and the await is not missed.
            let notified = self.notify.notified();

            enum Plan {
                Ready(PooledClient),
                Connect,
                Wait,
            }

            let plan = {
                let mut inner = self.inner.lock().expect("pool lock poisoned");
                if let Some((id, client)) = inner.idle.pop() {
                    inner.outstanding.insert(id);
                    self.counters.acquires.fetch_add(1, Ordering::Relaxed);
                    Plan::Ready(PooledClient {
                        pool: Arc::clone(self),
                        id,
                        client: Some(client),
                    })
                } else if inner.live() < self.capacity {
                    inner.connecting += 1;
                    Plan::Connect
                } else {
                    Plan::Wait
                }
            };

            match plan {
                Plan::Ready(guard) => return Ok(guard),
                Plan::Connect => return self.connect_slot().await,
                Plan::Wait => notified.await,
            }
        }
    }

    /// Fill a reserved slot with a fresh connection. The reservation is
    /// released on failure or cancellation.
    async fn connect_slot(self: &Arc<Self>) -> VizResult<PooledClient> {
        let mut reservation = SlotReservation {
            pool: self,
            armed: true,
        };

        let client = self.connector.connect().await?;

        let id = {
            let mut inner = self.inner.lock().expect("pool lock poisoned");
            inner.connecting -= 1;
            let id = inner.next_id;
            inner.next_id += 1;
            inner.outstanding.insert(id);
            id
        };
        reservation.armed = false;
        self.counters.acquires.fetch_add(1, Ordering::Relaxed);
        debug!(pool = %self.name, id, "connected new pooled client");

        Ok(PooledClient {
            pool: Arc::clone(self),
            id,
            client: Some(client),
        })
    }

    /// Return a handle to the pool. Called from guard drop; `client` is
    /// `None` when the guard was dismantled after eviction.
    fn checkin(&self, id: u64, client: Option<BackendClient>) {
        {
            let mut inner = self.inner.lock().expect("pool lock poisoned");
            if !inner.outstanding.remove(&id) {
                // Double checkin or a handle this pool never issued.
                // Logged and ignored rather than fatal: dropping a
                // request must not take down the process.
                self.counters.misreleases.fetch_add(1, Ordering::Relaxed);
                error!(pool = %self.name, id, "checkin of a handle not checked out");
                return;
            }
            self.counters.releases.fetch_add(1, Ordering::Relaxed);

            match client {
                Some(c) if !c.is_broken() => inner.idle.push((id, c)),
                Some(_) => {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    info!(pool = %self.name, id, "evicting broken client");
                }
                None => {}
            }
        }
        self.notify.notify_one();
    }
}

/// Undoes a `connecting` reservation if the connect fails or the
/// acquiring future is dropped mid-connect.
struct SlotReservation<'a> {
    pool: &'a ClientPool,
    armed: bool,
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.pool.inner.lock().expect("pool lock poisoned");
            inner.connecting -= 1;
            drop(inner);
            self.pool.notify.notify_one();
        }
    }
}

/// RAII checkout guard; checks the connection back in on drop.
pub struct PooledClient {
    pool: Arc<ClientPool>,
    id: u64,
    client: Option<BackendClient>,
}

impl PooledClient {
    /// Pool-assigned handle id, for diagnostics.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for PooledClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledClient")
            .field("pool", &self.pool.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Deref for PooledClient {
    type Target = BackendClient;
    fn deref(&self) -> &BackendClient {
        self.client.as_ref().expect("client taken before drop")
    }
}

impl DerefMut for PooledClient {
    fn deref_mut(&mut self) -> &mut BackendClient {
        self.client.as_mut().expect("client taken before drop")
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        self.pool.checkin(self.id, self.client.take());
    }
}
