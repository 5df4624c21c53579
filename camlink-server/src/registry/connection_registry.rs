use crate::registry::endpoint::Endpoint;
use axum::extract::ws::Message;
use camlink_core::{EndpointId, Role};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct RegistryInner {
    cameras: DashMap<EndpointId, Endpoint>,
    viewers: DashMap<EndpointId, Endpoint>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

/// Currently connected cameras and viewers.
///
/// Cheap to clone; all clones share the same sets.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                cameras: DashMap::new(),
                viewers: DashMap::new(),
                next_id: AtomicU64::new(1),
                queue_capacity: queue_capacity.max(1),
            }),
        }
    }

    fn set(&self, role: Role) -> &DashMap<EndpointId, Endpoint> {
        match role {
            Role::Camera => &self.inner.cameras,
            Role::Viewer => &self.inner.viewers,
        }
    }

    /// Adds a new endpoint and hands back the receiving half of its outbound queue.
    pub fn register(&self, role: Role) -> (EndpointId, mpsc::Receiver<Message>) {
        let id = EndpointId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);

        self.set(role).insert(id, Endpoint::new(id, role, tx));
        info!("{} connected: {}", role, id);

        (id, rx)
    }

    /// Removing an endpoint drops its queue, which ends the socket's writer task.
    pub fn unregister(&self, id: EndpointId, role: Role) -> bool {
        match self.set(role).remove(&id) {
            Some((_, endpoint)) => {
                info!(
                    "{} disconnected: {} (after {:?})",
                    role,
                    id,
                    endpoint.connected_for()
                );
                true
            }
            None => false,
        }
    }

    pub fn count(&self, role: Role) -> usize {
        self.set(role).len()
    }

    pub fn contains(&self, id: EndpointId, role: Role) -> bool {
        self.set(role).contains_key(&id)
    }

    /// One delivery attempt to every open endpoint of `role`.
    ///
    /// Endpoints whose queue is closed or full are removed after the pass.
    /// Returns how many endpoints accepted the message.
    pub fn broadcast(&self, role: Role, msg: Message) -> usize {
        let set = self.set(role);
        let mut delivered = 0;
        let mut failed = Vec::new();

        for endpoint in set.iter() {
            if !endpoint.is_open() {
                failed.push(endpoint.id);
                continue;
            }
            match endpoint.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Delivery to {} {} failed: {}", role, endpoint.id, e);
                    failed.push(endpoint.id);
                }
            }
        }

        for id in failed {
            if set.remove(&id).is_some() {
                debug!("Dropped unwritable {} {}", role, id);
            }
        }

        delivered
    }
}
