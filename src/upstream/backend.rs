//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track in-flight requests for the admin API

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::upstream::BackendRef;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Identity used by routing rules.
    pub reference: BackendRef,
    /// The address of the backend.
    pub addr: SocketAddr,
    /// Pre-calculated base URL.
    pub base_url: Url,
    /// Number of requests currently forwarded to this backend.
    active_requests: AtomicUsize,
}

impl Backend {
    /// Create a new backend. Returns None if the address cannot form a URL.
    pub fn new(reference: BackendRef, addr: SocketAddr) -> Option<Self> {
        let base_url = Url::parse(&format!("http://{}", addr)).ok()?;
        Some(Self {
            reference,
            addr,
            base_url,
            active_requests: AtomicUsize::new(0),
        })
    }

    /// Get the current number of in-flight requests.
    pub fn active_requests(&self) -> usize {
        self.active_requests.load(Ordering::Relaxed)
    }

    /// Mark a request as in flight until the returned guard is dropped.
    pub fn track(self: &Arc<Self>) -> InFlightGuard {
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            backend: Arc::clone(self),
        }
    }
}

/// A RAII guard that manages the in-flight request count.
#[derive(Debug)]
pub struct InFlightGuard {
    backend: Arc<Backend>,
}

impl Deref for InFlightGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.backend.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_tracks_in_flight_requests() {
        let backend = Arc::new(
            Backend::new(
                BackendRef::new("infra-backend-v1", "infra"),
                "127.0.0.1:3000".parse().unwrap(),
            )
            .unwrap(),
        );
        assert_eq!(backend.base_url.as_str(), "http://127.0.0.1:3000/");

        let g1 = backend.track();
        let g2 = backend.track();
        assert_eq!(backend.active_requests(), 2);
        drop(g1);
        assert_eq!(g2.active_requests(), 1);
        drop(g2);
        assert_eq!(backend.active_requests(), 0);
    }
}
