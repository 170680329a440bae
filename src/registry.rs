//! Connection registry
//!
//! The single shared mutable structure of the server: display name → session.
//! Guarded by a reader/writer lock. Mutations take the write lock; broadcast
//! enumeration and snapshots take the read lock. The lock is never held across
//! an `.await` or any socket I/O.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::client::Client;
use crate::error::RegistryError;
use crate::types::NameCandidates;

/// Registry of joined client sessions keyed by display name
#[derive(Debug, Default)]
pub struct Registry {
    clients: RwLock<HashMap<String, Arc<Client>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session under its name
    ///
    /// Fails if the name is already taken; the existing entry is untouched.
    pub fn add(&self, client: Arc<Client>) -> Result<(), RegistryError> {
        let mut clients = self.clients.write();
        if clients.contains_key(&client.name) {
            return Err(RegistryError::DuplicateName(client.name.clone()));
        }
        clients.insert(client.name.clone(), client);
        debug!("Total clients: {}", clients.len());
        Ok(())
    }

    /// Claim the first free name in `requested, requested1, requested2, ...`
    ///
    /// The lookup and the insert happen under one write lock, so two
    /// concurrent claims for the same name always end up with different names.
    /// `build` receives the resolved name and must not block.
    pub fn claim<F>(&self, requested: &str, build: F) -> Arc<Client>
    where
        F: FnOnce(String) -> Client,
    {
        let mut clients = self.clients.write();
        let mut candidates = NameCandidates::new(requested);
        let name = loop {
            let candidate = candidates.next_candidate();
            if !clients.contains_key(&candidate) {
                break candidate;
            }
        };

        let client = Arc::new(build(name.clone()));
        clients.insert(name, Arc::clone(&client));
        debug!("Total clients: {}", clients.len());
        client
    }

    /// Remove the entry under `name`, if any
    ///
    /// Removing an absent name is a no-op.
    pub fn remove(&self, name: &str) -> Option<Arc<Client>> {
        let mut clients = self.clients.write();
        let removed = clients.remove(name);
        if removed.is_some() {
            debug!("Total clients: {}", clients.len());
        }
        removed
    }

    /// Remove `client` only if its name still maps to this very session
    ///
    /// Returns true if the entry was removed by this call.
    pub fn remove_session(&self, client: &Client) -> bool {
        let mut clients = self.clients.write();
        match clients.get(&client.name) {
            Some(entry) if entry.id == client.id => {
                clients.remove(&client.name);
                debug!("Total clients: {}", clients.len());
                true
            }
            _ => false,
        }
    }

    /// Point-in-time list of joined names, sorted
    pub fn snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Apply `f` to every session whose name is not `excluded`
    ///
    /// Runs under the read lock, so `f` must be quick and must not block.
    pub fn for_each_except<F>(&self, excluded: Option<&str>, mut f: F)
    where
        F: FnMut(&Client),
    {
        let clients = self.clients.read();
        for (name, client) in clients.iter() {
            if excluded == Some(name.as_str()) {
                continue;
            }
            f(client);
        }
    }

    /// Check whether a name is currently taken
    pub fn contains(&self, name: &str) -> bool {
        self.clients.read().contains_key(name)
    }

    /// Number of joined sessions
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    /// Check whether no session is joined
    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::thread;

    use tokio::sync::mpsc;

    use super::*;
    use crate::message::ServerMessage;
    use crate::types::ClientId;

    fn addr() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    fn make_client(name: &str) -> (Arc<Client>, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let client = Client::new(ClientId::new(), name.to_string(), addr(), tx);
        (Arc::new(client), rx)
    }

    fn claim(registry: &Registry, requested: &str) -> Arc<Client> {
        let (tx, _rx) = mpsc::channel(8);
        registry.claim(requested, |name| Client::new(ClientId::new(), name, addr(), tx))
    }

    #[test]
    fn test_add_and_duplicate() {
        let registry = Registry::new();
        let (amy, _rx1) = make_client("amy");
        let (other_amy, _rx2) = make_client("amy");

        assert!(registry.add(Arc::clone(&amy)).is_ok());
        assert_eq!(
            registry.add(other_amy),
            Err(RegistryError::DuplicateName("amy".to_string()))
        );

        // The original entry survives the failed add
        assert_eq!(registry.len(), 1);
        registry.for_each_except(None, |c| assert_eq!(c.id, amy.id));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = Registry::new();
        let (amy, _rx) = make_client("amy");
        registry.add(amy).unwrap();

        assert!(registry.remove("amy").is_some());
        assert!(registry.remove("amy").is_none());
        assert!(!registry.contains("amy"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_session_ignores_newer_holder() {
        let registry = Registry::new();
        let first = claim(&registry, "amy");
        assert!(registry.remove_session(&first));

        // The name is reused by a new session before the old one cleans up again
        let second = claim(&registry, "amy");
        assert_eq!(second.name, "amy");

        assert!(!registry.remove_session(&first));
        assert!(registry.contains("amy"));
        assert!(registry.remove_session(&second));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_claim_appends_suffix() {
        let registry = Registry::new();

        assert_eq!(claim(&registry, "bob").name, "bob");
        assert_eq!(claim(&registry, "bob").name, "bob1");
        assert_eq!(claim(&registry, "bob").name, "bob2");

        // A freed slot is reused first
        registry.remove("bob1");
        assert_eq!(claim(&registry, "bob").name, "bob1");
    }

    #[test]
    fn test_claim_skips_taken_suffix() {
        let registry = Registry::new();
        claim(&registry, "bob1");

        assert_eq!(claim(&registry, "bob").name, "bob");
        assert_eq!(claim(&registry, "bob").name, "bob2");
    }

    #[test]
    fn test_concurrent_claims_are_unique() {
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || claim(&registry, "bob").name.clone())
            })
            .collect();

        let mut names: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        names.sort();
        names.dedup();

        assert_eq!(names.len(), 16);
        assert_eq!(registry.len(), 16);
        assert!(registry.contains("bob"));
        assert!(registry.contains("bob15"));
    }

    #[test]
    fn test_snapshot_sorted() {
        let registry = Registry::new();
        claim(&registry, "zed");
        claim(&registry, "amy");
        claim(&registry, "amy");

        assert_eq!(registry.snapshot(), vec!["amy", "amy1", "zed"]);
    }

    #[test]
    fn test_for_each_except() {
        let registry = Registry::new();
        claim(&registry, "amy");
        claim(&registry, "bob");
        claim(&registry, "cat");

        let mut seen = Vec::new();
        registry.for_each_except(Some("bob"), |c| seen.push(c.name.clone()));
        seen.sort();
        assert_eq!(seen, vec!["amy", "cat"]);

        let mut count = 0;
        registry.for_each_except(None, |_| count += 1);
        assert_eq!(count, 3);
    }
}
