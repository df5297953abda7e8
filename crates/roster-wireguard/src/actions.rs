//! Name-addressed peer mutations on a [`Configuration`].
//!
//! [`Configuration::add_peer`] refuses duplicate names, but a configuration
//! read from disk may still hold several peers with the same name. The
//! remove/enable/disable operations act on the last peer with a matching name.

use crate::config::{Configuration, Peer};
use crate::error::{Result, WireGuardError};

impl Configuration {
    /// Appends a named peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer has no name or the name is already taken.
    pub fn add_peer(&mut self, peer: Peer) -> Result<()> {
        let name = match peer.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(WireGuardError::PeerNameRequired),
        };
        if self.peers.iter().any(|p| p.name.as_deref() == Some(name)) {
            return Err(WireGuardError::DuplicatePeer(name.to_string()));
        }
        self.peers.push(peer);
        Ok(())
    }

    /// Removes the peer with the given name and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::PeerNotFound`] if no peer has that name.
    pub fn remove_peer(&mut self, name: &str) -> Result<Peer> {
        let idx = self.peer_index(name)?;
        Ok(self.peers.remove(idx))
    }

    /// Clears the disabled flag of the named peer.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::PeerNotFound`] if no peer has that name.
    pub fn enable_peer(&mut self, name: &str) -> Result<()> {
        let idx = self.peer_index(name)?;
        self.peers[idx].disabled = false;
        Ok(())
    }

    /// Sets the disabled flag of the named peer.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::PeerNotFound`] if no peer has that name.
    pub fn disable_peer(&mut self, name: &str) -> Result<()> {
        let idx = self.peer_index(name)?;
        self.peers[idx].disabled = true;
        Ok(())
    }

    /// Returns the peer with the given name, if any.
    #[must_use]
    pub fn peer(&self, name: &str) -> Option<&Peer> {
        self.peers.iter().rev().find(|p| p.name.as_deref() == Some(name))
    }

    fn peer_index(&self, name: &str) -> Result<usize> {
        self.peers
            .iter()
            .rposition(|p| p.name.as_deref() == Some(name))
            .ok_or_else(|| WireGuardError::PeerNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{Key, KEY_SIZE};

    fn key(byte: u8) -> Key {
        Key::from_bytes_array([byte; KEY_SIZE])
    }

    fn config_with(names: &[&str]) -> Configuration {
        let mut config = Configuration::new("wg0", key(1));
        for (i, name) in names.iter().enumerate() {
            let byte = u8::try_from(i + 2).expect("small index");
            config.peers.push(Peer::new(key(byte)).with_name(*name));
        }
        config
    }

    #[test]
    fn add_peer_appends() {
        let mut config = config_with(&["alice"]);
        config.add_peer(Peer::new(key(9)).with_name("bob")).expect("add");
        assert_eq!(config.peers.len(), 2);
        assert_eq!(config.peers[1].name(), "bob");
    }

    #[test]
    fn add_peer_requires_name() {
        let mut config = config_with(&[]);
        assert!(matches!(
            config.add_peer(Peer::new(key(9))),
            Err(WireGuardError::PeerNameRequired)
        ));
        assert!(matches!(
            config.add_peer(Peer::new(key(9)).with_name("")),
            Err(WireGuardError::PeerNameRequired)
        ));
        assert!(config.peers.is_empty());
    }

    #[test]
    fn add_peer_rejects_duplicate() {
        let mut config = config_with(&["alice"]);
        let err = config
            .add_peer(Peer::new(key(9)).with_name("alice"))
            .expect_err("duplicate");
        assert!(matches!(err, WireGuardError::DuplicatePeer(ref n) if n == "alice"));
        assert_eq!(config.peers.len(), 1);
    }

    #[test]
    fn remove_peer_returns_entry() {
        let mut config = config_with(&["alice", "bob"]);
        let removed = config.remove_peer("alice").expect("remove");
        assert_eq!(removed.public_key, key(2));
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peers[0].name(), "bob");
    }

    #[test]
    fn enable_and_disable_toggle_flag() {
        let mut config = config_with(&["alice"]);
        config.disable_peer("alice").expect("disable");
        assert!(config.peers[0].disabled);
        config.enable_peer("alice").expect("enable");
        assert!(!config.peers[0].disabled);
    }

    #[test]
    fn missing_peer_leaves_list_untouched() {
        let mut config = config_with(&["alice"]);
        let before = config.clone();

        assert!(matches!(config.remove_peer("carol"), Err(WireGuardError::PeerNotFound(_))));
        assert!(matches!(config.enable_peer("carol"), Err(WireGuardError::PeerNotFound(_))));
        assert!(matches!(config.disable_peer("carol"), Err(WireGuardError::PeerNotFound(_))));
        assert_eq!(config, before);
    }

    #[test]
    fn duplicate_names_resolve_to_last_match() {
        let mut config = config_with(&["dup", "dup"]);
        config.disable_peer("dup").expect("disable");
        assert!(!config.peers[0].disabled);
        assert!(config.peers[1].disabled);

        let removed = config.remove_peer("dup").expect("remove");
        assert_eq!(removed.public_key, key(3));
        assert_eq!(config.peer("dup").map(|p| p.public_key), Some(key(2)));
    }
}
