//! Protocol version management.

/// Current protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// Minimum supported protocol version.
pub const MIN_PROTOCOL_VERSION: u16 = 1;

/// Check if a peer's protocol version is compatible.
pub fn is_compatible(peer_version: u16) -> bool {
    (MIN_PROTOCOL_VERSION..=PROTOCOL_VERSION).contains(&peer_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_versions_are_compatible() {
        assert!(is_compatible(PROTOCOL_VERSION));
        assert!(!is_compatible(0));
        assert!(!is_compatible(PROTOCOL_VERSION + 1));
    }
}
