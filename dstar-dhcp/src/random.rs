//! Spoofed client identities

use dstar_core::MacAddr;
use rand::Rng;

/// Fresh unicast, locally administered MAC address
pub fn random_client_mac() -> MacAddr {
    let mut bytes: [u8; 6] = rand::thread_rng().gen();
    bytes[0] = (bytes[0] & 0xFE) | 0x02;
    MacAddr(bytes)
}

/// Transaction id for a new exchange; never zero
pub fn random_xid() -> u32 {
    rand::thread_rng().gen_range(1..=u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_mac_is_unicast_local() {
        for _ in 0..256 {
            let mac = random_client_mac();
            assert!(!mac.is_multicast());
            assert!(mac.is_locally_administered());
        }
    }

    #[test]
    fn test_random_macs_differ() {
        let macs: HashSet<_> = (0..64).map(|_| random_client_mac()).collect();
        assert!(macs.len() > 60);
    }

    #[test]
    fn test_random_xid_nonzero() {
        assert!((0..1000).all(|_| random_xid() != 0));
    }
}
