//! Client address allocation within the server's subnet.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

use ipnet::{IpNet, Ipv4Net};

use crate::error::{Result, VpnError};

/// Hands out client addresses from the subnet of the server's address.
///
/// Candidates are scanned upward from the address right after the server's
/// own, skipping reserved addresses. The scan ends at the subnet's broadcast
/// address, which is never handed out.
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    server: IpNet,
    subnet: Ipv4Net,
    reserved: HashSet<Ipv4Addr>,
}

impl AddressAllocator {
    /// Creates an allocator for the subnet of `server`.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::UnsupportedServerAddress`] if `server` is not an
    /// IPv4 prefix.
    pub fn new(server: IpNet) -> Result<Self> {
        let IpNet::V4(subnet) = server else {
            return Err(VpnError::UnsupportedServerAddress(server));
        };
        Ok(Self {
            server,
            subnet,
            reserved: HashSet::new(),
        })
    }

    /// Marks an address as taken.
    pub fn reserve(&mut self, addr: IpAddr) {
        if let IpAddr::V4(v4) = addr {
            self.reserved.insert(v4);
        }
    }

    /// Returns the number of reserved addresses.
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Allocates the next free address, reserving it, as a prefix with the
    /// subnet's length.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::AddressExhausted`] once the scan reaches the
    /// broadcast address.
    pub fn allocate(&mut self) -> Result<Ipv4Net> {
        let broadcast = self.subnet.broadcast();
        let mut candidate = u32::from(self.subnet.addr());

        loop {
            candidate = candidate
                .checked_add(1)
                .ok_or(VpnError::AddressExhausted(self.server))?;
            let addr = Ipv4Addr::from(candidate);
            if !self.subnet.contains(&addr) || addr == broadcast {
                return Err(VpnError::AddressExhausted(self.server));
            }
            if self.reserved.insert(addr) {
                return Ipv4Net::new(addr, self.subnet.prefix_len())
                    .map_err(|_| VpnError::UnsupportedServerAddress(self.server));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn allocator(server: &str) -> AddressAllocator {
        AddressAllocator::new(server.parse().expect("valid prefix")).expect("ipv4")
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().expect("valid ip")
    }

    #[test]
    fn skips_reserved_addresses() {
        let mut alloc = allocator("10.0.0.1/24");
        alloc.reserve(ip("10.0.0.2"));
        alloc.reserve(ip("10.0.0.3"));

        let next = alloc.allocate().expect("allocate");
        assert_eq!(next.to_string(), "10.0.0.4/24");
        assert_eq!(alloc.reserved_count(), 3);
    }

    #[test]
    fn reuses_gaps() {
        let mut alloc = allocator("10.0.0.1/24");
        alloc.reserve(ip("10.0.0.3"));
        assert_eq!(alloc.allocate().expect("allocate").addr(), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(alloc.allocate().expect("allocate").addr(), Ipv4Addr::new(10, 0, 0, 4));
    }

    #[test]
    fn full_subnet_is_exhausted() {
        let mut alloc = allocator("10.0.0.1/24");
        for _ in 0..253 {
            alloc.allocate().expect("allocate");
        }
        assert_eq!(alloc.reserved_count(), 253);
        assert!(matches!(alloc.allocate(), Err(VpnError::AddressExhausted(_))));
    }

    #[test]
    fn broadcast_is_never_allocated() {
        let mut alloc = allocator("10.0.0.1/30");
        assert_eq!(alloc.allocate().expect("allocate").addr(), Ipv4Addr::new(10, 0, 0, 2));
        assert!(alloc.allocate().is_err());
    }

    #[test_case("10.0.0.1/32" ; "host prefix")]
    #[test_case("10.0.0.1/31" ; "point to point")]
    #[test_case("255.255.255.255/0" ; "top of address space")]
    fn nothing_to_allocate(server: &str) {
        assert!(matches!(
            allocator(server).allocate(),
            Err(VpnError::AddressExhausted(_))
        ));
    }

    #[test]
    fn ipv6_server_rejected() {
        let server: IpNet = "fd00::1/64".parse().expect("valid prefix");
        assert!(matches!(
            AddressAllocator::new(server),
            Err(VpnError::UnsupportedServerAddress(_))
        ));
    }

    #[test]
    fn ipv6_reservations_ignored() {
        let mut alloc = allocator("10.0.0.1/24");
        alloc.reserve(ip("fd00::2"));
        assert_eq!(alloc.reserved_count(), 0);
    }
}
