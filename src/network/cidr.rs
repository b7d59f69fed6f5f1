//! IPv4 CIDR blocks as handed to the enforcement backend.

use std::fmt;
use std::net::Ipv4Addr;

use super::mask::{PrefixLen, mask_ipv4};

/// An IPv4 network: a base address plus a prefix length.
///
/// The base address always has its host bits cleared, so two
/// detections inside the same subnet produce equal blocks.
///
/// # Example
///
/// ```
/// use logwall::network::{Cidr, PrefixLen};
/// use std::net::Ipv4Addr;
///
/// let block = Cidr::masked(Ipv4Addr::new(10, 1, 2, 77), PrefixLen::new(24).unwrap());
/// assert_eq!(block.to_string(), "10.1.2.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    network: Ipv4Addr,
    prefix: PrefixLen,
}

impl Cidr {
    /// Creates the `/32` block for a single host.
    #[must_use]
    pub const fn host(address: Ipv4Addr) -> Self {
        Self {
            network: address,
            prefix: PrefixLen::HOST,
        }
    }

    /// Creates the block of the given prefix length that contains `address`.
    #[must_use]
    pub fn masked(address: Ipv4Addr, prefix: PrefixLen) -> Self {
        Self {
            network: mask_ipv4(address, prefix),
            prefix,
        }
    }

    /// Returns the network (base) address.
    #[must_use]
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix(&self) -> PrefixLen {
        self.prefix
    }

    /// Returns true if `address` falls within this block.
    #[must_use]
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        mask_ipv4(address, self.prefix) == self.network
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}
