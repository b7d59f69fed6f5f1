//! Network-prefix masking for IPv4 addresses.

use std::fmt;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Error returned when a prefix length falls outside `0..=32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid IPv4 prefix length {0}: expected a value between 0 and 32")]
pub struct MaskError(pub i64);

/// An IPv4 prefix length, guaranteed to be within `0..=32`.
///
/// Construction is the only place the range is checked, so every
/// masking operation downstream is infallible.
///
/// # Example
///
/// ```
/// use logwall::network::PrefixLen;
///
/// let prefix = PrefixLen::new(24).unwrap();
/// assert_eq!(prefix.get(), 24);
/// assert!(PrefixLen::new(33).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrefixLen(u8);

impl PrefixLen {
    /// The longest prefix: a single host.
    pub const HOST: Self = Self(32);

    /// The shortest prefix: every address.
    pub const ANY: Self = Self(0);

    /// Creates a prefix length, rejecting values above 32.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError`] if `len > 32`.
    pub const fn new(len: u8) -> Result<Self, MaskError> {
        if len > 32 {
            return Err(MaskError(len as i64));
        }
        Ok(Self(len))
    }

    /// Returns the prefix length as a plain integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the netmask with the top `len` bits set.
    #[must_use]
    pub const fn mask(self) -> u32 {
        // Shifting a u32 by 32 overflows, so /0 is handled explicitly.
        if self.0 == 0 {
            0
        } else {
            u32::MAX << (32 - self.0)
        }
    }
}

impl TryFrom<i64> for PrefixLen {
    type Error = MaskError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| MaskError(value))
            .and_then(|len| Self::new(len).map_err(|_| MaskError(value)))
    }
}

impl fmt::Display for PrefixLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clears every bit of `address` below the given prefix.
///
/// # Example
///
/// ```
/// use logwall::network::{PrefixLen, apply_mask};
///
/// let addr = u32::from_be_bytes([10, 1, 2, 77]);
/// let masked = apply_mask(addr, PrefixLen::new(24).unwrap());
/// assert_eq!(masked.to_be_bytes(), [10, 1, 2, 0]);
/// ```
#[must_use]
pub const fn apply_mask(address: u32, prefix: PrefixLen) -> u32 {
    address & prefix.mask()
}

/// Convenience wrapper over [`apply_mask`] for [`Ipv4Addr`].
#[must_use]
pub fn mask_ipv4(address: Ipv4Addr, prefix: PrefixLen) -> Ipv4Addr {
    Ipv4Addr::from(apply_mask(u32::from(address), prefix))
}
