//! IPv4 address arithmetic.
//!
//! This module provides:
//! - Validated prefix lengths ([`PrefixLen`])
//! - The mask computer ([`apply_mask`], [`mask_ipv4`])
//! - CIDR blocks for backend entries ([`Cidr`])

mod cidr;
mod mask;

pub use cidr::Cidr;
pub use mask::{MaskError, PrefixLen, apply_mask, mask_ipv4};
