//! Tail layer: incremental, offset-tracked reading of growing log files.
//!
//! This module provides:
//! - The per-file cursor and reader ([`LogTail`])
//! - A lazy iterator over new complete lines ([`NewLines`])
//! - Error handling ([`TailError`])

mod cursor;
mod error;


pub use cursor::{LogTail, NewLines};
pub use error::TailError;
