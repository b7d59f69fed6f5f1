//! logwall: log-driven network access control
//!
//! A library for tailing log files, matching IPv4 sources against
//! per-file accept and reject patterns, and feeding them into
//! ipset/iptables allow and block sets.

pub mod config;
pub mod enforce;
pub mod matcher;
pub mod monitor;
pub mod network;
pub mod pipeline;
pub mod tail;
pub mod time;
