//! Tracing initialization
//!
//! `fmt` output for terminals, JSON lines for log collectors.

mod init_basic;

pub use init_basic::init_tracing;
