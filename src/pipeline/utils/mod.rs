//! Shared utilities for pipeline components.

pub mod checksum;
pub mod fs;
pub mod http;
pub mod proc;
