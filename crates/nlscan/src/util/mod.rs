//! Shared utilities for nlscan.

pub mod ifname;

pub use ifname::{interface_exists, name_to_index};
