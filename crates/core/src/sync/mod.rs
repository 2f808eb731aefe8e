//! Signal synchronization logic and ports

pub mod aggregate;
pub mod ports;
