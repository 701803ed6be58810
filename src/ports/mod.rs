//! Port traits at the boundary of the domain.

pub mod config_port;
pub mod market_port;
pub mod report_port;
