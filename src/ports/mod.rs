//! Port traits between the domain and the outside world.

pub mod config_port;
pub mod data_port;
pub mod fee_port;
pub mod report_port;
