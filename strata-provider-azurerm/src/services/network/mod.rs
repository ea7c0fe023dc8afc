//! Network

pub mod backend_address_pool_association;
pub mod helpers;
pub mod models;
pub mod parse;
mod registration;
pub mod web_application_firewall_policy;

pub use registration::Registration;

pub const API_VERSION: &str = "2023-04-01";
