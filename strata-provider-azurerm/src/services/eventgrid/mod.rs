//! Event Grid

pub mod event_subscription;
pub mod models;
pub mod parse;
mod registration;

pub use registration::Registration;
