//! API Management

pub mod api_tag_description;
pub mod models;
pub mod parse;
mod registration;

pub use registration::Registration;
