//! Strata Core
//!
//! Host contract shared by Strata providers: attribute values, resource
//! schemas, service registrations and the async `Provider` trait.

pub mod provider;
pub mod resource;
pub mod schema;
