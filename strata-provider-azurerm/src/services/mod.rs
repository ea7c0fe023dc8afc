//! Service packages
//!
//! Each service contributes a `Registration` naming the resource types it
//! implements.

pub mod apimanagement;
pub mod eventgrid;
pub mod network;
pub mod paloalto;

use strata_core::provider::ServiceRegistration;

/// Every service registered with the provider
pub fn registrations() -> Vec<Box<dyn ServiceRegistration>> {
    vec![
        Box::new(apimanagement::Registration),
        Box::new(eventgrid::Registration),
        Box::new(network::Registration),
        Box::new(paloalto::Registration),
    ]
}
