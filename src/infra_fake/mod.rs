mod auth_transport_fake;

pub use auth_transport_fake::*;
