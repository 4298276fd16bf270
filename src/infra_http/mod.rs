mod auth_transport_http;

pub use auth_transport_http::*;
