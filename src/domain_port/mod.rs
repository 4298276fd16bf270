// store

mod secret_store;

pub use secret_store::*;

// collaborators

mod auth_transport;
mod token_decoder;

pub use auth_transport::*;
pub use token_decoder::*;
