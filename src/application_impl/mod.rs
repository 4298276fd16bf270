mod auth_session_impl;
mod expiry_evaluator;
mod refresh_coordinator;
mod session_state;
mod token_store;

pub use auth_session_impl::*;
pub use expiry_evaluator::*;
pub use refresh_coordinator::*;
pub use session_state::*;
pub use token_store::*;
