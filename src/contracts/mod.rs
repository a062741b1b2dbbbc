//! Contract bindings for the Forwarder and its recipient token

pub mod forwarder;
pub mod token;

pub use forwarder::*;
pub use token::*;
