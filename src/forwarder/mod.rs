// Request forwarding module
// Relays profile, catalogue, avatar and order calls with the session's bearer token

pub mod handlers;
pub mod payload;
pub mod service;

pub use handlers::{forward_as_entrepreneur, forward_as_user, forward_public};
pub use payload::ForwardPayload;
pub use service::{Access, Forwarder};
