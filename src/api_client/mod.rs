// Client for the external storefront API
// All upstream traffic goes through ExternalApi; responses are normalized here

pub mod body;
pub mod client;
pub mod outcome;

pub use body::{FilePart, OutboundBody, OutboundForm};
pub use client::{ClientError, ExternalApi, UpstreamBody, UpstreamRequest, UpstreamResponse};
pub use outcome::{AuthOutcome, FALLBACK_MESSAGE};
