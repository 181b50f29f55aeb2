//! Shared types for Stablepay.
//!
//! `objects` holds the wire types exchanged with the checkout frontend and
//! the external relaying/quoting services. `link` derives content-addressed
//! short-link ids. The `client` feature adds typed HTTP clients for those
//! external services.

pub mod link;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;
