//! Eloqua Cog: a gRPC plugin exposing marketing-automation steps
//! (create/delete/discover/validate a contact record) over the Eloqua
//! REST API.
//!
//! The dispatch service ([`service::Cog`]) authenticates an Eloqua client
//! once per connection from call metadata, resolves incoming step
//! identifiers through the [`registry::StepRegistry`], and converts every
//! step fault into a structured ERROR outcome instead of a transport
//! error.

pub mod client;
pub mod compare;
pub mod error;
pub mod registry;
pub mod service;
pub mod step;
pub mod steps;
