//! Typed client for the Metrc seed-to-sale tracking API.
//!
//! Only the resources the evaluation exercises are modelled: locations,
//! strains and items, each with create, update, active listing, by-id read and
//! by-id delete.
//!
//! - **[`client`]**: the [`MetrcApi`] trait and its blocking HTTP implementation.
//! - **[`endpoint`]**: request target formatting shared with callers that record
//!   what was sent.
//! - **[`models`]**: request and response bodies.

pub mod client;
pub mod endpoint;
pub mod models;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{Credentials, HttpMetrc, MetrcApi};
pub use endpoint::{Operation, Resource, request_target};
