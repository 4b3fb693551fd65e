//! Core data models for the S3 proxy.
//!
//! These entities describe what the service returns and reasons about:
//! object projections and the access-control grants they are derived from.
//! Everything here serializes naturally as JSON via `serde`; nothing is
//! persisted locally.

pub mod acl;
pub mod object_view;
