//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `form` - Field specifications, schemas, and registered forms
//! - `interview` - Elicitation, extraction, and the session aggregate

pub mod form;
pub mod foundation;
pub mod interview;
