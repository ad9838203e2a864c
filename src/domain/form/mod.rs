//! Form domain module.
//!
//! A form is a titled, ordered list of typed fields. Fields are immutable
//! once an interview session has been started from the form.

mod field;
#[allow(clippy::module_inception)]
mod form;
mod schema;

pub use field::{FieldKind, FieldSpec};
pub use form::Form;
pub use schema::{Schema, SchemaError};
