//! Feature normalization for postoperative risk models.
//!
//! Converts raw form entries into the integer codes a specific model was
//! trained with. Normalization is a pure function of the raw input and the
//! model's [`EncodingScheme`](postop_model::EncodingScheme):
//!
//! - **rules**: lab discretization and categorical code tables
//! - **normalize**: scheme-driven encoding plus inverse label lookup
//! - **form**: input-form fields derived from a scheme

pub mod form;
pub mod normalize;
pub mod rules;

pub use form::{Control, FormField, apply_defaults, form_fields};
pub use normalize::{decode, encode_column, encode_value, normalize};
