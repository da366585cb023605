//! Schema validation seam over the `validator` crate.

use validator::Validate;

use crate::error::ValidationError;

/// An input type with declarative validation rules.
///
/// `FIELDS` pairs each Rust field name with the name callers use on the wire,
/// in declaration order. Issues are reported under the wire name, in the order
/// a caller reads the schema.
pub trait Schema: Validate {
    const FIELDS: &'static [(&'static str, &'static str)];

    fn check(&self) -> Result<(), ValidationError> {
        self.validate()
            .map_err(|errors| ValidationError::from_validator(&errors, Self::FIELDS))
    }
}
