//! Errors raised while turning wire records into domain types

use thiserror::Error;

/// A wire record that cannot be represented as a domain value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A field required by the record's state is absent
    #[error("record {id}: missing field `{field}`")]
    MissingField {
        /// Identifier of the offending record
        id: String,
        /// Name of the missing wire field
        field: &'static str,
    },
}

impl ModelError {
    pub fn missing(id: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            id: id.into(),
            field,
        }
    }
}
