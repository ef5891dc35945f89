use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field `{field}` is missing")]
    RequiredFieldMissing { field: &'static str },

    #[error("Field `{field}` is {actual} characters long (max {max})")]
    LengthExceeded {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::RequiredFieldMissing { field } | Self::LengthExceeded { field, .. } => field,
        }
    }
}
