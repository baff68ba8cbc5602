//! Error types for BAEV decoding and encoding

use thiserror::Error;

/// Errors that can occur when decoding, encoding or projecting BAEV archives
#[derive(Debug, Error)]
pub enum BaevError {
    /// Buffer is shorter than a read demands
    #[error("truncated input at offset {offset:#x} (need {need} bytes, have {have})")]
    TruncatedInput {
        offset: usize,
        need: usize,
        have: usize,
    },

    /// Buffer ended before a string's null terminator
    #[error("unterminated string at offset {offset:#x}")]
    UnterminatedString { offset: usize },

    /// String field is not valid UTF-8
    #[error("string at offset {offset:#x} is not valid UTF-8: {source}")]
    Encoding {
        offset: usize,
        source: std::str::Utf8Error,
    },

    /// Magic tag mismatch (strict mode)
    #[error("unexpected magic at offset {offset:#x}: expected {expected:?}, found {found:?}")]
    UnexpectedMagic {
        offset: usize,
        expected: [u8; 4],
        found: [u8; 4],
    },

    /// Array descriptor element size differs from the record size (strict mode)
    #[error("array at offset {offset:#x} has element size {found}, expected {expected}")]
    UnexpectedElementSize {
        offset: usize,
        expected: usize,
        found: usize,
    },

    /// Parameter type code is not one of 0, 1, 3, 5
    #[error("unknown parameter type code {tag} at offset {offset:#x}")]
    UnknownParameterTag { offset: usize, tag: u32 },

    /// Event info bucket points past the end of the node table
    #[error("bucket {bucket} references node {index}, but the node table has {len} entries")]
    DanglingNodeIndex { bucket: usize, index: u32, len: usize },

    /// Parameter tree value cannot be mapped to a known parameter kind
    #[error("cannot encode parameter: {reason}")]
    UnencodableParameter { reason: String },

    /// Model references are not self-consistent
    #[error("inconsistent model: {0}")]
    InconsistentModel(String),

    /// Value does not fit its fixed-size field
    #[error("{field} does not fit: {len} (max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// String cannot be stored null-terminated
    #[error("{field} contains an interior null byte")]
    InteriorNul { field: &'static str },

    /// Tree projection does not match the expected shape
    #[error("invalid tree: {0}")]
    Tree(#[from] serde_json::Error),

    /// Error raised while decoding a named structure
    #[error("{field}: {source}")]
    Field {
        field: &'static str,
        source: Box<BaevError>,
    },
}

impl BaevError {
    /// Innermost error, skipping structure context
    pub fn root(&self) -> &BaevError {
        match self {
            Self::Field { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result alias for BAEV operations
pub type Result<T> = std::result::Result<T, BaevError>;

/// Attach the name of the structure being decoded to an error
pub(crate) trait FieldContext<T> {
    fn field(self, field: &'static str) -> Result<T>;
}

impl<T> FieldContext<T> for Result<T> {
    fn field(self, field: &'static str) -> Result<T> {
        self.map_err(|e| BaevError::Field {
            field,
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BaevError::TruncatedInput {
                offset: 0x10,
                need: 4,
                have: 2
            }
            .to_string(),
            "truncated input at offset 0x10 (need 4 bytes, have 2)"
        );
        assert_eq!(
            BaevError::UnknownParameterTag { offset: 0x40, tag: 2 }.to_string(),
            "unknown parameter type code 2 at offset 0x40"
        );
    }

    #[test]
    fn test_field_context_nests() {
        let result: Result<()> = Err(BaevError::UnterminatedString { offset: 8 });
        let err = result.field("event").field("node table").unwrap_err();

        assert_eq!(
            err.to_string(),
            "node table: event: unterminated string at offset 0x8"
        );
        assert!(matches!(
            err.root(),
            BaevError::UnterminatedString { offset: 8 }
        ));
    }
}
