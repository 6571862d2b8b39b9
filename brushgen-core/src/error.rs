//! Error types for brush construction, transformation and output.

use thiserror::Error;

/// Result type for brush operations.
pub type BrushResult<T> = Result<T, BrushError>;

/// Errors that can occur while building, transforming or writing brushes.
#[derive(Debug, Error)]
pub enum BrushError {
    /// A brush needs enough faces to enclose a volume.
    #[error("need at least {required} faces to form a brush, got {actual}")]
    TooFewFaces {
        /// Minimum number of faces.
        required: usize,
        /// Number of faces supplied.
        actual: usize,
    },

    /// A face does not span a plane or cannot be textured.
    #[error("degenerate face: {reason}")]
    DegenerateFace {
        /// What is wrong with the face.
        reason: String,
    },

    /// A shape or modifier parameter is out of its domain.
    #[error("invalid {name} ({value}): {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value, formatted.
        value: String,
        /// Constraint that was violated.
        reason: &'static str,
    },

    /// The entity does not implement the requested operation.
    #[error("{operation} is not implemented for {entity}")]
    Unsupported {
        /// Operation that was requested.
        operation: &'static str,
        /// Kind of entity it was requested on.
        entity: &'static str,
    },

    /// Writing to the output sink failed.
    #[error("failed to write map: {0}")]
    Io(#[from] std::io::Error),
}

impl BrushError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Errors reported by texture size lookups.
///
/// These never abort serialization; faces fall back to a default size.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// No size is known for the texture.
    #[error("size of texture `{0}` not found")]
    NotFound(String),

    /// A texture size table could not be read.
    #[error("texture table line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

/// Errors reported by the map reader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input does not follow the map grammar.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax {
        /// Byte offset into the input where parsing stopped.
        offset: usize,
        /// Parser diagnostic.
        message: String,
    },
}
