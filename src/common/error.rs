use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum SymbolError {
    // Input
    #[error("Empty data")]
    EmptyData,
    #[error("Invalid character at position {0}")]
    InvalidChar(usize),
    #[error("Characters cannot be represented in the requested character set")]
    UnsupportedCharacters,
    #[error("Invalid structured primary message: {0}")]
    InvalidPrimary(String),
    #[error("Invalid GS1 data: {0}")]
    InvalidGs1(String),
    #[error("Invalid version")]
    InvalidVersion,
    #[error("Invalid error correction level")]
    InvalidECLevel,
    #[error("Invalid mode")]
    InvalidMode,
    #[error("Invalid masking pattern")]
    InvalidMaskingPattern,

    // Capacity
    #[error("Data too long")]
    DataTooLong,

    // Options
    #[error("Conflicting options: {0}")]
    ConflictingOptions(&'static str),

    // Tables and algorithms
    #[error("Internal defect: {0}")]
    Internal(&'static str),
}

/// Broad classes of failure, used by callers to tell user mistakes from bugs.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ErrorKind {
    InvalidInput,
    CapacityExceeded,
    ConfigurationConflict,
    InternalDefect,
}

impl SymbolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyData
            | Self::InvalidChar(_)
            | Self::UnsupportedCharacters
            | Self::InvalidPrimary(_)
            | Self::InvalidGs1(_)
            | Self::InvalidVersion
            | Self::InvalidECLevel
            | Self::InvalidMode
            | Self::InvalidMaskingPattern => ErrorKind::InvalidInput,
            Self::DataTooLong => ErrorKind::CapacityExceeded,
            Self::ConflictingOptions(_) => ErrorKind::ConfigurationConflict,
            Self::Internal(_) => ErrorKind::InternalDefect,
        }
    }

    pub fn is_user_error(&self) -> bool {
        self.kind() != ErrorKind::InternalDefect
    }
}

pub type SymbolResult<T> = Result<T, SymbolError>;

#[cfg(test)]
mod error_tests {
    use super::{ErrorKind, SymbolError};

    #[test]
    fn test_kind() {
        assert_eq!(SymbolError::InvalidChar(3).kind(), ErrorKind::InvalidInput);
        assert_eq!(SymbolError::DataTooLong.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(
            SymbolError::ConflictingOptions("gs1 and reader init").kind(),
            ErrorKind::ConfigurationConflict
        );
        assert_eq!(SymbolError::Internal("bad table").kind(), ErrorKind::InternalDefect);
        assert!(!SymbolError::Internal("bad table").is_user_error());
        assert!(SymbolError::DataTooLong.is_user_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(SymbolError::DataTooLong.to_string(), "Data too long");
        assert_eq!(
            SymbolError::InvalidPrimary("postcode".to_string()).to_string(),
            "Invalid structured primary message: postcode"
        );
    }
}
