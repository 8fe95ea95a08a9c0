use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::{atomic, Atomic};

/// Error kinds for mapsift operations.
///
/// Each error kind describes a specific category of failure in the filter
/// engine, enabling precise error handling by callers.
///
/// # Examples
///
/// ```rust,ignore
/// use mapsift::errors::{MapsiftError, ErrorKind, MapsiftResult};
///
/// fn example() -> MapsiftResult<()> {
///     Err(MapsiftError::new("field is not analyzed", ErrorKind::NotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Error while analyzing the feature collection
    AnalysisError,
    /// A clause was constructed with invalid bounds or an empty value set
    InvalidClause,
    /// A compiled expression does not have the expected shape
    CompileError,
    /// A serialized filter expression could not be decoded
    DecodeError,
    /// Error while maintaining a dimensional index
    IndexError,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The requested field or feature was not found
    NotFound,
    /// Error in event bus processing
    EventError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::AnalysisError => write!(f, "Analysis error"),
            ErrorKind::InvalidClause => write!(f, "Invalid clause"),
            ErrorKind::CompileError => write!(f, "Compile error"),
            ErrorKind::DecodeError => write!(f, "Decode error"),
            ErrorKind::IndexError => write!(f, "Index error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom mapsift error type.
///
/// `MapsiftError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use mapsift::errors::{MapsiftError, ErrorKind};
///
/// // Create a simple error
/// let err = MapsiftError::new("empty membership set", ErrorKind::InvalidClause);
///
/// // Create an error with a cause
/// let cause = MapsiftError::new("truncated input", ErrorKind::DecodeError);
/// let err = MapsiftError::new_with_cause("filter parameter rejected", ErrorKind::DecodeError, cause);
/// ```
///
/// # Type alias
///
/// The `MapsiftResult<T>` type alias is equivalent to `Result<T, MapsiftError>`
/// and is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct MapsiftError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MapsiftError>>,
    backtrace: Atomic<Backtrace>,
}

impl MapsiftError {
    /// Creates a new `MapsiftError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MapsiftError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `MapsiftError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MapsiftError) -> Self {
        MapsiftError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<MapsiftError>> {
        self.cause.as_ref()
    }
}

impl Display for MapsiftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MapsiftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for MapsiftError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for mapsift operations.
///
/// `MapsiftResult<T>` is shorthand for `Result<T, MapsiftError>`.
/// All fallible mapsift operations return this type.
pub type MapsiftResult<T> = Result<T, MapsiftError>;

// From trait implementations for automatic error conversion
impl From<serde_json::Error> for MapsiftError {
    fn from(err: serde_json::Error) -> Self {
        MapsiftError::new(
            &format!("JSON error: {}", err),
            ErrorKind::DecodeError,
        )
    }
}

impl From<std::str::Utf8Error> for MapsiftError {
    fn from(err: std::str::Utf8Error) -> Self {
        MapsiftError::new(
            &format!("UTF-8 error: {}", err),
            ErrorKind::DecodeError,
        )
    }
}

impl From<std::string::FromUtf8Error> for MapsiftError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        MapsiftError::new(
            &format!("UTF-8 error: {}", err),
            ErrorKind::DecodeError,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_new() {
        let err = MapsiftError::new("test error", ErrorKind::DecodeError);
        assert_eq!(err.message(), "test error");
        assert_eq!(err.kind(), &ErrorKind::DecodeError);
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_error_with_cause() {
        let cause = MapsiftError::new("inner", ErrorKind::DecodeError);
        let err = MapsiftError::new_with_cause("outer", ErrorKind::CompileError, cause);
        assert_eq!(err.message(), "outer");
        assert_eq!(err.kind(), &ErrorKind::CompileError);
        assert_eq!(err.cause().unwrap().message(), "inner");
    }

    #[test]
    fn test_error_display() {
        let err = MapsiftError::new("something broke", ErrorKind::InternalError);
        assert_eq!(format!("{}", err), "something broke");
    }

    #[test]
    fn test_error_source_chain() {
        let cause = MapsiftError::new("inner", ErrorKind::DecodeError);
        let err = MapsiftError::new_with_cause("outer", ErrorKind::DecodeError, cause);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(format!("{}", source), "inner");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: MapsiftError = json_err.into();
        assert_eq!(err.kind(), &ErrorKind::DecodeError);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", ErrorKind::DecodeError), "Decode error");
        assert_eq!(format!("{}", ErrorKind::InvalidClause), "Invalid clause");
    }
}
