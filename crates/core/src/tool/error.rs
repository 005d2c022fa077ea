use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No tool with the requested name is registered.
    UnknownFunction,
    /// The call passed argument names the tool doesn't accept.
    InvalidArguments,
    /// Error occurred while executing the tool.
    ExecutionError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnknownFunction => write!(f, "Unknown function"),
            ErrorKind::InvalidArguments => write!(f, "Invalid arguments"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
        }
    }
}

/// Error returned by a tool that failed while running.
///
/// The executor reports it as an [`ErrorKind::ExecutionError`] with the
/// reason as the cause. Unknown functions and rejected arguments are
/// detected before a tool runs, so tools can't produce those kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    reason: Option<String>,
}

impl Error {
    /// Creates a new error without a reason.
    #[inline]
    pub fn execution_error() -> Self {
        Self { reason: None }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(ErrorKind::ExecutionError.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_falls_back_to_kind() {
        let err = Error::execution_error();
        assert_eq!(err.reason(), "Execution error");

        let err = err.with_reason("disk full");
        assert_eq!(err.to_string(), "disk full");
    }
}
