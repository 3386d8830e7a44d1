//! Process exit status of one-shot commands
//!
//! Scripts can tell a missing object from a refused confirmation or a store
//! outage by the status alone.

use s3c_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Anything without a more specific code, including local IO failures
    GeneralError = 1,

    /// Missing or excess arguments, bad names, unusable settings
    UsageError = 2,

    /// The object store rejected a request or could not be reached
    StoreError = 3,

    /// Bucket, object or saved environment does not exist
    NotFound = 5,

    /// The target exists already, has the wrong kind, or the session state forbids the command
    Conflict = 6,

    /// A confirmation was declined or input ended early
    Aborted = 130,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Argument(_)
            | Error::Config(_)
            | Error::InvalidEnvironment(_)
            | Error::InvalidUrl(_) => Self::UsageError,
            Error::Store(_) => Self::StoreError,
            Error::NotFound(_) => Self::NotFound,
            Error::Conflict(_)
            | Error::PreconditionFailed(_)
            | Error::NotADirectory(_)
            | Error::IsADirectory(_) => Self::Conflict,
            Error::Aborted(_) => Self::Aborted,
            Error::Io(_) | Error::TomlParse(_) | Error::Json(_) => Self::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(err: Error) -> i32 {
        ExitCode::from(&err).as_i32()
    }

    #[test]
    fn test_error_kinds_map_to_status() {
        assert_eq!(code(Error::Argument("too many arguments".into())), 2);
        assert_eq!(code(Error::InvalidEnvironment("a/b".into())), 2);
        assert_eq!(code(Error::store("list", "connection refused")), 3);
        assert_eq!(code(Error::NotFound("bucket".into())), 5);
        assert_eq!(code(Error::Conflict("exists".into())), 6);
        assert_eq!(code(Error::PreconditionFailed("no bucket".into())), 6);
        assert_eq!(code(Error::IsADirectory("docs".into())), 6);
        assert_eq!(code(Error::Aborted("declined".into())), 130);
        assert_eq!(code(Error::Io(std::io::Error::other("disk"))), 1);
    }
}
