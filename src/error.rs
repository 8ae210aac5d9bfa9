//! Unified error type.

use std::fmt;

/// The error type returned by madhatter's fallible operations.
///
/// Handlers never return errors: a failed request is a status written to the
/// [`ResponseWriter`](crate::ResponseWriter). This type surfaces
/// infrastructure failures (binding a port, accepting a connection) and the
/// reason a [`Context`](crate::Context) is done.
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure in the server.
    Io(std::io::Error),
    /// The context was cancelled, normally because its request finished.
    Canceled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)    => write!(f, "io: {e}"),
            Self::Canceled => f.write_str("context canceled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e)    => Some(e),
            Self::Canceled => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
