use std::io;

/// The error taxonomy produced by this crate.
///
/// Every fallible operation returns one of these variants rather than a bare
/// `io::Error`; the OS error, where one exists, is preserved as the source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Memory could not be obtained. No state was changed.
    #[error("allocation failed")]
    AllocFailure,

    /// The endpoint is already present in the selector's map.
    #[error("endpoint already registered")]
    AlreadyRegistered,

    /// The endpoint was not found in the selector's map.
    #[error("endpoint not registered")]
    NotRegistered,

    /// The selector has been closed; the operation was rejected.
    #[error("selector is closed")]
    SelectorClosed,

    /// The monitor has been closed; the operation was rejected.
    #[error("monitor is closed")]
    MonitorClosed,

    /// The OS readiness backend refused a registration or interest change.
    #[error("backend rejected the request: {0}")]
    BackendRejection(#[source] io::Error),

    /// The OS multiplexer call itself returned an error; the wait yielded
    /// zero ready monitors.
    #[error("wait failed: {0}")]
    WaitFailure(#[source] io::Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::BackendRejection(e) | Error::WaitFailure(e) => e,
            Error::AllocFailure => io::Error::new(io::ErrorKind::OutOfMemory, err.to_string()),
            Error::AlreadyRegistered | Error::NotRegistered => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            Error::SelectorClosed | Error::MonitorClosed => {
                io::Error::new(io::ErrorKind::Other, err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
