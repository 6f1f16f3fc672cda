use thiserror::Error;

/// Errors returned by fallible index operations.
///
/// Looking up or removing a key that is not present is not an error; the only
/// failure an operation can report is exhaustion of the node arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// The node arena cannot allocate the nodes the operation would need.
    #[error("node arena is at maximum capacity")]
    OutOfMemory,
}

/// Convenience alias for `Result` with this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
