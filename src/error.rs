use thiserror::Error;

/// A result type defaulting to [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `permafrost` can emit.
///
/// The generator itself is infallible: issuing an identifier is a single
/// atomic increment. Every failure surfaces from the checkpoint store,
/// either while loading the resume point at construction or while durably
/// recording an issued value.
///
/// Persistence failures are never retried internally. Retrying silently
/// could mask prolonged storage unavailability, so the decision is left to
/// the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The checkpoint store could not durably read or write its slot.
    ///
    /// When returned from `next_id`, the in-memory register has already
    /// advanced: the identifier is burned and will not be reissued, but it
    /// was never handed to the caller either.
    #[error("checkpoint persistence failed: {0}")]
    Persistence(#[from] std::io::Error),
}
