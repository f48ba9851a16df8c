//! Error types for adaptnms.

use thiserror::Error;

/// Result alias for adaptnms operations.
pub type Result<T> = std::result::Result<T, NmsError>;

/// Errors that can occur when running suppression strategies.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NmsError {
    /// Box and score slices have different lengths.
    #[error("input length mismatch: {boxes} boxes vs {scores} scores")]
    InputMismatch { boxes: usize, scores: usize },
    /// Dispatch was attempted before a successful `init`.
    #[error("dispatcher is not initialized")]
    NotInitialized,
    /// The call size exceeds the size the routing table was built for.
    #[error("input size {size} exceeds the initialized maximum {max}")]
    SizeExceeded { size: usize, max: usize },
    /// The requested maximum size is too small to calibrate against.
    #[error("max size {requested} is below the minimum viable size {minimum}")]
    InitializationTooSmall { requested: usize, minimum: usize },
    /// A strategy could not be initialized and was left out.
    #[error("strategy `{name}` is unavailable: {reason}")]
    StrategyUnavailable { name: &'static str, reason: String },
    /// Every candidate strategy failed to initialize.
    #[error("no suppression strategy could be initialized")]
    NoStrategyAvailable,
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {reason}")]
    WorkerSpawn { reason: String },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
