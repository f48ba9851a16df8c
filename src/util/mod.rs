//! Shared utility helpers.

pub mod error;

pub use error::{NmsError, Result as NmsResult};

/// Checks that the box and score slices pair up one to one.
pub(crate) fn check_lengths(boxes: usize, scores: usize) -> NmsResult<()> {
    if boxes != scores {
        return Err(NmsError::InputMismatch { boxes, scores });
    }
    Ok(())
}
