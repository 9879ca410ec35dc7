//! Validation errors raised by domain entities.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest accepted review rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted review rating.
pub const MAX_RATING: u8 = 5;

/// Domain-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required text field is empty after trimming.
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    /// Review rating outside `MIN_RATING..=MAX_RATING`.
    RatingOutOfRange(u8),
    /// Track genre list references the same genre twice.
    DuplicateGenre(u32),
    /// Playlist lists the same track twice.
    DuplicatePlaylistTrack(u32),
    /// Random playlist requested with zero tracks.
    EmptyRandomPlaylist,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => write!(f, "{entity}.{field} must not be empty"),
            Self::RatingOutOfRange(rating) => write!(
                f,
                "rating {rating} is out of range {MIN_RATING}..={MAX_RATING}"
            ),
            Self::DuplicateGenre(id) => write!(f, "genre {id} is listed more than once"),
            Self::DuplicatePlaylistTrack(id) => {
                write!(f, "track {id} appears more than once in playlist")
            }
            Self::EmptyRandomPlaylist => write!(f, "random playlist length must be at least 1"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(
    value: &str,
    entity: &'static str,
    field: &'static str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField { entity, field });
    }
    Ok(())
}
