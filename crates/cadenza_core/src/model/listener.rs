//! Listener-side entities: registered users and their track reviews.
//!
//! # Invariants
//! - User names are stored trimmed and lowercased; lookups are
//!   case-insensitive as a consequence.
//! - `password_hash` never holds a plaintext password.
//! - Review ratings stay within `MIN_RATING..=MAX_RATING`.

use crate::model::catalog::TrackId;
use crate::model::validation::{require_text, ModelValidationError, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};

pub type UserId = u32;

/// Registered listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned id, starting at 1.
    pub id: UserId,
    pub user_name: String,
    pub password_hash: String,
}

/// Write model for user registration; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(user_name: &str, password_hash: impl Into<String>) -> Self {
        Self {
            user_name: normalize_user_name(user_name),
            password_hash: password_hash.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.user_name, "user", "user_name")?;
        require_text(&self.password_hash, "user", "password_hash")
    }

    /// Builds the persisted user once the backend has chosen an id.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            user_name: self.user_name,
            password_hash: self.password_hash,
        }
    }
}

/// Normalizes a user name for storage and lookup.
pub fn normalize_user_name(user_name: &str) -> String {
    user_name.trim().to_lowercase()
}

/// Listener review attached to one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub track_id: TrackId,
    pub review_text: String,
    pub rating: u8,
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
}

impl Review {
    pub fn new(
        track_id: TrackId,
        review_text: impl Into<String>,
        rating: u8,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            track_id,
            review_text: review_text.into().trim().to_string(),
            rating,
            timestamp_ms,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.review_text, "review", "review_text")?;
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ModelValidationError::RatingOutOfRange(self.rating));
        }
        Ok(())
    }
}
