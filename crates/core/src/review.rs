//! Post-engagement rating rules.

use crate::error::CoreError;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Maximum length of a rating message.
pub const MAX_REVIEW_MESSAGE_LENGTH: usize = 2_000;

/// Validate a rating and its message. The message must carry some text.
pub fn validate_review(rating: i16, message: &str) -> Result<(), CoreError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    if message.trim().is_empty() {
        return Err(CoreError::Validation(
            "Review message must not be blank".to_string(),
        ));
    }
    if message.chars().count() > MAX_REVIEW_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Review message exceeds maximum length of {MAX_REVIEW_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Arithmetic mean of `ratings`, rounded to one decimal place.
/// Returns 0.0 for an empty set (an unrated vendor).
pub fn aggregate_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: f64 = ratings.iter().map(|r| f64::from(*r)).sum();
    let mean = sum / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// A review is complete when both a rating and a non-empty message exist.
pub fn is_reviewed(rating: Option<i16>, message: Option<&str>) -> bool {
    rating.is_some() && message.is_some_and(|m| !m.trim().is_empty())
}
