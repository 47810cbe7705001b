//! The time window an event request covers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Start and end of the booked engagement. Invariant: `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl RequestWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        validate_window(start, end)?;
        Ok(Self { start, end })
    }
}

/// Reject windows whose end is not strictly after their start.
pub fn validate_window(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if end <= start {
        return Err(CoreError::Validation(format!(
            "End date/time ({end}) must be after start date/time ({start})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> Timestamp {
        chrono::Utc
            .with_ymd_and_hms(2025, 1, 1, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = RequestWindow::new(at(18, 0), at(17, 0));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(validate_window(at(18, 0), at(18, 0)).is_err());
    }

    #[test]
    fn forward_window_is_accepted() {
        let window = RequestWindow::new(at(17, 0), at(18, 30)).unwrap();
        assert!(window.end > window.start);
    }
}
