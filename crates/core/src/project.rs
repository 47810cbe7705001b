//! Project naming rules.

use crate::error::CoreError;

pub const MAX_PROJECT_NAME_LENGTH: usize = 100;

/// Trim and validate a project name, returning the stored form.
pub fn normalize_project_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Project name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Project name exceeds maximum length of {MAX_PROJECT_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Key used for per-user uniqueness: names differing only in case collide.
pub fn project_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
