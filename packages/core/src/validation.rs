// ABOUTME: Input validation helpers shared across Taskboard packages
// ABOUTME: Name validation rules for tasks and buckets

/// Maximum length for task and bucket names
pub const NAME_MAX_LEN: usize = 120;

/// Validation error for user-supplied data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates a task or bucket name: non-blank, bounded length
pub fn validate_name(field: &str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new(field, "Name can't be empty"));
    }

    if name.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::new(
            field,
            format!("Name is longer than {} characters", NAME_MAX_LEN),
        ));
    }

    Ok(())
}
