use serde::{Deserialize, Deserializer};
use validator::ValidationError;

pub mod folder;
pub mod task;
pub mod user;

/// Rejects values which are empty or only whitespace
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }

    Ok(())
}

/// Reads a text field with surrounding whitespace removed, so length limits apply to what
/// gets stored
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;

    Ok(raw.trim().to_owned())
}
