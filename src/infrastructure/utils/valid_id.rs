use crate::{constants::STORAGE_ID_PATTERN, errors::AppError};

/// Validates a caller-chosen id that becomes a file name under a storage root.
pub fn valid_storage_id(id: &str) -> Result<&str, AppError> {
    if STORAGE_ID_PATTERN.is_match(id) {
        Ok(id)
    } else {
        Err(AppError::InvalidInput(
            "Id must be 1-128 characters of letters, digits, '-' or '_'".to_string()
        ))
    }
}

/// Looser check for asset ids, which may name legacy files the store never
/// generated. Anything that could walk out of the asset root is refused.
pub fn is_plain_file_stem(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
}
