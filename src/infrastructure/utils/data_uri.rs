use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{entities::asset::ImageData, errors::AppError};

/// Turns caller-supplied image data into raw bytes.
///
/// A `data:<mime>;base64,` prefix is stripped when present; textual input
/// without one is treated as bare base64.
pub fn decode_image_data(data: ImageData) -> Result<Vec<u8>, AppError> {
    let bytes = match data {
        ImageData::Bytes(bytes) => bytes,
        ImageData::DataUri(text) => {
            let encoded = strip_data_uri_prefix(text.trim());
            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD.decode(compact)?
        }
    };

    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Image data is empty".into()));
    }

    Ok(bytes)
}

fn strip_data_uri_prefix(text: &str) -> &str {
    match text.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((_header, payload)) => payload,
        None => text,
    }
}
