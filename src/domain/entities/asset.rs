use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use validator::Validate;

// ───── Constants ──────────────────────────────────────────────────────
const MAX_TITLE_LENGTH: u64 = 255;
const MAX_PROMPT_LENGTH: u64 = 8_000;
const MAX_MODEL_ID_LENGTH: u64 = 128;
const MAX_SCOPE_ID_LENGTH: u64 = 128;
const MAX_DIMENSION: i32 = 16_384;

// ───── Domain Models ─────────────────────────────────────────────────

/// One generated image plus its provenance.
///
/// `file_path` is relative to the asset root and always names an existing
/// file while the record exists.
/// `created_at` carries microsecond precision, the finest both backends keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
    pub title: String,
    pub prompt: Option<String>,
    pub model_id: String,
    pub file_path: String,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct AssetRow {
    pub id: String,
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
    pub title: String,
    pub prompt: Option<String>,
    pub model_id: String,
    pub file_path: String,
    pub width: i32,
    pub height: i32,
    pub meta: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: row.id,
            owner_id: row.owner_id,
            conversation_id: row.conversation_id,
            title: row.title,
            prompt: row.prompt,
            model_id: row.model_id,
            file_path: row.file_path,
            width: row.width,
            height: row.height,
            created_at: row.created_at,
            meta: row.meta.0,
        }
    }
}

// ───── Request Models ────────────────────────────────────────────────

/// Caller-declared metadata accompanying a new image. Dimensions are taken
/// as given; the pixel data is never inspected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewAssetMetadata {
    #[serde(default, alias = "user_id", alias = "userId")]
    #[validate(length(min = 1, max = MAX_SCOPE_ID_LENGTH))]
    pub owner_id: Option<String>,

    #[serde(default, alias = "chat_id", alias = "chatId")]
    #[validate(length(min = 1, max = MAX_SCOPE_ID_LENGTH))]
    pub conversation_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = MAX_TITLE_LENGTH))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = MAX_PROMPT_LENGTH))]
    pub prompt: Option<String>,

    #[serde(default, alias = "model")]
    #[validate(length(max = MAX_MODEL_ID_LENGTH))]
    pub model_id: String,

    #[validate(range(min = 0, max = MAX_DIMENSION))]
    pub width: i32,

    #[validate(range(min = 0, max = MAX_DIMENSION))]
    pub height: i32,

    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Either raw bytes or a textual data URI (`data:image/png;base64,...`).
#[derive(Debug, Clone)]
pub enum ImageData {
    Bytes(Vec<u8>),
    DataUri(String),
}

impl From<Vec<u8>> for ImageData {
    fn from(bytes: Vec<u8>) -> Self {
        ImageData::Bytes(bytes)
    }
}

impl From<String> for ImageData {
    fn from(text: String) -> Self {
        ImageData::DataUri(text)
    }
}

impl From<&str> for ImageData {
    fn from(text: &str) -> Self {
        ImageData::DataUri(text.to_string())
    }
}

/// Owner/conversation restriction for asset listings. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetFilter {
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
}

impl AssetFilter {
    pub fn new(owner_id: Option<&str>, conversation_id: Option<&str>) -> Self {
        AssetFilter {
            owner_id: owner_id.map(str::to_string),
            conversation_id: conversation_id.map(str::to_string),
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        let owner_ok = self.owner_id.as_ref()
            .is_none_or(|owner| asset.owner_id.as_ref() == Some(owner));
        let conversation_ok = self.conversation_id.as_ref()
            .is_none_or(|conversation| asset.conversation_id.as_ref() == Some(conversation));

        owner_ok && conversation_ok
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AssetResponse {
    #[serde(flatten)]
    pub asset: Asset,
    pub url: String,
}

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub files_before: usize,
    pub deleted: Vec<String>,
}
