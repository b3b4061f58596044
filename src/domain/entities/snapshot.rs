use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;

// ───── Draft Shapes ─────────────────────────────────────────────────
//
// Draft shapes evolve with the editor, so every field is lenient and unknown
// keys are carried through untouched in `extra`.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDraft {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An image in the workspace: either a stored asset or an inline URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDraft {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposedDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image_ids: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub text_drafts: Vec<TextDraft>,
    #[serde(default)]
    pub image_drafts: Vec<ImageDraft>,
    #[serde(default)]
    pub composed_draft: Option<ComposedDraft>,
}

// ───── Domain Models ─────────────────────────────────────────────────

/// A versioned capture of one authoring workspace. Writing an existing `id`
/// replaces every field at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub is_manual_save: bool,
    pub payload: SnapshotPayload,
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
    pub is_manual_save: bool,
    pub payload: Json<Value>,
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = serde_json::Error;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let payload = serde_json::from_value(row.payload.0)?;

        Ok(Snapshot {
            id: row.id,
            timestamp: row.timestamp,
            owner_id: row.owner_id,
            conversation_id: row.conversation_id,
            is_manual_save: row.is_manual_save,
            payload,
        })
    }
}

// ───── Queries ───────────────────────────────────────────────────────

/// AND-combined snapshot filter. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotQuery {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default, alias = "chat_id")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub only_manual: bool,
}

impl SnapshotQuery {
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        self.id.as_ref().is_none_or(|id| &snapshot.id == id)
            && self.owner_id.as_ref()
                .is_none_or(|owner| snapshot.owner_id.as_ref() == Some(owner))
            && self.conversation_id.as_ref()
                .is_none_or(|conversation| snapshot.conversation_id.as_ref() == Some(conversation))
            && (!self.only_manual || snapshot.is_manual_save)
    }
}

/// Which snapshots a bulk clear removes.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearScope {
    Owner(String),
    /// System-wide. Only the admin surface constructs this.
    Everything,
}

// ───── API Request Models ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveSnapshotRequest {
    #[serde(default)]
    pub text_drafts: Vec<TextDraft>,
    #[serde(default)]
    pub image_drafts: Vec<ImageDraft>,
    #[serde(default)]
    pub composed_draft: Option<ComposedDraft>,
    #[serde(default, alias = "conversation_id")]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub is_manual_save: bool,
}
