use serde::{Deserialize, Serialize};

/// Payload of `POST /api/admin/content/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContent {
    pub content_id: String,
    pub platform: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub likes: Option<i64>,
    pub country_code: String,
    pub author_handle: String,
    #[serde(default)]
    pub creator_tier: Option<String>,
    /// `YYYY-MM-DD`; the first seven characters become `year_month`.
    #[serde(default)]
    pub publish_date: Option<String>,
}

/// Payload of `POST /api/admin/content/update`. Absent fields are left untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentUpdate {
    pub content_id: String,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentDelete {
    pub content_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminOutcome {
    pub success: bool,
    pub message: String,
}

/// One row of `GET /api/admin/content/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub content_id: String,
    pub platform: String,
    pub category: Option<String>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub country_code: Option<String>,
    pub author_handle: Option<String>,
    pub publish_date: Option<String>,
}

/// The first rows by `content_id` plus the total row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentListing {
    pub content: Vec<ContentRow>,
    pub total: i64,
}
