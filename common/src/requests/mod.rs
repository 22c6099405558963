//! Request payloads of the report and dataset endpoints.
//!
//! Fields are optional on purpose: the handlers answer a missing input with a
//! user-facing `{ "error": ... }` message instead of a deserialization failure.

use crate::model::context::ReportContext;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct GlobalAnalysisRequest {
    pub platform: Option<String>,
    pub year_month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HashtagReportRequest {
    pub platform: Option<String>,
    pub country_code: Option<String>,
    /// Accepted as a JSON number or a numeric string.
    pub min_views: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendReportRequest {
    pub platform: Option<String>,
    pub country_code: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatorPerformanceRequest {
    pub platform: Option<String>,
    pub creator_scope: Option<String>,
    pub start_month: Option<String>,
    pub end_month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionRecommendationRequest {
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlatformDominanceRequest {
    pub country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishTimingRequest {
    pub platform: Option<String>,
    pub time_analysis: Option<String>,
    pub period: Option<String>,
    pub start_month: Option<String>,
    pub end_month: Option<String>,
}

/// Body of `POST /api/templates/{slug}/preview`.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub context: ReportContext,
}

/// Body of `POST /api/dataset/reseed`. Without `csv_path` the configured dataset file is used.
#[derive(Debug, Default, Deserialize)]
pub struct ReseedRequest {
    pub csv_path: Option<String>,
}
