use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three synchronized representations of one rendered report.
///
/// `markdown` is `None` for HTML-authored templates, which have no Markdown form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    pub text: String,
    pub markdown: Option<String>,
    pub html: String,
}

impl RenderedReport {
    /// Placeholder trio returned when the requested template slug does not exist.
    pub fn not_found() -> Self {
        RenderedReport {
            text: "Template not found.".to_string(),
            markdown: None,
            html: "<p>Template not found.</p>".to_string(),
        }
    }
}

/// JSON envelope shared by every report endpoint.
///
/// User-facing problems (missing fields, no data for the selection) are carried
/// as `Failed { error }` with a `200 OK`, never as an HTTP error status. A
/// validation failure also repeats the request's inputs next to the error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportResponse<T> {
    Rendered {
        #[serde(flatten)]
        summary: T,
        report: String,
        report_markdown: Option<String>,
        report_html: Option<String>,
        error: String,
    },
    Failed {
        #[serde(flatten)]
        inputs: Map<String, Value>,
        error: String,
    },
}

impl<T> ReportResponse<T> {
    pub fn rendered(summary: T, rendered: RenderedReport) -> Self {
        ReportResponse::Rendered {
            summary,
            report: rendered.text,
            report_markdown: rendered.markdown,
            report_html: Some(rendered.html),
            error: String::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::failed_with(Map::new(), error)
    }

    pub fn failed_with(inputs: Map<String, Value>, error: impl Into<String>) -> Self {
        ReportResponse::Failed {
            inputs,
            error: error.into(),
        }
    }

    /// The user-facing error, if this response carries one.
    pub fn error(&self) -> Option<&str> {
        match self {
            ReportResponse::Failed { error, .. } => Some(error),
            ReportResponse::Rendered { .. } => None,
        }
    }
}

/// Echo of a global analysis selection plus its headline numbers.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalAnalysisSummary {
    pub platform: String,
    pub year_month: String,
    pub title: String,
    pub total_content: i64,
    pub total_views: i64,
    pub avg_engagement: f64,
    pub top_hashtag: String,
    pub top_country: String,
    pub top_countries: Vec<NamedViews>,
    pub categories: Vec<NamedViews>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedViews {
    pub name: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HashtagSummary {
    pub platform: String,
    pub country_code: String,
    pub min_views: i64,
    pub hashtag_count: usize,
    pub hashtags: Vec<NamedViews>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub platform: String,
    pub country_code: String,
    pub start_date: String,
    pub end_date: String,
    pub top_trend_type: String,
    pub trend_types: Vec<NamedViews>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBreakdown {
    pub tier: String,
    pub views: i64,
    pub pct: f64,
    pub content_count: i64,
    pub avg_views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyViews {
    pub month: String,
    pub views: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatorPerformanceSummary {
    pub platform: String,
    pub creator_scope: String,
    pub time_frame: String,
    pub total_views: i64,
    pub tiers: Vec<TierBreakdown>,
    pub monthly_trend: Vec<MonthlyViews>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEngagement {
    pub category: String,
    pub engagement: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionRecommendationSummary {
    pub region: String,
    pub tiktok_top: Vec<CategoryEngagement>,
    pub youtube_top: Vec<CategoryEngagement>,
    pub best_platform: String,
    pub best_category: String,
}

/// Per-platform figures used by the platform dominance comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformFigures {
    pub total_videos: i64,
    pub total_views: i64,
    pub median_engagement_rate_pct: f64,
    pub avg_engagement_per_1k: f64,
    pub quality_score: f64,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformDominanceSummary {
    pub country_code: String,
    pub country_name: String,
    pub tiktok: PlatformFigures,
    pub youtube: PlatformFigures,
    pub quantity_leader: String,
    pub quality_leader: String,
    pub dominant_platform: String,
}

/// Engagement of one time bucket (hour, day part, weekday).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingBucket {
    pub label: String,
    pub engagement_rate: f64,
    pub eng_diff_pct: f64,
    pub content_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishTimingSummary {
    pub platform: String,
    pub time_analysis: String,
    pub period_display: String,
    pub avg_eng_total: f64,
    pub buckets: Vec<TimingBucket>,
}
