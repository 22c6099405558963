//! Built-in report queries and templates.
//!
//! They are inserted with `INSERT OR IGNORE`, so a slug edited through the admin
//! endpoints keeps its stored version across restarts.

use crate::db::{queries, templates};
use common::model::template::{ReportQuery, ReportTemplate, TemplateFormat, TemplateMetadata};
use rusqlite::Connection;

/// `(slug, sql_text, description)`.
///
/// `{tier_placeholders}` and `{date_filter}` are expanded by the report builders
/// before the statement is prepared.
const DEFAULT_QUERIES: &[(&str, &str, &str)] = &[
    (
        "global_summary",
        "SELECT COUNT(*) AS total_content, SUM(views) AS total_views, SUM(likes) AS total_likes,
                AVG(engagement_rate) AS avg_engagement
         FROM Content
         WHERE platform = ? AND year_month = ?",
        "Content count, views, likes and mean engagement for one platform and month",
    ),
    (
        "global_top_countries",
        "SELECT co.country_name, SUM(c.views) AS total_views
         FROM Content c
         JOIN Country co ON c.country_id = co.country_id
         WHERE c.platform = ? AND c.year_month = ?
         GROUP BY co.country_id
         ORDER BY total_views DESC
         LIMIT 5",
        "Five countries with the most views",
    ),
    (
        "global_top_hashtag",
        "SELECT hashtag, SUM(views) AS total_views
         FROM Content
         WHERE platform = ? AND year_month = ? AND hashtag IS NOT NULL AND hashtag <> ''
         GROUP BY hashtag
         ORDER BY total_views DESC
         LIMIT 1",
        "Most viewed hashtag",
    ),
    (
        "global_category_dist",
        "SELECT category, SUM(views) AS total_views
         FROM Content
         WHERE platform = ? AND year_month = ?
         GROUP BY category
         ORDER BY total_views DESC",
        "Views per category",
    ),
    (
        "hashtag_country_check",
        "SELECT country_id FROM Country WHERE country_code = ?",
        "Resolve a country code for the hashtag report",
    ),
    (
        "hashtag_main",
        "SELECT hashtag, SUM(views) AS total_views
         FROM Content
         WHERE platform = ? AND country_id = ? AND hashtag IS NOT NULL AND hashtag <> ''
         GROUP BY hashtag
         HAVING SUM(views) > ?
         ORDER BY total_views DESC",
        "Hashtags above a view threshold",
    ),
    (
        "trend_country_check",
        "SELECT country_id FROM Country WHERE country_code = ?",
        "Resolve a country code for the trend report",
    ),
    (
        "trend_main",
        "SELECT t.trend_type, SUM(c.views) AS total_views
         FROM Content c
         JOIN Trend t ON c.trend_id = t.trend_id
         WHERE c.platform = ? AND c.country_id = ? AND c.publish_date_approx BETWEEN ? AND ?
         GROUP BY t.trend_type
         ORDER BY total_views DESC",
        "Views per trend type in a date range",
    ),
    (
        "creator_total_views",
        "SELECT SUM(views) FROM Content WHERE platform = ? AND year_month BETWEEN ? AND ?",
        "Total views for a platform over a month range",
    ),
    (
        "creator_tier_agg",
        "SELECT a.creator_tier, SUM(c.views) AS total_views, COUNT(*) AS content_count
         FROM Content c
         JOIN Author a ON c.author_id = a.author_id
         WHERE c.platform = ? AND a.creator_tier IN ({tier_placeholders}) AND c.year_month BETWEEN ? AND ?
         GROUP BY a.creator_tier
         ORDER BY total_views DESC",
        "Views and content count per creator tier",
    ),
    (
        "creator_monthly_trend",
        "SELECT c.year_month, SUM(c.views) AS total_views, COUNT(*) AS content_count
         FROM Content c
         JOIN Author a ON c.author_id = a.author_id
         WHERE c.platform = ? AND a.creator_tier = ? AND c.year_month BETWEEN ? AND ?
         GROUP BY c.year_month
         ORDER BY c.year_month",
        "Monthly views for a single creator tier",
    ),
    (
        "region_engagement_main",
        "SELECT c.platform, c.category, AVG(c.engagement_total) AS avg_engagement
         FROM Content c
         JOIN Country co ON c.country_id = co.country_id
         WHERE co.region = ?
         GROUP BY c.platform, c.category
         ORDER BY c.platform, avg_engagement DESC",
        "Mean engagement per platform and category in a region",
    ),
    (
        "pd_country_check",
        "SELECT country_id, country_name FROM Country WHERE country_code = ?",
        "Resolve a country code for platform dominance",
    ),
    (
        "pd_agg_by_country",
        "SELECT platform, COUNT(*), SUM(views), AVG(engagement_rate), AVG(engagement_per_1k),
                AVG(likes), AVG(comments), AVG(shares), AVG(completion_rate)
         FROM Content
         WHERE country_id = ?
         GROUP BY platform
         ORDER BY platform",
        "Per-platform aggregates in a country",
    ),
    (
        "pd_details_by_country",
        "SELECT platform, engagement_rate, engagement_per_1k, likes, comments, shares, completion_rate
         FROM Content
         WHERE country_id = ?",
        "Per-content metrics in a country, used for medians",
    ),
    (
        "publish_timing_hourly",
        "SELECT d.upload_hour, AVG(c.engagement_rate), MAX(c.engagement_rate), MIN(c.engagement_rate),
                SUM(c.views), AVG(c.completion_rate), COUNT(*)
         FROM Content c
         JOIN Device d ON c.device_id = d.device_id
         WHERE c.platform = ?{date_filter}
         GROUP BY d.upload_hour
         ORDER BY d.upload_hour",
        "Engagement per upload hour",
    ),
    (
        "publish_timing_dayparts",
        "SELECT c.publish_period, AVG(c.engagement_rate), COUNT(*)
         FROM Content c
         WHERE c.platform = ? AND c.publish_period IS NOT NULL{date_filter}
         GROUP BY c.publish_period
         ORDER BY c.publish_period",
        "Engagement per day part",
    ),
    (
        "publish_timing_week",
        "SELECT c.publish_dayofweek, AVG(c.engagement_rate), COUNT(*)
         FROM Content c
         WHERE c.platform = ? AND c.publish_dayofweek IS NOT NULL{date_filter}
         GROUP BY c.publish_dayofweek
         ORDER BY CASE c.publish_dayofweek
             WHEN 'Monday' THEN 1 WHEN 'Tuesday' THEN 2 WHEN 'Wednesday' THEN 3
             WHEN 'Thursday' THEN 4 WHEN 'Friday' THEN 5 WHEN 'Saturday' THEN 6
             WHEN 'Sunday' THEN 7 ELSE 8 END",
        "Engagement per weekday",
    ),
];

const GLOBAL_ANALYSIS: &str = "\
## {{ platform }} overview for {{ year_month }}

{{ platform }} published **{{ total_content | format_comma }}** pieces of content in {{ year_month }}, reaching **{{ total_views | format_comma }}** views with an average engagement rate of **{{ (avg_engagement * 100) | round(2) }}%**.
{% if country_list_text %}
Top countries by views: {{ country_list_text }}.
{% endif %}
**{{ top_country }}** accounted for {{ top_country_pct | round(1) }}% of all views, and the most viewed hashtag was **{{ top_hashtag }}**.";

const HASHTAG_REPORT: &str = "\
On {{ platform }} in {{ country_code }}, {{ hashtag_count | format_comma }} hashtag{{ '' if hashtag_count == 1 else 's' }} passed **{{ min_views | format_comma }}** total views.
Top hashtags: {{ hashtag_list_text }}.";

const TREND_REPORT: &str = "\
Between {{ start_date }} and {{ end_date }}, **{{ top_trend_type }}** trends drew the most views on {{ platform }} in {{ country_code }}.
{% if trend_count > 1 %}
Views across {{ trend_count }} trend types: {{ trend_list_text }}.
{% else %}
It was the only trend type recorded: {{ trend_list_text }}.
{% endif %}";

const CREATOR_PERFORMANCE: &str = "\
From {{ time_frame }}, {{ platform }} content for **{{ creator_scope }}** drew **{{ total_views | format_comma }}** views in total.
{% for tier in tier_details %}
- **{{ tier.tier }}** creators: {{ tier.views | format_comma }} views ({{ tier.pct }}%), {{ tier.content_count | format_comma }} posts, {{ tier.avg_views | format_comma }} views per post
{% else %}
No creator tier data is available for this selection.
{% endfor %}";

const REGION_AD_RECOMMENDATION: &str = "\
<p>In <strong>{{ region }}</strong>, TikTok audiences engage most with <strong>{{ category_tiktok }}</strong> ({{ engagement_tiktok | format_comma }} interactions per post){{ tiktok_followed_by_text }}.</p>
<p>On YouTube the leading category is <strong>{{ category_youtube }}</strong> ({{ engagement_youtube | format_comma }} interactions per post){{ youtube_followed_by_text }}.</p>
{% if best_platform %}
<p>Recommendation: run ads on <strong>{{ best_platform }}</strong> next to <strong>{{ best_category }}</strong> content, which leads the other platform by {{ (best_engagement - comparison_engagement) | format_comma }} interactions per post.</p>
{% endif %}";

const PLATFORM_DOMINANCE: &str = "\
### Platform dominance in {{ country_name }}

- Volume: TikTok has **{{ tiktok_videos | format_comma }}** videos ({{ tiktok_views | format_comma }} views) and YouTube **{{ youtube_videos | format_comma }}** ({{ youtube_views | format_comma }} views). **{{ quantity_leader }}** leads by {{ videos_diff | format_comma }} videos.
- Quality: median engagement rate {{ tiktok_median_er }}% on TikTok vs {{ youtube_median_er }}% on YouTube, engagement per 1k views {{ tiktok_e1k }} vs {{ youtube_e1k }}. **{{ quality_leader }}** leads on quality.
- Overall, **{{ dominant_platform }}** is the dominant platform in {{ country_name }}.";

const PUBLISH_TIMING: &str = "\
{{ platform }} publish timing by {{ time_analysis | lower }} ({{ period_display }}): the average engagement rate is **{{ avg_eng_total }}%**.
{% if time_analysis == 'Hourly' %}
The peak hour is **{{ peak_hour }}:00** at {{ peak_eng_rate }}% ({{ '%+.1f' | format(peak_diff_pct) }}% vs average) and the weakest is {{ valley_hour }}:00 at {{ valley_eng_rate }}% ({{ '%+.1f' | format(valley_diff_pct) }}%).
The strongest segment is **{{ best_segment }}** ({{ '%+.1f' | format(best_segment_diff) }}%).
{% for segment in segment_data %}
- {{ segment.name }}: {{ segment.eng }}% ({{ '%+.1f' | format(segment.diff) }}%)
{% endfor %}
{% elif time_analysis == 'Day Parts' %}
**{{ best_period_name }}** performs best at {{ best_period_eng }}% ({{ '%+.1f' | format(best_period_diff) }}%, {{ best_period_count | format_comma }} posts); **{{ worst_period_name }}** trails at {{ worst_period_eng }}% ({{ '%+.1f' | format(worst_period_diff) }}%).
{% for period in top3_periods %}
{{ loop.index }}. {{ period.name }} ({{ '%+.1f' | format(period.diff) }}%)
{% endfor %}
{% else %}
**{{ best_day_name }}** performs best at {{ best_day_eng }}% ({{ '%+.1f' | format(best_day_diff) }}%) and **{{ worst_day_name }}** worst at {{ worst_day_eng }}% ({{ '%+.1f' | format(worst_day_diff) }}%).
Weekends average {{ weekend_eng }}% against {{ weekday_eng }}% on weekdays, a lift of {{ '%+.1f' | format(weekend_lift) }}%.
{% for day in top3_days %}
{{ loop.index }}. {{ day.name }} ({{ '%+.1f' | format(day.diff) }}%)
{% endfor %}
{% endif %}";

pub fn default_queries() -> Vec<ReportQuery> {
    DEFAULT_QUERIES
        .iter()
        .map(|(slug, sql, description)| ReportQuery {
            slug: slug.to_string(),
            sql_text: sql.to_string(),
            description: Some(description.to_string()),
        })
        .collect()
}

pub fn default_templates() -> Vec<ReportTemplate> {
    vec![
        template(
            "global_analysis",
            "Global analysis",
            TemplateFormat::Markdown,
            GLOBAL_ANALYSIS,
            &["platform", "year_month", "total_views", "total_content", "top_country", "top_hashtag"],
        ),
        template(
            "hashtag_report",
            "Hashtag report",
            TemplateFormat::Text,
            HASHTAG_REPORT,
            &["platform", "country_code", "hashtag_count", "hashtag_list_text"],
        ),
        template(
            "trend_report",
            "Trend type report",
            TemplateFormat::Markdown,
            TREND_REPORT,
            &["platform", "country_code", "start_date", "end_date", "top_trend_type", "trend_list_text"],
        ),
        template(
            "creator_performance",
            "Creator tier performance",
            TemplateFormat::Markdown,
            CREATOR_PERFORMANCE,
            &["platform", "creator_scope", "time_frame", "tier_details"],
        ),
        template(
            "region_ad_recommendation",
            "Regional ad recommendation",
            TemplateFormat::Html,
            REGION_AD_RECOMMENDATION,
            &["region", "category_tiktok", "category_youtube", "best_platform"],
        ),
        template(
            "platform_dominance_extended",
            "Platform dominance",
            TemplateFormat::Markdown,
            PLATFORM_DOMINANCE,
            &["country_name", "tiktok_videos", "youtube_videos", "quantity_leader", "quality_leader", "dominant_platform"],
        ),
        template(
            "publish_timing_analysis",
            "Publish timing analysis",
            TemplateFormat::Markdown,
            PUBLISH_TIMING,
            &["platform", "time_analysis", "period_display", "avg_eng_total"],
        ),
    ]
}

fn template(
    slug: &str,
    name: &str,
    format: TemplateFormat,
    content: &str,
    fields: &[&str],
) -> ReportTemplate {
    ReportTemplate {
        slug: slug.to_string(),
        name: name.to_string(),
        format,
        content: content.to_string(),
        metadata: TemplateMetadata {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        },
    }
}

/// Inserts every default whose slug is not stored yet.
/// Returns how many queries and templates were added.
pub fn seed(conn: &Connection) -> rusqlite::Result<(usize, usize)> {
    let mut added_queries = 0;
    for query in default_queries() {
        if queries::insert_query_if_missing(conn, &query)? {
            added_queries += 1;
        }
    }
    let mut added_templates = 0;
    for template in default_templates() {
        if templates::insert_template_if_missing(conn, &template)? {
            added_templates += 1;
        }
    }
    Ok((added_queries, added_templates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::report_engine::template;

    #[test]
    fn seeding_twice_adds_nothing_the_second_time() {
        let conn = Connection::open_in_memory().unwrap();
        schema::ensure_tables(&conn).unwrap();

        let (q, t) = seed(&conn).unwrap();
        assert_eq!(q, DEFAULT_QUERIES.len());
        assert_eq!(t, default_templates().len());
        assert_eq!(seed(&conn).unwrap(), (0, 0));
    }

    #[test]
    fn every_default_template_parses() {
        for t in default_templates() {
            assert!(
                template::compile(&t.content).is_ok(),
                "template {} does not parse",
                t.slug
            );
        }
    }
}
