//! # Dataset Cleaning
//!
//! Turns the raw trends CSV into rows ready for insertion. Every column is read
//! as text so that one malformed cell never rejects the whole file; cleaning
//! then applies these rules:
//!
//! - rows with an empty or repeated `row_id` are dropped (first one wins)
//! - platform aliases are normalized (`tik tok` -> `TikTok`, `youtube shorts` -> `YouTube`)
//! - rows without platform, author handle or country are dropped
//! - category, region, day of week, period, seasons and trend labels are title-cased,
//!   with `Misc`, `Unknown` and `General` standing in for blanks
//! - integers are rounded and clipped (`week_of_year` 1..=53, `upload_hour` 0..=23,
//!   everything else at least 0); rates and `completion_rate` are clipped to 0..=1
//! - `has_emoji` and `is_weekend` accept `1/true/yes/y/t/on/weekend`
//! - rows whose publish date cannot be parsed are dropped
//!
//! Records are cleaned in parallel with rayon; the output keeps the file order.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;

const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AR", "Argentina"),
    ("AU", "Australia"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("DE", "Germany"),
    ("EG", "Egypt"),
    ("ES", "Spain"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("ID", "Indonesia"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KE", "Kenya"),
    ("KR", "South Korea"),
    ("MA", "Morocco"),
    ("MX", "Mexico"),
    ("NG", "Nigeria"),
    ("NL", "Netherlands"),
    ("PH", "Philippines"),
    ("PL", "Poland"),
    ("RU", "Russia"),
    ("SA", "Saudi Arabia"),
    ("SE", "Sweden"),
    ("TR", "Turkey"),
    ("US", "United States"),
    ("ZA", "South Africa"),
];

const TRUTHY: [&str; 7] = ["1", "true", "yes", "y", "t", "on", "weekend"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// One CSV line as read from disk. Absent columns read as empty text.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RawRecord {
    pub row_id: String,
    pub platform: String,
    pub category: String,
    pub hashtag: String,
    pub title: String,
    pub title_keywords: String,
    pub author_handle: String,
    pub creator_tier: String,
    pub creator_avg_views: String,
    pub country: String,
    pub region: String,
    pub language: String,
    pub publish_date_approx: String,
    pub publish_dayofweek: String,
    pub publish_period: String,
    pub event_season: String,
    pub season: String,
    pub week_of_year: String,
    pub duration_sec: String,
    pub views: String,
    pub likes: String,
    pub comments: String,
    pub shares: String,
    pub saves: String,
    pub dislikes: String,
    pub engagement_total: String,
    pub engagement_rate: String,
    pub like_rate: String,
    pub dislike_rate: String,
    pub engagement_per_1k: String,
    pub engagement_like_rate: String,
    pub engagement_comment_rate: String,
    pub engagement_share_rate: String,
    pub avg_watch_time_sec: String,
    pub completion_rate: String,
    pub has_emoji: String,
    pub device_type: String,
    pub device_brand: String,
    pub upload_hour: String,
    pub traffic_source: String,
    pub is_weekend: String,
    pub trend_label: String,
    pub trend_type: String,
    pub trend_duration_days: String,
    pub engagement_velocity: String,
    pub source_hint: String,
    pub tags: String,
    pub sample_comments: String,
}

/// A row that passed cleaning, with every value in its stored form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CleanRecord {
    pub row_id: String,
    pub platform: String,
    pub category: String,
    pub hashtag: String,
    pub title: String,
    pub title_keywords: String,
    pub title_length: i64,
    pub has_emoji: bool,
    pub duration_sec: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub dislikes: i64,
    pub engagement_rate: f64,
    pub engagement_total: i64,
    pub like_rate: f64,
    pub dislike_rate: f64,
    pub engagement_per_1k: f64,
    pub engagement_like_rate: f64,
    pub engagement_comment_rate: f64,
    pub engagement_share_rate: f64,
    pub avg_watch_time_sec: f64,
    pub completion_rate: f64,
    pub publish_date: String,
    pub year_month: String,
    pub publish_dayofweek: String,
    pub publish_period: String,
    pub event_season: String,
    pub season: String,
    pub week_of_year: i64,
    pub country_code: String,
    pub country_name: String,
    pub region: String,
    pub language: String,
    pub author_handle: String,
    pub creator_avg_views: f64,
    pub creator_tier: String,
    pub device: DeviceKey,
    pub trend: TrendKey,
    pub engagement_velocity: f64,
    pub source_hint: String,
    pub tags: Vec<String>,
    pub sample_comment: String,
}

/// Identity of a `Device` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DeviceKey {
    pub device_type: String,
    pub device_brand: String,
    pub upload_hour: i64,
    pub traffic_source: String,
    pub is_weekend: bool,
}

/// Identity of a `Trend` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TrendKey {
    pub trend_label: String,
    pub trend_type: String,
    pub trend_duration_days: i64,
}

/// Reads every record of `input` and cleans it.
pub(crate) fn read_and_clean<R: Read>(input: R) -> csv::Result<Vec<CleanRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let records = reader
        .deserialize::<RawRecord>()
        .collect::<csv::Result<Vec<_>>>()?;
    Ok(clean_records(records))
}

/// Drops repeated `row_id`s, then cleans the remaining records in parallel.
pub(crate) fn clean_records(records: Vec<RawRecord>) -> Vec<CleanRecord> {
    let mut seen = HashSet::new();
    let unique: Vec<RawRecord> = records
        .into_iter()
        .filter_map(|mut record| {
            record.row_id = record.row_id.trim().to_string();
            if record.row_id.is_empty() || !seen.insert(record.row_id.clone()) {
                return None;
            }
            Some(record)
        })
        .collect();
    unique.into_par_iter().filter_map(clean_record).collect()
}

fn clean_record(raw: RawRecord) -> Option<CleanRecord> {
    let platform = normalize_platform(&raw.platform);
    let author_handle = normalize_spaces(&raw.author_handle);
    let country_code = raw.country.trim().to_uppercase();
    if platform.is_empty() || author_handle.is_empty() || country_code.is_empty() {
        return None;
    }
    let publish = parse_date(&raw.publish_date_approx)?;
    let title = or_default(normalize_spaces(&raw.title), "Untitled");

    Some(CleanRecord {
        row_id: raw.row_id,
        platform,
        category: title_case(&or_default(normalize_spaces(&raw.category), "Misc")),
        hashtag: clean_hashtag(&raw.hashtag),
        title_length: title.chars().count() as i64,
        title,
        title_keywords: normalize_spaces(&raw.title_keywords),
        has_emoji: is_truthy(&raw.has_emoji),
        duration_sec: coerce_int(&raw.duration_sec, 0, None),
        views: coerce_int(&raw.views, 0, None),
        likes: coerce_int(&raw.likes, 0, None),
        comments: coerce_int(&raw.comments, 0, None),
        shares: coerce_int(&raw.shares, 0, None),
        saves: coerce_int(&raw.saves, 0, None),
        dislikes: coerce_int(&raw.dislikes, 0, None),
        engagement_rate: coerce_rate(&raw.engagement_rate),
        engagement_total: coerce_int(&raw.engagement_total, 0, None),
        like_rate: coerce_rate(&raw.like_rate),
        dislike_rate: coerce_rate(&raw.dislike_rate),
        engagement_per_1k: coerce_float(&raw.engagement_per_1k),
        engagement_like_rate: coerce_rate(&raw.engagement_like_rate),
        engagement_comment_rate: coerce_rate(&raw.engagement_comment_rate),
        engagement_share_rate: coerce_rate(&raw.engagement_share_rate),
        avg_watch_time_sec: coerce_float(&raw.avg_watch_time_sec),
        completion_rate: coerce_rate(&raw.completion_rate),
        publish_date: publish.format("%Y-%m-%d").to_string(),
        year_month: publish.format("%Y-%m").to_string(),
        publish_dayofweek: title_case(raw.publish_dayofweek.trim()),
        publish_period: title_case(raw.publish_period.trim()),
        event_season: title_case(raw.event_season.trim()),
        season: title_case(raw.season.trim()),
        week_of_year: coerce_int(&raw.week_of_year, 1, Some(53)),
        country_name: country_name(&country_code),
        country_code,
        region: or_default(title_case(&normalize_spaces(&raw.region)), "Unknown"),
        language: or_default(raw.language.trim().to_lowercase(), "en"),
        author_handle,
        creator_avg_views: coerce_float(&raw.creator_avg_views),
        creator_tier: normalize_creator_tier(&raw.creator_tier).to_string(),
        device: DeviceKey {
            device_type: or_default(normalize_spaces(&raw.device_type), "Unknown"),
            device_brand: or_default(normalize_spaces(&raw.device_brand), "Unknown"),
            upload_hour: coerce_int(&raw.upload_hour, 0, Some(23)),
            traffic_source: or_default(normalize_spaces(&raw.traffic_source), "Unknown"),
            is_weekend: is_truthy(&raw.is_weekend),
        },
        trend: TrendKey {
            trend_label: or_default(title_case(raw.trend_label.trim()), "General"),
            trend_type: or_default(title_case(raw.trend_type.trim()), "General"),
            trend_duration_days: coerce_int(&raw.trend_duration_days, 0, None),
        },
        engagement_velocity: coerce_float(&raw.engagement_velocity),
        source_hint: or_default(normalize_spaces(&raw.source_hint), "N/A"),
        tags: split_tags(&raw.tags),
        sample_comment: raw.sample_comments.trim().to_string(),
    })
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Trims and collapses inner runs of whitespace to one space.
pub(crate) fn normalize_spaces(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

/// Upper-cases the first letter of every word and lower-cases the rest. A word
/// starts after any character that is not a letter.
pub(crate) fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut after_letter = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}

pub(crate) fn normalize_platform(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "tiktok" | "tik tok" => "TikTok".to_string(),
        "youtube" | "you tube" | "youtube shorts" => "YouTube".to_string(),
        _ => normalize_spaces(value),
    }
}

pub(crate) fn normalize_creator_tier(value: &str) -> &'static str {
    match value.trim().to_lowercase().as_str() {
        "mega" => "Mega",
        "macro" => "Macro",
        "micro" => "Micro",
        "nano" => "Nano",
        _ => "Mid",
    }
}

/// `dance` and `##dance` both become `#dance`; blank stays blank.
pub(crate) fn clean_hashtag(value: &str) -> String {
    let text = value.trim().trim_start_matches('#');
    if text.is_empty() {
        String::new()
    } else {
        format!("#{}", text)
    }
}

fn country_name(code: &str) -> String {
    COUNTRY_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

fn parse_number(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Rounds to the nearest integer; unparseable values count as 0.
pub(crate) fn coerce_int(value: &str, lower: i64, upper: Option<i64>) -> i64 {
    let rounded = (parse_number(value).round() as i64).max(lower);
    upper.map_or(rounded, |u| rounded.min(u))
}

fn coerce_float(value: &str) -> f64 {
    parse_number(value).max(0.0)
}

fn coerce_rate(value: &str) -> f64 {
    parse_number(value).clamp(0.0, 1.0)
}

pub(crate) fn is_truthy(value: &str) -> bool {
    TRUTHY.contains(&value.trim().to_lowercase().as_str())
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
}

pub(crate) fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
row_id,platform,category,hashtag,title,author_handle,creator_tier,country,region,language,views,engagement_rate,upload_hour,week_of_year,is_weekend,publish_date_approx,tags,sample_comments
r1, tik tok ,street  food,food,,@eats,MACRO,us,north america,,1200.6,1.7,25,0,Weekend,2025-01-05,\"food, street ,\",  yum
r1,TikTok,Food,#food,dup,@eats,Macro,US,,,1,0.1,1,1,0,2025-01-06,,
r2,YouTube Shorts,,#tech,Review,@rev,unknown,zz,,FR,-5,abc,3,60,no,not a date,,
r3,youtube,,,Review,  ,Micro,GB,,,10,0.2,3,10,no,2025-02-01,,
r4,You Tube,,,Tips,@tips,nano,JP,asia,JA,10,0.2,3,10,yes,2025/02/03 10:00:00,,
,TikTok,Food,,x,@x,Mid,US,,,1,0.1,1,1,0,2025-01-01,,
";

    #[test]
    fn cleans_the_sample_file() {
        let rows = read_and_clean(SAMPLE.as_bytes()).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.row_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r4"]);

        let first = &rows[0];
        assert_eq!(first.platform, "TikTok");
        assert_eq!(first.category, "Street Food");
        assert_eq!(first.hashtag, "#food");
        assert_eq!(first.title, "Untitled");
        assert_eq!(first.title_length, 8);
        assert_eq!(first.creator_tier, "Macro");
        assert_eq!(first.country_code, "US");
        assert_eq!(first.country_name, "United States");
        assert_eq!(first.region, "North America");
        assert_eq!(first.language, "en");
        assert_eq!(first.views, 1201);
        assert_eq!(first.engagement_rate, 1.0);
        assert_eq!(first.device.upload_hour, 23);
        assert!(first.device.is_weekend);
        assert_eq!(first.device.device_type, "Unknown");
        assert_eq!(first.week_of_year, 1);
        assert_eq!(first.year_month, "2025-01");
        assert_eq!(first.tags, vec!["food".to_string(), "street".to_string()]);
        assert_eq!(first.sample_comment, "yum");
        assert_eq!(first.trend.trend_type, "General");
        assert_eq!(first.source_hint, "N/A");

        let last = &rows[1];
        assert_eq!(last.platform, "YouTube");
        assert_eq!(last.category, "Misc");
        assert_eq!(last.creator_tier, "Nano");
        assert_eq!(last.language, "ja");
        assert_eq!(last.publish_date, "2025-02-03");
    }

    #[test]
    fn text_helpers() {
        assert_eq!(normalize_spaces("  a \t b\n c "), "a b c");
        assert_eq!(title_case("hello wORLD o'neil"), "Hello World O'Neil");
        assert_eq!(normalize_platform("  Snap   Chat "), "Snap Chat");
        assert_eq!(clean_hashtag("##dance"), "#dance");
        assert_eq!(clean_hashtag(" # "), "");
        assert_eq!(normalize_creator_tier("Star"), "Mid");
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(coerce_int("12.4", 0, None), 12);
        assert_eq!(coerce_int("oops", 1, Some(53)), 1);
        assert_eq!(coerce_int("99", 0, Some(23)), 23);
        assert_eq!(coerce_int("-3", 0, None), 0);
        assert_eq!(coerce_rate("-0.2"), 0.0);
        assert_eq!(coerce_float("NaN"), 0.0);
        assert!(is_truthy(" Yes "));
        assert!(!is_truthy("weekday"));
    }

    #[test]
    fn dates_in_several_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9);
        assert_eq!(parse_date("2025-03-09"), expected);
        assert_eq!(parse_date("03/09/2025"), expected);
        assert_eq!(parse_date("2025-03-09T08:15:00"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }
}
