use serde::{Deserialize, Serialize};

/// A country that has at least one content row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub code: String,
    pub name: String,
    pub region: Option<String>,
    pub language: Option<String>,
}

/// A `YYYY-MM` bucket present in the dataset, with display helpers for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearMonthEntry {
    pub year_month: String,
    pub year: String,
    pub month: String,
    pub month_name: String,
    pub display: String,
}
