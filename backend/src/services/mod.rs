pub mod admin;
pub mod catalog;
pub mod dataset;
pub mod queries;
pub mod reports;
pub mod templates;
