pub mod catalog;
pub mod content;
pub mod context;
pub mod report;
pub mod template;
