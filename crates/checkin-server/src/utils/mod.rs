//! Utility functions for formatting page and header values.

pub mod format;

pub use format::{escape_html, format_http_date, format_timestamp};
