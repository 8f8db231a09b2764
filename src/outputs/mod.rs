//! Output generation for trend snapshots and analyses.
//!
//! # Submodules
//!
//! - [`json`]: Writes [`crate::models::TrendSnapshot`] files for other tools
//! - [`markdown`]: Renders trend tables, analyses and overviews as Markdown

pub mod json;
pub mod markdown;
