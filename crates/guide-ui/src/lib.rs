//! Guide UI crate - the embedded browser page.
//!
//! The page is a single self-contained HTML file with all CSS and JavaScript
//! inline, embedded at compile time via `include_str!`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use guide_ui::page::GUIDE_HTML;
//!
//! async fn index() -> axum::response::Html<&'static str> {
//!     axum::response::Html(GUIDE_HTML)
//! }
//! ```

pub mod page;

pub use page::{GUIDE_HTML, PAGE_TITLE};
