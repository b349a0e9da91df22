//! ratewise-report — Evaluation sheet rendering.
//!
//! Turns a scored evaluation or a yearly result into a self-contained HTML
//! page or a Markdown summary.

pub mod html;
pub mod markdown;
pub mod sheet;

pub use html::{generate_html, generate_result_html, write_html_report};
pub use markdown::{result_to_markdown, to_markdown};
pub use sheet::{EvaluationSheet, SheetLine};
