//! HTML export for question sets and session reports.
//!
//! Renders question sets and finished sessions as self-contained HTML pages.

pub mod html;

pub use html::{
    generate_questions_html, generate_session_html, write_questions_html, write_session_html,
};
