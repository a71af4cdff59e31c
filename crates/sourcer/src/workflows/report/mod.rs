mod document;
mod format;
mod text;

pub use document::render_document;
pub use format::{dollars, format_whole_dollars, wrap_words};
pub use text::render_text;
