//! Blog post rendering.

use comrak::{Options, markdown_to_html};

/// Render a post body to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is escaped, not passed through.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    options.render.escape = true;

    markdown_to_html(content, &options)
}
