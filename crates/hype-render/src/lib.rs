//! Markdown to HTML conversion pipeline shared by `hype convert` and
//! `hype preview`.

mod config;
mod error;

pub use config::{ConversionConfig, Extension};
pub use error::{RenderError, RenderResult};

use comrak::{format_html, parse_document, Arena, Options};
use tracing::trace;

/// Convert a Markdown document into HTML.
///
/// Input that is not valid UTF-8 is decoded lossily, so every byte sequence
/// produces a document. The output is a pure function of `input` and `config`.
pub fn convert(input: &[u8], config: ConversionConfig) -> RenderResult<Vec<u8>> {
    let source = String::from_utf8_lossy(input);
    let options = renderer_options(config);

    let arena = Arena::new();
    let root = parse_document(&arena, &source, &options);

    let mut html = Vec::with_capacity(input.len() + input.len() / 2);
    format_html(root, &options, &mut html)?;

    trace!(
        input_bytes = input.len(),
        output_bytes = html.len(),
        extended = config.extended,
        "converted markdown"
    );
    Ok(html)
}

/// Convenience wrapper around [`convert`] for string input.
pub fn convert_str(input: &str, config: ConversionConfig) -> RenderResult<String> {
    let html = convert(input.as_bytes(), config)?;
    // The formatter only emits UTF-8.
    Ok(String::from_utf8_lossy(&html).into_owned())
}

/// Build the renderer options for `config`.
///
/// The bare grammar starts from comrak's defaults (CommonMark only) and asks
/// the renderer to escape raw HTML instead of dropping it.
fn renderer_options(config: ConversionConfig) -> Options<'static> {
    let mut options = Options::default();

    if !config.extended {
        options.render.unsafe_ = false;
        options.render.escape = true;
        return options;
    }

    for extension in config.extensions() {
        match extension {
            Extension::Tables => options.extension.table = true,
            Extension::Strikethrough => options.extension.strikethrough = true,
            Extension::TaskLists => options.extension.tasklist = true,
            Extension::Autolinks => options.extension.autolink = true,
            Extension::Footnotes => options.extension.footnotes = true,
            Extension::DefinitionLists => options.extension.description_lists = true,
            Extension::Emoji => options.extension.shortcodes = true,
            Extension::AutoHeadingIds => options.extension.header_ids = Some(String::new()),
            Extension::RawHtmlPassthrough => options.render.unsafe_ = true,
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_options_escape_raw_html() {
        let options = renderer_options(ConversionConfig::basic());
        assert!(options.render.escape);
        assert!(!options.render.unsafe_);
        assert!(!options.extension.table);
        assert!(options.extension.header_ids.is_none());
    }

    #[test]
    fn extended_options_enable_everything() {
        let options = renderer_options(ConversionConfig::extended());
        assert!(options.render.unsafe_);
        assert!(!options.render.escape);
        assert!(options.extension.table);
        assert!(options.extension.strikethrough);
        assert!(options.extension.tasklist);
        assert!(options.extension.footnotes);
        assert!(options.extension.description_lists);
        assert!(options.extension.shortcodes);
        assert_eq!(options.extension.header_ids.as_deref(), Some(""));
    }
}
