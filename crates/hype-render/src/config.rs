use std::fmt;

/// Renderer configuration for a single conversion.
///
/// The extension set is all-or-nothing: every extension listed in
/// [`Extension::ALL`] is enabled when `extended` is true, and none of them
/// are enabled otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionConfig {
    pub extended: bool,
}

impl ConversionConfig {
    /// Full extension set with raw HTML passthrough.
    pub const fn extended() -> Self {
        Self { extended: true }
    }

    /// Bare CommonMark grammar; raw HTML is escaped.
    pub const fn basic() -> Self {
        Self { extended: false }
    }

    /// Maps the `--basic` command-line flag onto a configuration.
    pub const fn from_basic_flag(basic: bool) -> Self {
        Self { extended: !basic }
    }

    /// Extensions active under this configuration, in a stable order.
    pub fn extensions(&self) -> Vec<Extension> {
        if self.extended {
            Extension::ALL.to_vec()
        } else {
            Vec::new()
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::extended()
    }
}

/// Syntax extensions layered on top of the bare grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Tables,
    Strikethrough,
    TaskLists,
    Autolinks,
    Footnotes,
    DefinitionLists,
    Emoji,
    AutoHeadingIds,
    RawHtmlPassthrough,
}

impl Extension {
    pub const ALL: [Extension; 9] = [
        Extension::Tables,
        Extension::Strikethrough,
        Extension::TaskLists,
        Extension::Autolinks,
        Extension::Footnotes,
        Extension::DefinitionLists,
        Extension::Emoji,
        Extension::AutoHeadingIds,
        Extension::RawHtmlPassthrough,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Tables => "tables",
            Extension::Strikethrough => "strikethrough",
            Extension::TaskLists => "task-lists",
            Extension::Autolinks => "autolinks",
            Extension::Footnotes => "footnotes",
            Extension::DefinitionLists => "definition-lists",
            Extension::Emoji => "emoji",
            Extension::AutoHeadingIds => "auto-heading-ids",
            Extension::RawHtmlPassthrough => "raw-html",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
