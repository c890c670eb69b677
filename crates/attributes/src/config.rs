//! Tunable parameters for event dispatch and the text codec.

/// Event dispatch configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventConfig {
    /// How deeply a single bus may be re-entered from its own subscribers
    /// before dispatch is refused. Deeper nesting means a notification loop
    /// between bound values, which is a configuration error.
    pub max_dispatch_depth: u32,
}

impl EventConfig {
    pub const DEFAULT_MAX_DISPATCH_DEPTH: u32 = 64;

    pub const fn new() -> Self {
        Self {
            max_dispatch_depth: Self::DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }

    pub const fn with_max_dispatch_depth(max_dispatch_depth: u32) -> Self {
        Self { max_dispatch_depth }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Text codec configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecConfig {
    /// Emit `#name:` lines for empty strings. Turning this off shrinks blobs
    /// but an empty string then loads as whatever the schema initialized.
    pub emit_empty_strings: bool,

    /// Line terminator written by the encoder. The decoder accepts `\n`,
    /// `\r\n` and `\r` regardless.
    pub line_ending: String,
}

impl CodecConfig {
    pub const DEFAULT_LINE_ENDING: &'static str = "\n";

    pub fn new() -> Self {
        Self {
            emit_empty_strings: true,
            line_ending: Self::DEFAULT_LINE_ENDING.to_owned(),
        }
    }

    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    pub fn skip_empty_strings(mut self) -> Self {
        self.emit_empty_strings = false;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}
