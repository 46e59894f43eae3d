/// Longest string written into a text field; longer values are cut
pub const DEFAULT_MAX_TEXT_LEN: usize = 1000;

/// Assembly settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Characters kept when filling a text field
    pub max_text_len: usize,
    /// Stroke a thin red box around each signature placement
    pub debug_outline: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            debug_outline: false,
        }
    }
}

impl AssemblerConfig {
    pub fn with_debug_outline(mut self, enabled: bool) -> Self {
        self.debug_outline = enabled;
        self
    }

    pub fn with_max_text_len(mut self, max: usize) -> Self {
        self.max_text_len = max;
        self
    }
}
