use serde::Deserialize;

/// Limits applied while parsing a single input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting of expressions and statements. Deeper constructs are
    /// reported and dropped instead of overflowing the stack.
    pub max_depth: u32,
    /// Diagnostics kept per parse; later ones are only counted.
    pub max_errors: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 512,
            max_errors: 1000,
        }
    }
}

impl ParserConfig {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}
