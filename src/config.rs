use serde::Deserialize;

/// How long a block opened by a directive stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(not(target_arch = "wasm32"), derive(clap::ValueEnum))]
pub enum BlockScope {
    /// The block stays open for every following content line until the next
    /// directive replaces or closes it.
    #[default]
    Sticky,
    /// The block closes after the first content line, so every field needs
    /// its own directive.
    ResetAfterContent,
}

/// How coordinate fields (`x:` / `y:`) are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(not(target_arch = "wasm32"), derive(clap::ValueEnum))]
pub enum NumericMode {
    /// Integers only; anything else becomes 0.
    #[default]
    StrictInteger,
    /// Any finite decimal; unparsable becomes 0.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub block_scope: BlockScope,
    pub numeric: NumericMode,
}

impl InterpreterConfig {
    pub fn with_block_scope(mut self, block_scope: BlockScope) -> Self {
        self.block_scope = block_scope;
        self
    }

    pub fn with_numeric(mut self, numeric: NumericMode) -> Self {
        self.numeric = numeric;
        self
    }

    /// Load a config from JSON text. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
