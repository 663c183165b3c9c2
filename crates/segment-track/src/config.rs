fn default_after_text() -> String {
    "placeholder text added after".to_string()
}

fn default_before_text() -> String {
    "placeholder text added before".to_string()
}

fn default_score() -> f64 {
    1.0
}

fn default_open_span_ms() -> i64 {
    1_000
}

/// Knobs for the placeholder segments created by the append operations.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SyncConfig {
    #[serde(default = "default_after_text")]
    pub placeholder_after_text: String,
    #[serde(default = "default_before_text")]
    pub placeholder_before_text: String,
    #[serde(default = "default_score")]
    pub placeholder_score: f64,
    /// Length given to a placeholder appended past an endpoint, where no
    /// neighbour bounds it.
    #[serde(default = "default_open_span_ms")]
    pub open_span_ms: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            placeholder_after_text: default_after_text(),
            placeholder_before_text: default_before_text(),
            placeholder_score: default_score(),
            open_span_ms: default_open_span_ms(),
        }
    }
}
