// ── Atoms: Error Types ─────────────────────────────────────────────────────
// Single canonical error enum for the agent, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, CSV, Chart, Provider…).
//   • The `#[from]` attribute wires std/external error conversions.
//   • No variant carries secret material (API tokens) in its message.
//   • Nothing in this taxonomy ever crosses the Agent::answer boundary;
//     every variant degrades to a natural-language apology before then.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read or record-level parse failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset is semantically invalid (missing column, inconsistent row).
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Chart rendering or encoding failure.
    #[error("Chart error: {0}")]
    Chart(String),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Text-generation provider API-level failure (non-secret detail only).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Agent configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// All engine operations return this type.
pub type AgentResult<T> = Result<T, AgentError>;
