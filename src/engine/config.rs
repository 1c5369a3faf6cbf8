// Agent configuration, read from the environment once at startup.
//
// The polishing token is the only secret; its absence DISABLES polishing
// rather than being an error. The polish timeout is a fixed constant and
// deliberately has no environment knob.

use crate::atoms::constants::{DEFAULT_POLISH_BASE_URL, DEFAULT_POLISH_MODEL};

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Text-generation model id for answer polishing.
    pub polish_model: String,
    /// Credential for the polishing endpoint. `None` disables polishing.
    pub polish_token: Option<String>,
    /// OpenAI-compatible base URL of the polishing endpoint.
    pub polish_base_url: String,
    /// Path to the passenger manifest CSV.
    pub csv_path: String,
    /// Listen address for the HTTP boundary.
    pub bind_addr: String,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        AgentConfig {
            polish_model: env_or("HF_MODEL", DEFAULT_POLISH_MODEL),
            polish_token: std::env::var("HUGGINGFACEHUB_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            polish_base_url: env_or("HF_BASE_URL", DEFAULT_POLISH_BASE_URL),
            csv_path: env_or("TITANIC_CSV", "titanic.csv"),
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:8000"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Scoped to variables the suite does not otherwise set.
        std::env::remove_var("HF_MODEL");
        std::env::remove_var("HF_BASE_URL");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.polish_model, DEFAULT_POLISH_MODEL);
        assert_eq!(cfg.polish_base_url, DEFAULT_POLISH_BASE_URL);
    }
}
