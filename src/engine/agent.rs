// Query Service
//
// Orchestrates one question end to end: input guard, intent resolution and
// handler execution, best-effort polishing, and the second-pass fictional-
// term guard. `answer` is total: every internal failure has already been
// converted to apology text by the time it returns, so the HTTP boundary
// never sees an error for any string input.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{info, warn};

use crate::atoms::constants::{CLARIFICATION_TEXT, FICTIONAL_GUARD_TEXT, FICTIONAL_TERMS};
use crate::atoms::types::{ChatResponse, PolishOutcome};
use crate::engine::config::AgentConfig;
use crate::engine::dataset::Dataset;
use crate::engine::polisher::Polisher;
use crate::engine::resolver::Resolver;

pub struct Agent {
    dataset: Arc<Dataset>,
    resolver: Resolver,
    polisher: Polisher,
}

impl Agent {
    pub fn new(dataset: Arc<Dataset>, config: &AgentConfig) -> Agent {
        Agent { dataset, resolver: Resolver::new(), polisher: Polisher::new(config) }
    }

    #[cfg(test)]
    pub(crate) fn with_parts(dataset: Arc<Dataset>, polisher: Polisher) -> Agent {
        Agent { dataset, resolver: Resolver::new(), polisher }
    }

    pub fn passenger_count(&self) -> usize {
        self.dataset.len()
    }

    /// Answer a natural-language question about the passenger dataset.
    pub async fn answer(&self, question: &str) -> ChatResponse {
        if question.trim().is_empty() {
            return ChatResponse { answer: CLARIFICATION_TEXT.to_string(), plot: None };
        }

        let result = self.resolver.run(question, &self.dataset);

        let answer = match self.polisher.polish(question, &result.text).await {
            PolishOutcome::Polished(text) => text,
            PolishOutcome::SkippedNoCredential => result.text.clone(),
            PolishOutcome::FailedTimeout => {
                warn!("[agent] polishing timed out; returning raw computed result");
                result.text.clone()
            }
            PolishOutcome::FailedError(e) => {
                warn!("[agent] polishing failed ({e}); returning raw computed result");
                result.text.clone()
            }
        };

        // Second-pass guard: fictional topics override whatever an earlier
        // stage produced, plot included. Deliberately a different term set
        // than the resolver's deny list (see DESIGN.md).
        let q = question.to_lowercase();
        if FICTIONAL_TERMS.iter().any(|t| q.contains(t)) {
            info!("[agent] fictional-term guard fired");
            return ChatResponse { answer: FICTIONAL_GUARD_TEXT.to_string(), plot: None };
        }

        ChatResponse { answer, plot: result.plot.map(|bytes| BASE64.encode(bytes)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dataset::fixtures::full_dataset;
    use std::time::Duration;

    /// Agent with polishing disabled (no credential), the fallback-law
    /// configuration: answers must equal the raw computed text exactly.
    fn offline_agent() -> Agent {
        let polisher = Polisher::for_tests("http://127.0.0.1:9", None, Duration::from_millis(50));
        Agent::with_parts(Arc::new(full_dataset()), polisher)
    }

    #[tokio::test]
    async fn test_empty_question_asks_for_clarification() {
        let agent = offline_agent();
        for q in ["", "   ", "\n\t"] {
            let response = agent.answer(q).await;
            assert_eq!(response.answer, CLARIFICATION_TEXT);
            assert!(response.plot.is_none());
        }
    }

    #[tokio::test]
    async fn test_fallback_law_answer_equals_raw_text() {
        let agent = offline_agent();
        let response = agent.answer("What percentage of passengers were male?").await;
        assert_eq!(response.answer, "64.76% of passengers were male.");
        assert!(response.plot.is_none());
    }

    #[tokio::test]
    async fn test_total_passenger_scenario() {
        let response = offline_agent().answer("How many total passengers?").await;
        assert_eq!(response.answer, "There were 891 total passengers on the Titanic.");
        assert!(response.plot.is_none());
    }

    #[tokio::test]
    async fn test_fictional_guard_overrides_everything() {
        let response = offline_agent().answer("Tell me about aliens").await;
        assert_eq!(response.answer, FICTIONAL_GUARD_TEXT);
        assert!(response.plot.is_none());
    }

    #[tokio::test]
    async fn test_non_fictional_deny_term_keeps_resolver_redirect() {
        let response = offline_agent().answer("what about the weather").await;
        assert!(response.answer.contains("found term 'weather'"), "got: {}", response.answer);
        assert!(response.plot.is_none());
    }

    #[tokio::test]
    async fn test_gibberish_gets_overview() {
        let response = offline_agent().answer("asdkj qwle").await;
        assert!(response.answer.starts_with("Titanic Dataset Overview"));
        assert!(response.plot.is_none());
    }

    #[tokio::test]
    async fn test_chart_answers_carry_base64_png() {
        let response = offline_agent().answer("show me a histogram of passenger ages").await;
        let plot = response.plot.expect("histogram answer must carry a plot");
        let bytes = BASE64.decode(plot.as_bytes()).expect("plot must be valid base64");
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_idempotent_answers_without_polishing() {
        let agent = offline_agent();
        let a = agent.answer("survival rate by gender").await;
        let b = agent.answer("survival rate by gender").await;
        assert_eq!(a.answer, b.answer);
        assert_eq!(a.plot, b.plot, "charts must render byte-identically");
    }

    #[tokio::test]
    async fn test_timeout_law_returns_raw_text_within_envelope() {
        // Endpoint accepts and then stays silent; the deadline is injected
        // short so the test runs fast.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut sockets = Vec::new();
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    sockets.push(socket);
                }
            }
        });

        let polisher = Polisher::for_tests(
            &format!("http://{addr}"),
            Some("token"),
            Duration::from_millis(200),
        );
        let agent = Agent::with_parts(Arc::new(full_dataset()), polisher);

        let started = std::time::Instant::now();
        let response = agent.answer("How many total passengers?").await;
        assert_eq!(response.answer, "There were 891 total passengers on the Titanic.");
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
