// Answer Polisher
//
// Best-effort restatement of a computed result through an OpenAI-compatible
// chat-completions endpoint (Hugging Face router by default). The remote
// call runs in its own task and the caller waits under a hard deadline; on
// timeout the task's eventual result is abandoned. One attempt, no retries.
//
// Contract: a non-`Polished` outcome must never fail the request. The
// agent unwraps every other outcome back to the raw computed text.

use std::time::Duration;

use log::info;
use reqwest::Client;
use serde_json::{json, Value};

use crate::atoms::constants::{POLISH_MAX_CHARS, POLISH_MIN_CHARS, POLISH_TIMEOUT};
use crate::atoms::error::{AgentError, AgentResult};
use crate::atoms::types::PolishOutcome;
use crate::engine::config::AgentConfig;

pub struct Polisher {
    client: Client,
    model: String,
    base_url: String,
    token: Option<String>,
    deadline: Duration,
}

impl Polisher {
    pub fn new(config: &AgentConfig) -> Polisher {
        if config.polish_token.is_none() {
            info!("[polisher] no API token configured; answer polishing disabled");
        }
        Polisher {
            client: Client::new(),
            model: config.polish_model.clone(),
            base_url: config.polish_base_url.clone(),
            token: config.polish_token.clone(),
            deadline: POLISH_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(base_url: &str, token: Option<&str>, deadline: Duration) -> Polisher {
        Polisher {
            client: Client::new(),
            model: "test-model".into(),
            base_url: base_url.to_string(),
            token: token.map(|t| t.to_string()),
            deadline,
        }
    }

    /// Ask the model to restate `raw` for `question`. The instruction
    /// template forbids introducing facts not present in the result.
    pub async fn polish(&self, question: &str, raw: &str) -> PolishOutcome {
        let Some(token) = self.token.clone() else {
            return PolishOutcome::SkippedNoCredential;
        };

        let client = self.client.clone();
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = request_body(&self.model, question, raw);

        // The request lives in its own task so a hung remote call cannot
        // hold the caller past the deadline; after timeout the join handle
        // is dropped and the task's result is ignored.
        let call = tokio::spawn(async move { complete(&client, &url, &token, body).await });

        match tokio::time::timeout(self.deadline, call).await {
            Err(_) => PolishOutcome::FailedTimeout,
            Ok(Err(join_err)) => PolishOutcome::FailedError(format!("task failed: {join_err}")),
            Ok(Ok(Err(e))) => PolishOutcome::FailedError(e.to_string()),
            Ok(Ok(Ok(reply))) => {
                let reply = reply.trim().to_string();
                // Reject empty echoes and runaway generations.
                if reply.len() <= POLISH_MIN_CHARS || reply.len() >= POLISH_MAX_CHARS {
                    PolishOutcome::FailedError(format!(
                        "reply length {} outside acceptable bounds",
                        reply.len()
                    ))
                } else {
                    PolishOutcome::Polished(reply)
                }
            }
        }
    }
}

fn request_body(model: &str, question: &str, result: &str) -> Value {
    let prompt = format!(
        "You are a friendly Titanic dataset analyst chatbot. The user asked a question\n\
         and you have already computed the answer. Restate the result clearly and concisely\n\
         in 1-3 sentences. Do not add information you are not given.\n\n\
         Dataset: 891 Titanic passengers with columns — survived, pclass, sex, age,\n\
         sibsp, parch, fare, embarked, class, who, adult_male, deck, embark_town, alive, alone.\n\n\
         User question: {question}\n\
         Computed result: {result}\n\n\
         Your response:"
    );
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": 0.1,
        "max_tokens": 256,
    })
}

async fn complete(client: &Client, url: &str, token: &str, body: Value) -> AgentResult<String> {
    let response = client.post(url).bearer_auth(token).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        let detail: String = detail.chars().take(200).collect();
        return Err(AgentError::Provider(format!("HTTP {status}: {detail}")));
    }

    let payload: Value = response.json().await?;
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| AgentError::Provider("malformed completion response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credential_skips_polishing() {
        let polisher =
            Polisher::for_tests("http://127.0.0.1:9", None, Duration::from_millis(100));
        let outcome = polisher.polish("q", "raw answer text").await;
        assert_eq!(outcome, PolishOutcome::SkippedNoCredential);
    }

    #[tokio::test]
    async fn test_unresponsive_endpoint_times_out() {
        // A listener that accepts connections but never answers.
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
        let started = std::time::Instant::now();
        let outcome = polisher.polish("q", "raw answer text").await;
        assert_eq!(outcome, PolishOutcome::FailedTimeout);
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "polish must return promptly after the deadline"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_failed_error() {
        // Port 9 (discard) is closed in practice; connection is refused.
        let polisher = Polisher::for_tests(
            "http://127.0.0.1:9",
            Some("token"),
            Duration::from_secs(5),
        );
        match polisher.polish("q", "raw answer text").await {
            PolishOutcome::FailedError(_) => {}
            other => panic!("expected FailedError, got {other:?}"),
        }
    }
}
