//! Remote HTTP question source.
//!
//! Speaks a small JSON protocol: the request body is
//! `{"category": ..., "difficulty": ..., "count": ...}` and the response is
//! `{"questions": [...]}` using the same field names as stored questions.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use drillkit_core::error::ProviderError;
use drillkit_core::model::{Difficulty, Question};
use drillkit_core::traits::{GenerateRequest, QuestionProvider};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider that fetches questions from an HTTP endpoint.
pub struct RemoteProvider {
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl RemoteProvider {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }
}

#[derive(Serialize)]
struct RemoteRequest<'a> {
    category: &'a str,
    difficulty: Difficulty,
    count: usize,
}

#[derive(Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    questions: Vec<Question>,
}

#[async_trait]
impl QuestionProvider for RemoteProvider {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, request), fields(category = %request.category, count = request.count))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        let body = RemoteRequest {
            category: &request.category,
            difficulty: request.difficulty,
            count: request.count,
        };

        let mut req = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json");

        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let payload: RemoteResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidPayload(format!("failed to parse response: {e}"))
        })?;

        for question in &payload.questions {
            question
                .validate()
                .map_err(|e| ProviderError::InvalidPayload(e.to_string()))?;
        }

        tracing::debug!(received = payload.questions.len(), "remote questions received");
        Ok(payload.questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn question_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "multiple-choice",
            "category": "math",
            "difficulty": "easy",
            "prompt": "What is 2 + 2?",
            "options": ["3", "4", "5", "6"],
            "correctAnswer": "4",
            "explanation": "Basic addition."
        })
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/questions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "category": "math",
                "difficulty": "easy",
                "count": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "questions": [question_json("m1"), question_json("m2")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(
            &format!("{}/questions", server.uri()),
            Some("test-key".into()),
            5,
        )
        .unwrap();
        let questions = provider
            .generate(&GenerateRequest::new("math", Difficulty::Easy, 2))
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].id, "m2");
        assert_eq!(questions[0].options.len(), 4);
    }

    #[tokio::test]
    async fn rate_limit_uses_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(&server.uri(), None, 5).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("math", Difficulty::Easy, 1))
            .await
            .unwrap_err();

        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider_err.retry_after_ms(), Some(2000));
    }

    #[tokio::test]
    async fn unauthorized_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(&server.uri(), Some("nope".into()), 5).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("math", Difficulty::Easy, 1))
            .await
            .unwrap_err();

        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(matches!(provider_err, ProviderError::AuthenticationFailed(_)));
        assert!(provider_err.is_permanent());
    }

    #[tokio::test]
    async fn server_error_carries_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(&server.uri(), None, 5).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("math", Difficulty::Easy, 1))
            .await
            .unwrap_err();

        match err.downcast_ref::<ProviderError>() {
            Some(ProviderError::ApiError { status, message }) => {
                assert_eq!(*status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_question_is_rejected() {
        let server = MockServer::start().await;

        let mut bad = question_json("m1");
        bad["correctAnswer"] = serde_json::json!("7");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "questions": [bad] })),
            )
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(&server.uri(), None, 5).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("math", Difficulty::Easy, 1))
            .await
            .unwrap_err();

        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(matches!(provider_err, ProviderError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = RemoteProvider::new(&server.uri(), None, 5).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("math", Difficulty::Easy, 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::InvalidPayload(_))
        ));
    }
}
