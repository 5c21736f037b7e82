//! HTTP client for the insights backend.
//!
//! Every JSON endpoint answers with an envelope `{"status": "success" | "error",
//! "message": ..., ...payload}`. The envelope is decoded whatever the HTTP status
//! code is, so a 404 carrying `{"status": "error", "message": "..."}` surfaces the
//! server's message. Export endpoints return a raw file body on success and the
//! same JSON envelope on failure.
//!
//! There are no retries and no caching: one call, one request.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{
    AskReply, ChartData, Conversation, ConversationListing, DatasetListing, Hypothesis, Stats,
    SystemSettings, TestedHypothesis,
};

const SUCCESS: &str = "success";

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// A dataset file plus the form fields sent with it.
#[derive(Debug, Clone)]
pub struct DatasetUpload {
    pub file_name: String,
    pub contents: Bytes,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    conversation_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TestHypothesisRequest<'a> {
    hypothesis_id: &'a str,
    hypothesis_text: &'a str,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    tested_hypotheses: &'a [TestedHypothesis],
}

#[derive(Debug, Serialize)]
struct ExportInsightsRequest<'a> {
    insights: &'a str,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateConversationRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsBody {
    stats: Stats,
}

#[derive(Debug, Deserialize)]
struct QuestionsBody {
    #[serde(default)]
    questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HypothesesBody {
    #[serde(default)]
    hypotheses: Vec<Hypothesis>,
}

#[derive(Debug, Deserialize)]
struct ResultBody {
    result: String,
}

#[derive(Debug, Deserialize)]
struct InsightsBody {
    insights: String,
}

#[derive(Debug, Deserialize)]
struct SettingsBody {
    #[serde(default)]
    settings: Option<SystemSettings>,
}

#[derive(Debug, Deserialize)]
struct ConversationBody {
    conversation: Conversation,
}

#[derive(Debug, Deserialize)]
struct CreatedConversationBody {
    conversation_id: String,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    chart_data: ChartData,
}

// ============================================================================
// ApiClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.base_url, config.timeout())
    }

    /// Create a client against an explicit server (tests, `--server`).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api request");
        self.client.request(method, url)
    }

    /// Send and decode a JSON envelope, rejecting `status != "success"`.
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "api transport failure");
            ApiError::from(e)
        })?;
        let http_status = response.status().as_u16();
        let body = response.bytes().await?;

        let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(status = http_status, error = %e, "api returned a non-JSON body");
            ApiError::from(e)
        })?;
        let envelope: Envelope = serde_json::from_value(value.clone())?;

        if envelope.status.as_deref() != Some(SUCCESS) {
            tracing::warn!(
                status = http_status,
                message = envelope.message.as_deref().unwrap_or(""),
                "api rejected request"
            );
            return Err(ApiError::Rejected {
                status: http_status,
                message: envelope.message,
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Send and return the raw body; failures still carry the JSON envelope.
    async fn download(&self, request: RequestBuilder) -> Result<Bytes, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body);
        }

        let envelope: Envelope = serde_json::from_slice(&body)?;
        tracing::warn!(status = status.as_u16(), "export rejected");
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: envelope.message,
        })
    }

    // ------------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------------

    pub async fn list_datasets(&self) -> Result<DatasetListing, ApiError> {
        self.call(self.request(Method::GET, "/api/datasets")).await
    }

    pub async fn upload_dataset(&self, upload: DatasetUpload) -> Result<Option<String>, ApiError> {
        let part = Part::bytes(upload.contents.to_vec()).file_name(upload.file_name);
        let form = Form::new()
            .part("file", part)
            .text("name", upload.name)
            .text("description", upload.description);

        let body: MessageBody = self
            .call(self.request(Method::POST, "/api/datasets").multipart(form))
            .await?;
        Ok(body.message)
    }

    pub async fn activate_dataset(&self, id: &str) -> Result<Option<String>, ApiError> {
        let path = format!("/api/datasets/{}/activate", id);
        let body: MessageBody = self.call(self.request(Method::POST, &path)).await?;
        Ok(body.message)
    }

    pub async fn delete_dataset(&self, id: &str) -> Result<Option<String>, ApiError> {
        let path = format!("/api/datasets/{}", id);
        let body: MessageBody = self.call(self.request(Method::DELETE, &path)).await?;
        Ok(body.message)
    }

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        let body: StatsBody = self.call(self.request(Method::GET, "/api/stats")).await?;
        Ok(body.stats)
    }

    pub async fn sample_questions(&self) -> Result<Vec<String>, ApiError> {
        let body: QuestionsBody = self
            .call(self.request(Method::GET, "/api/sample_questions"))
            .await?;
        Ok(body.questions)
    }

    // ------------------------------------------------------------------------
    // Hypotheses and insights
    // ------------------------------------------------------------------------

    pub async fn generate_hypotheses(&self) -> Result<Vec<Hypothesis>, ApiError> {
        let body: HypothesesBody = self
            .call(self.request(Method::POST, "/api/generate_hypotheses"))
            .await?;
        Ok(body.hypotheses)
    }

    pub async fn test_hypothesis(&self, hypothesis: &Hypothesis) -> Result<String, ApiError> {
        let request = TestHypothesisRequest {
            hypothesis_id: &hypothesis.id,
            hypothesis_text: &hypothesis.description,
        };
        let body: ResultBody = self
            .call(self.request(Method::POST, "/api/test_hypothesis").json(&request))
            .await?;
        Ok(body.result)
    }

    pub async fn synthesize_insights(
        &self,
        tested: &[TestedHypothesis],
    ) -> Result<String, ApiError> {
        let request = SynthesizeRequest {
            tested_hypotheses: tested,
        };
        let body: InsightsBody = self
            .call(self.request(Method::POST, "/api/synthesize_insights").json(&request))
            .await?;
        Ok(body.insights)
    }

    pub async fn export_insights(&self, insights: &str, format: &str) -> Result<Bytes, ApiError> {
        let request = ExportInsightsRequest { insights, format };
        self.download(self.request(Method::POST, "/api/export_insights").json(&request))
            .await
    }

    // ------------------------------------------------------------------------
    // Settings and maintenance
    // ------------------------------------------------------------------------

    /// `None` when the server answered without a settings object.
    pub async fn settings(&self) -> Result<Option<SystemSettings>, ApiError> {
        let body: SettingsBody = self.call(self.request(Method::GET, "/api/settings")).await?;
        Ok(body.settings)
    }

    pub async fn save_settings(&self, settings: &SystemSettings) -> Result<Option<String>, ApiError> {
        let body: MessageBody = self
            .call(self.request(Method::POST, "/api/settings").json(settings))
            .await?;
        Ok(body.message)
    }

    pub async fn initialise(&self) -> Result<Option<String>, ApiError> {
        let body: MessageBody = self.call(self.request(Method::POST, "/api/initialise")).await?;
        Ok(body.message)
    }

    pub async fn clear_cache(&self) -> Result<Option<String>, ApiError> {
        let body: MessageBody = self.call(self.request(Method::POST, "/api/clear_cache")).await?;
        Ok(body.message)
    }

    // ------------------------------------------------------------------------
    // Questions and conversations
    // ------------------------------------------------------------------------

    pub async fn ask(
        &self,
        question: &str,
        conversation_id: Option<&str>,
    ) -> Result<AskReply, ApiError> {
        let request = AskRequest {
            question,
            conversation_id,
        };
        self.call(self.request(Method::POST, "/api/ask").json(&request))
            .await
    }

    pub async fn list_conversations(&self) -> Result<ConversationListing, ApiError> {
        self.call(self.request(Method::GET, "/api/conversations")).await
    }

    /// Returns the id of the new conversation.
    pub async fn create_conversation(&self, title: &str) -> Result<String, ApiError> {
        let request = CreateConversationRequest { title };
        let body: CreatedConversationBody = self
            .call(self.request(Method::POST, "/api/conversations").json(&request))
            .await?;
        Ok(body.conversation_id)
    }

    pub async fn conversation(&self, id: &str) -> Result<Conversation, ApiError> {
        let path = format!("/api/conversations/{}", id);
        let body: ConversationBody = self.call(self.request(Method::GET, &path)).await?;
        Ok(body.conversation)
    }

    pub async fn delete_conversation(&self, id: &str) -> Result<Option<String>, ApiError> {
        let path = format!("/api/conversations/{}", id);
        let body: MessageBody = self.call(self.request(Method::DELETE, &path)).await?;
        Ok(body.message)
    }

    pub async fn activate_conversation(&self, id: &str) -> Result<Option<String>, ApiError> {
        let path = format!("/api/conversations/{}/activate", id);
        let body: MessageBody = self.call(self.request(Method::POST, &path)).await?;
        Ok(body.message)
    }

    pub async fn export_conversation(&self, id: &str, format: &str) -> Result<Bytes, ApiError> {
        let path = format!("/api/conversations/{}/export", id);
        self.download(self.request(Method::GET, &path).query(&[("format", format)]))
            .await
    }

    pub async fn visualisation(&self, chart_type: &str) -> Result<ChartData, ApiError> {
        let path = format!("/api/visualisations/{}", chart_type);
        let body: ChartBody = self.call(self.request(Method::GET, &path)).await?;
        Ok(body.chart_data)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::with_base_url(&server.uri(), Duration::from_secs(5))
            .expect("Failed to create client")
    }

    #[tokio::test]
    async fn test_list_datasets_decodes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "datasets": [
                    {"id": "dataset_1", "name": "Superstore", "description": "Retail",
                     "date_added": "2025-03-01T10:00:00", "last_used": null},
                    {"id": "dataset_2", "name": "Q2 Sales", "date_added": "2025-04-01T10:00:00"}
                ],
                "current_dataset": {"id": "dataset_2", "name": "Q2 Sales"}
            })))
            .mount(&server)
            .await;

        let listing = client(&server).list_datasets().await.unwrap();
        assert_eq!(listing.datasets.len(), 2);
        assert!(listing.is_active("dataset_2"));
        assert!(!listing.is_active("dataset_1"));
    }

    #[tokio::test]
    async fn test_error_status_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/datasets/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "status": "error",
                "message": "Dataset not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).delete_dataset("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message.as_deref(), Some("Dataset not found"));
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_on_http_200_is_still_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error"
            })))
            .mount(&server)
            .await;

        let err = client(&server).stats().await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 200, message: None }));
    }

    #[tokio::test]
    async fn test_html_error_page_is_network_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stats"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server).stats().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_kind() {
        let api = ApiClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = api.stats().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_ask_sends_question_and_conversation_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ask"))
            .and(body_json(serde_json::json!({
                "question": "Which region is most profitable?",
                "conversation_id": null
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "conversation_id": "conv-1",
                "question": "Which region is most profitable?",
                "answer": "The **West** region.",
                "processing_time": 1.25,
                "chart_data": null,
                "follow_up_suggestions": ["Why is the West ahead?"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .ask("Which region is most profitable?", None)
            .await
            .unwrap();
        assert_eq!(reply.conversation_id, "conv-1");
        assert_eq!(reply.follow_up_suggestions.len(), 1);
        assert!(reply.chart_data.is_none());
    }

    #[tokio::test]
    async fn test_test_hypothesis_sends_description_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/test_hypothesis"))
            .and(body_json(serde_json::json!({
                "hypothesis_id": "h1",
                "hypothesis_text": "Discounts above 20% produce losses"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "result": "Supported."
            })))
            .mount(&server)
            .await;

        let hypothesis = Hypothesis {
            id: "h1".to_string(),
            title: "Deep discounts".to_string(),
            description: "Discounts above 20% produce losses".to_string(),
            importance: "high".to_string(),
            confidence: None,
        };
        let result = client(&server).test_hypothesis(&hypothesis).await.unwrap();
        assert_eq!(result, "Supported.");
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/datasets"))
            .and(body_string_contains("name=\"name\""))
            .and(body_string_contains("Q3 Sales"))
            .and(body_string_contains("filename=\"q3.csv\""))
            .and(body_string_contains("Order ID,Sales"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Dataset uploaded"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let upload = DatasetUpload {
            file_name: "q3.csv".to_string(),
            contents: Bytes::from_static(b"Order ID,Sales\n1,10.5\n"),
            name: "Q3 Sales".to_string(),
            description: String::new(),
        };
        let message = client(&server).upload_dataset(upload).await.unwrap();
        assert_eq!(message.as_deref(), Some("Dataset uploaded"));
    }

    #[tokio::test]
    async fn test_export_conversation_returns_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/conv-1/export"))
            .and(query_param("format", "csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"role,content\n".to_vec()))
            .mount(&server)
            .await;

        let bytes = client(&server).export_conversation("conv-1", "csv").await.unwrap();
        assert_eq!(&bytes[..], b"role,content\n");
    }

    #[tokio::test]
    async fn test_export_failure_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/export_insights"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status": "error",
                "message": "PDF export is not supported in this version"
            })))
            .mount(&server)
            .await;

        let err = client(&server).export_insights("# Insights", "pdf").await.unwrap_err();
        assert_eq!(
            err.user_message("Failed to export insights"),
            "PDF export is not supported in this version"
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url_is_trimmed() {
        let api = ApiClient::with_base_url("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stats"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "success", "stats": {}}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let api = ApiClient::with_base_url(&server.uri(), Duration::from_secs(1)).unwrap();
        let err = api.stats().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.user_message("ignored"), crate::error::NETWORK_ERROR_MESSAGE);
    }
}
