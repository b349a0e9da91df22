//! reqwest implementation of [`EvaluationApi`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use ratewise_core::error::ApiError;
use ratewise_core::model::{
    EvaluationRecord, FeedbackRequest, InterviewRequest, Member, MemberRating, SaveRequest,
    TemplateItem,
};
use ratewise_core::result::EmployeeResult;
use ratewise_core::traits::EvaluationApi;

use crate::dto::{
    convert_all, MemberDto, MemberRatingDto, RatingItemDto, RatingSubmissionDto, ResultDto,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for the scoring backend.
pub struct HttpClient {
    base_url: String,
    base: reqwest::Url,
    timeout_secs: u64,
    client: reqwest::Client,
}

/// An evaluation stored through the generic `/evaluations` endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvaluation {
    pub id: String,
    pub record: EvaluationRecord,
}

#[derive(Deserialize)]
struct StoredEvaluationDto {
    id: Value,
    #[serde(flatten)]
    record: EvaluationRecord,
}

impl TryFrom<StoredEvaluationDto> for StoredEvaluation {
    type Error = ApiError;

    fn try_from(dto: StoredEvaluationDto) -> Result<Self, Self::Error> {
        let id = match dto.id {
            Value::String(s) if !s.is_empty() => s,
            Value::Number(n) => n.to_string(),
            other => return Err(ApiError::Schema(format!("evaluation.id: expected id, got {other}"))),
        };
        Ok(StoredEvaluation {
            id,
            record: dto.record,
        })
    }
}

/// Whether a 404 means "nothing there" or is an error.
#[derive(Clone, Copy, PartialEq, Eq)]
enum NotFound {
    Empty,
    Error,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        let timeout_secs = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };

        let base_url = base.trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| ApiError::Network(format!("invalid base URL {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::Network(format!("invalid base URL {base_url}")));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            base: parsed,
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The base URL extended by `segments`, each percent-encoded.
    fn url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            ApiError::Network(format!("backend not reachable at {}", self.base_url))
        } else {
            ApiError::Network(e.to_string())
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        builder.send().await.map_err(|e| self.transport_error(e))
    }

    /// Read a JSON array. A 404, an empty body or `null` is an empty list.
    async fn get_list<D>(&self, url: reqwest::Url) -> Result<Vec<D>, ApiError>
    where
        D: DeserializeOwned,
    {
        let path = url.path().to_string();
        let response = self.send(self.client.get(url)).await?;
        let Some(body) = self.body(response, NotFound::Empty).await? else {
            debug!(path = %path, "not found, treating as empty");
            return Ok(Vec::new());
        };
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let list: Option<Vec<D>> = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Schema(format!("{path}: {e}")))?;
        Ok(list.unwrap_or_default())
    }

    /// Read a single JSON document.
    async fn get_one<D>(&self, url: reqwest::Url) -> Result<D, ApiError>
    where
        D: DeserializeOwned,
    {
        let path = url.path().to_string();
        let response = self.send(self.client.get(url)).await?;
        let body = self.require_body(response).await?;
        decode(&path, &body)
    }

    /// Returns the body of a successful response; `None` for a tolerated 404.
    async fn body(
        &self,
        response: reqwest::Response,
        not_found: NotFound,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        let status = response.status().as_u16();
        if status == 404 && not_found == NotFound::Empty {
            return Ok(None);
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status,
                message: server_message(&body),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(Some(bytes.to_vec()))
    }

    async fn require_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        Ok(self
            .body(response, NotFound::Error)
            .await?
            .unwrap_or_default())
    }

    // -----------------------------------------------------------------------
    // Generic evaluation CRUD. The evaluation flow does not use these; they
    // exist for records stored before the per-item rating endpoints.
    // -----------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_evaluations(&self) -> Result<Vec<StoredEvaluation>, ApiError> {
        convert_all(self.get_list::<StoredEvaluationDto>(self.url(&["evaluations"])).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_evaluation(&self, id: &str) -> Result<StoredEvaluation, ApiError> {
        self.get_one::<StoredEvaluationDto>(self.url(&["evaluations", id]))
            .await?
            .try_into()
    }

    #[instrument(skip_all, fields(project = %record.project_id, member = %record.member_id))]
    pub async fn create_evaluation(
        &self,
        record: &EvaluationRecord,
    ) -> Result<StoredEvaluation, ApiError> {
        let response = self
            .send(self.client.post(self.url(&["evaluations"])).json(record))
            .await?;
        let body = self.require_body(response).await?;
        decode::<StoredEvaluationDto>("/evaluations", &body)?.try_into()
    }

    #[instrument(skip(self, record))]
    pub async fn update_evaluation(
        &self,
        id: &str,
        record: &EvaluationRecord,
    ) -> Result<StoredEvaluation, ApiError> {
        let url = self.url(&["evaluations", id]);
        let path = url.path().to_string();
        let response = self.send(self.client.put(url).json(record)).await?;
        let body = self.require_body(response).await?;
        decode::<StoredEvaluationDto>(&path, &body)?.try_into()
    }

    #[instrument(skip(self))]
    pub async fn delete_evaluation(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .send(self.client.delete(self.url(&["evaluations", id])))
            .await?;
        self.require_body(response).await?;
        Ok(())
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: reqwest::Url, body: &B) -> Result<Vec<u8>, ApiError> {
        let response = self.send(self.client.post(url).json(body)).await?;
        self.require_body(response).await
    }
}

#[async_trait]
impl EvaluationApi for HttpClient {
    #[instrument(skip(self))]
    async fn team_members(&self, pm_id: &str) -> Result<Vec<Member>, ApiError> {
        convert_all(
            self.get_list::<MemberDto>(self.url(&["getAllTeamMembers", pm_id]))
                .await?,
        )
    }

    #[instrument(skip(self))]
    async fn rating_items(&self, pm_id: &str) -> Result<Vec<TemplateItem>, ApiError> {
        convert_all(
            self.get_list::<RatingItemDto>(self.url(&["getRatingItems", pm_id]))
                .await?,
        )
    }

    #[instrument(skip(self))]
    async fn member_ratings(&self, user_id: &str) -> Result<Vec<MemberRating>, ApiError> {
        convert_all(
            self.get_list::<MemberRatingDto>(self.url(&["getMemberRatings", user_id]))
                .await?,
        )
    }

    #[instrument(skip_all, fields(member = %request.key.member_id, total = %request.total_score))]
    async fn save_user_ratings(&self, request: &SaveRequest) -> Result<bool, ApiError> {
        let ratings: Vec<RatingSubmissionDto> =
            request.ratings.iter().map(RatingSubmissionDto::from).collect();
        let mut url = self.url(&["saveUserRatings"]);
        url.query_pairs_mut()
            .append_pair("totalScore", &request.total_score);
        let body = self.post_json(url, &ratings).await?;

        // The backend answers with a bare boolean; anything else on a 2xx
        // counts as stored.
        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Bool(stored)) => Ok(stored),
            _ => Ok(true),
        }
    }

    #[instrument(skip_all, fields(member = %request.member_id))]
    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ApiError> {
        self.post_json(self.url(&["feedback"]), request).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(member = %request.member_id, date = %request.requested_date))]
    async fn submit_interview_request(&self, request: &InterviewRequest) -> Result<(), ApiError> {
        self.post_json(self.url(&["interview-requests"]), request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn employee_result(&self, employee_id: &str, year: i32) -> Result<EmployeeResult, ApiError> {
        let mut url = self.url(&["getResult", employee_id]);
        url.query_pairs_mut().append_pair("year", &year.to_string());
        self.get_one::<ResultDto>(url)
            .await?
            .try_into()
    }
}

fn decode<D: DeserializeOwned>(path: &str, body: &[u8]) -> Result<D, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Schema(format!("{path}: {e}")))
}

/// The `message` field of a JSON error body, else the body itself.
fn server_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ratewise_core::model::{EvaluationKey, RatingSubmission};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> HttpClient {
        HttpClient::new(&server.uri(), 5).unwrap()
    }

    #[tokio::test]
    async fn team_members_are_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getAllTeamMembers/pm-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "username": "kim", "team": "platform"},
                {"id": "2", "username": "lee", "team": "platform"}
            ])))
            .mount(&server)
            .await;

        let members = client(&server).await.team_members("pm-1").await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id, "1");
        assert_eq!(members[1].username, "lee");
    }

    #[tokio::test]
    async fn not_found_reads_are_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = client(&server).await;
        assert!(api.rating_items("pm-1").await.unwrap().is_empty());
        assert!(api.member_ratings("m1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_body_is_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getMemberRatings/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert!(client(&server).await.member_ratings("m1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_errors_carry_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getRatingItems/pm-1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).await.rating_items("pm-1").await.unwrap_err();
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_items_are_schema_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getRatingItems/pm-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1, "name": "Quality", "ratio": "lots"}])),
            )
            .mount(&server)
            .await;

        let err = client(&server).await.rating_items("pm-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Schema(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        // Nothing listens on port 9 on a test machine.
        let api = HttpClient::new("http://127.0.0.1:9", 2).unwrap();
        let err = api.team_members("pm-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
        assert!(err.is_read_fallback());
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let api = HttpClient::new(&server.uri(), 1).unwrap();
        let err = api.team_members("pm-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(1)));
    }

    #[tokio::test]
    async fn save_posts_stringified_ratings_with_total() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/saveUserRatings"))
            .and(query_param("totalScore", "80.15"))
            .and(body_json(json!([
                {"itemInfo": "1", "plus": "2", "score": "85", "userInfo": "m1", "comment": "solid"}
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let request = SaveRequest {
            key: EvaluationKey::new("project-001", "m1"),
            total_score: "80.15".into(),
            ratings: vec![RatingSubmission {
                item_id: "1".into(),
                user_id: "m1".into(),
                score: 85,
                bonus: 2,
                comment: "solid".into(),
            }],
        };
        assert!(client(&server).await.save_user_ratings(&request).await.unwrap());
    }

    #[tokio::test]
    async fn save_reports_backend_refusal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/saveUserRatings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
            .mount(&server)
            .await;

        let request = SaveRequest {
            key: EvaluationKey::new("project-001", "m1"),
            total_score: "0.00".into(),
            ratings: vec![],
        };
        assert!(!client(&server).await.save_user_ratings(&request).await.unwrap());
    }

    #[tokio::test]
    async fn feedback_error_uses_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/feedback"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "feedback closed"})),
            )
            .mount(&server)
            .await;

        let request = FeedbackRequest {
            project_id: "project-001".into(),
            member_id: "m1".into(),
            member_name: None,
            feedback: "please review item 2".into(),
            requested_at: Utc::now(),
        };
        let err = client(&server).await.submit_feedback(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "server error (HTTP 400): feedback closed");
    }

    #[tokio::test]
    async fn interview_request_is_posted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/interview-requests"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 4})))
            .expect(1)
            .mount(&server)
            .await;

        let request = InterviewRequest {
            project_id: "project-001".into(),
            member_id: "m1".into(),
            member_name: Some("kim".into()),
            requested_date: "2026-11-02".into(),
            requested_time: "14:00".into(),
            message: String::new(),
            requested_at: Utc::now(),
        };
        client(&server)
            .await
            .submit_interview_request(&request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn employee_result_passes_year() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getResult/emp-9"))
            .and(query_param("year", "2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Park", "center": "R&D", "division": "Tools", "team": "QA",
                "score": 92.5,
                "feedback": "{\"strengths\":\"ownership\",\"weaknesses\":\"\",\"improvements\":\"delegate\",\"overallEvaluation\":\"excellent\"}"
            })))
            .mount(&server)
            .await;

        let result = client(&server).await.employee_result("emp-9", 2025).await.unwrap();
        assert_eq!(result.score, 92.5);
        assert_eq!(result.feedback.unwrap().improvements, "delegate");
    }

    #[tokio::test]
    async fn path_parameters_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getResult/a%2Fb%3Fc%23d"))
            .and(query_param("year", "2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Park", "score": 70
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .await
            .employee_result("a/b?c#d", 2025)
            .await
            .unwrap();
        assert_eq!(result.name, "Park");
    }

    #[tokio::test]
    async fn base_path_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/getRatingItems/pm-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Code quality", "ratio": 100}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpClient::new(&format!("{}/api/", server.uri()), 5).unwrap();
        assert_eq!(api.rating_items("pm-1").await.unwrap().len(), 1);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpClient::new("not a url", 5),
            Err(ApiError::Network(_))
        ));
    }

    #[tokio::test]
    async fn employee_result_not_found_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such employee"))
            .mount(&server)
            .await;

        let err = client(&server).await.employee_result("x", 2025).await.unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 404, .. }));
    }

    #[tokio::test]
    async fn evaluation_crud() {
        let server = MockServer::start().await;
        let stored = json!({
            "id": 12,
            "projectId": "project-001",
            "memberId": "m1",
            "totalScore": 80.15,
            "evaluatedAt": "2026-10-01T09:00:00Z"
        });
        Mock::given(method("POST"))
            .and(path("/evaluations"))
            .respond_with(ResponseTemplate::new(201).set_body_json(&stored))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/evaluations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored.clone()])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/evaluations/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/evaluations/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server).await;
        let record: EvaluationRecord = serde_json::from_value(stored.clone()).unwrap();

        let created = api.create_evaluation(&record).await.unwrap();
        assert_eq!(created.id, "12");
        assert_eq!(created.record.total_score, Some(80.15));

        assert_eq!(api.list_evaluations().await.unwrap().len(), 1);
        assert_eq!(api.get_evaluation("12").await.unwrap().record.member_id, "m1");
        api.delete_evaluation("12").await.unwrap();
    }

    #[test]
    fn server_message_prefers_message_field() {
        assert_eq!(server_message(r#"{"message":"closed"}"#), "closed");
        assert_eq!(server_message(r#"{"error":"x"}"#), r#"{"error":"x"}"#);
        assert_eq!(server_message("plain\n"), "plain");
    }
}
