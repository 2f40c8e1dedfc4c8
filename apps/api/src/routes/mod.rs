pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::onboarding::handlers as onboarding;
use crate::policy::handlers as policy;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_mb * 1024 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route("/resume/score", post(screening::handle_score))
        .route(
            "/resume/upload",
            post(screening::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/candidates/top", get(screening::handle_top_candidates))
        // Policy QA API
        .route("/policy/ask", post(policy::handle_ask))
        .route("/policy/upload", post(policy::handle_upload))
        .route("/policy/sessions/:id", get(policy::handle_session_history))
        // Onboarding API
        .route("/onboarding/generate", post(onboarding::handle_generate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::onboarding::generator::OnboardingPlanner;
    use crate::policy::assistant::PolicyAssistant;
    use crate::policy::embedding::HashingEmbedder;
    use crate::screening::extractor::ResumeExtractor;
    use crate::store::RecordStore;
    use crate::test_support::{test_config, MemoryStore, ScriptedGenerator};

    struct Harness {
        router: Router,
        store: Arc<MemoryStore>,
        _dir: tempfile::TempDir,
    }

    async fn harness(replies: Vec<&str>, initialize: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let llm = Arc::new(ScriptedGenerator::new(
            replies.into_iter().map(|r| Ok(r.to_string())).collect(),
        ));
        let policy = Arc::new(PolicyAssistant::new(
            llm.clone(),
            config.rag.clone(),
            config.llm.temperature,
        ));
        if initialize {
            policy
                .init(Arc::new(HashingEmbedder::new(config.embedding.dimension)))
                .await
                .unwrap();
        }
        let store = Arc::new(MemoryStore::default());
        let state = AppState {
            config,
            extractor: ResumeExtractor::new(llm.clone()),
            onboarding: OnboardingPlanner::new(llm),
            policy,
            store: store.clone() as Arc<dyn RecordStore>,
        };
        Harness {
            router: build_router(state),
            store,
            _dir: dir,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn policies() -> Value {
        json!([
            {"name": "Leave", "content": "Employees get 20 vacation days per year.", "category": "Time Off"},
            {"name": "Expenses", "content": "Expense reports require manager approval."}
        ])
    }

    #[tokio::test]
    async fn test_health_reports_engine_status() {
        let h = harness(vec![], false).await;
        let (status, body) = send(&h.router, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rag_engine"], "not initialized");
        assert!(body["index"].is_null());
    }

    #[tokio::test]
    async fn test_score_endpoint_returns_full_result() {
        let h = harness(vec![], false).await;
        let request = json_request(
            "POST",
            "/resume/score",
            json!({
                "resume": {
                    "skills": ["Python", "SQL", "AWS"],
                    "years_of_experience": 4,
                    "education": [{"degree": "Bachelor of Science"}],
                    "quality_analysis": {"overall_quality_score": 80}
                },
                "requirements": {"required_skills": ["python", "sql"], "min_experience": 3}
            }),
        );
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overall_score"], 89.0);
        assert_eq!(body["is_qualified"], true);
        assert_eq!(body["scoring_breakdown"]["skill_weight"], "40%");
        assert!(body["evaluation_date"].is_string());
    }

    #[tokio::test]
    async fn test_policy_upload_rejects_empty_list() {
        let h = harness(vec![], true).await;
        let (status, body) = send(&h.router, json_request("POST", "/policy/upload", json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_policy_upload_before_init_is_unavailable() {
        let h = harness(vec![], false).await;
        let (status, _) = send(&h.router, json_request("POST", "/policy/upload", policies())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_upload_then_ask_then_history() {
        let h = harness(vec!["You get 20 vacation days."], true).await;

        let (status, body) = send(&h.router, json_request("POST", "/policy/upload", policies())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["chunks"], 2);
        assert_eq!(body["mode"], "replace");
        assert_eq!(h.store.policies().len(), 2);

        let (status, body) = send(
            &h.router,
            json_request(
                "POST",
                "/policy/ask",
                json!({"question": "How many vacation days?", "session_id": "abc"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "You get 20 vacation days.");
        assert_eq!(body["confidence"], "medium");
        assert_eq!(body["num_sources"], 2);
        assert_eq!(body["session_id"], "abc");

        let (status, body) = send(&h.router, get_request("/policy/sessions/abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["turns"][0]["question"], "How many vacation days?");

        let (status, _) = send(&h.router, get_request("/policy/sessions/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_policy_upload_skips_and_reports_blank_documents() {
        let h = harness(vec![], true).await;
        let documents = json!([
            {"name": "Blank", "content": "   "},
            {"name": "Leave", "content": "Employees get 20 vacation days per year."}
        ]);
        let (status, body) = send(&h.router, json_request("POST", "/policy/upload", documents)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        let stored: Vec<_> = h.store.policies().into_iter().map(|d| d.name).collect();
        assert_eq!(stored, vec!["Leave"]);

        let blank = json!([{"name": "Empty", "content": ""}]);
        let (status, body) = send(&h.router, json_request("POST", "/policy/upload", blank)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        assert!(body["message"].as_str().unwrap().starts_with("No policy documents indexed"));
        assert_eq!(h.store.policies().len(), 1);

        let (_, health) = send(&h.router, get_request("/health")).await;
        assert_eq!(health["index"]["chunks"], 1);
    }

    #[tokio::test]
    async fn test_policy_upload_store_failure_keeps_live_index() {
        let h = harness(vec![], true).await;
        let (status, _) = send(&h.router, json_request("POST", "/policy/upload", policies())).await;
        assert_eq!(status, StatusCode::OK);
        let (_, before) = send(&h.router, get_request("/health")).await;

        h.store.fail_writes();
        let replacement = json!([{"name": "Travel", "content": "Book economy class for flights."}]);
        let (status, body) = send(&h.router, json_request("POST", "/policy/upload", replacement)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORE_ERROR");

        let (_, after) = send(&h.router, get_request("/health")).await;
        assert_eq!(after["index"], before["index"]);
        assert_eq!(after["index"]["chunks"], 2);
    }

    #[tokio::test]
    async fn test_onboarding_generate_stores_plan() {
        let h = harness(
            vec![r#"{"overview": "Ramp-up.", "days": [{"day": 1, "theme": "Welcome"}, {"day": 3, "theme": "Shadowing"}]}"#],
            false,
        )
        .await;
        let request = json_request(
            "POST",
            "/onboarding/generate",
            json!({
                "employee_name": "Jane Doe",
                "role": "Data Analyst",
                "department": "Finance",
                "start_date": "2024-03-01"
            }),
        );
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["plan"]["generation_method"], "llm");
        assert_eq!(body["plan"]["days"][1]["date"], "2024-03-05");
        assert_eq!(body["plan"]["days"][1]["day_of_week"], "Tuesday");

        let stored = h.store.onboarding_plans();
        assert_eq!(stored.len(), 1);
        assert_eq!(body["plan_id"], stored[0].id.to_string());
    }

    #[tokio::test]
    async fn test_onboarding_generate_rejects_bad_date() {
        let h = harness(vec![], false).await;
        let request = json_request(
            "POST",
            "/onboarding/generate",
            json!({
                "employee_name": "Jane Doe",
                "role": "Data Analyst",
                "department": "Finance",
                "start_date": "03/01/2024"
            }),
        );
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid date format. Use YYYY-MM-DD");
        assert!(h.store.onboarding_plans().is_empty());
    }

    #[tokio::test]
    async fn test_ask_before_init_answers_with_error_label() {
        let h = harness(vec![], false).await;
        let (status, body) = send(
            &h.router,
            json_request("POST", "/policy/ask", json!({"question": "Anything?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Policy engine not initialized.");
        assert_eq!(body["confidence"], "error");
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question() {
        let h = harness(vec![], true).await;
        let (status, _) = send(
            &h.router,
            json_request("POST", "/policy/ask", json!({"question": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_top_candidates_validates_limit() {
        let h = harness(vec![], false).await;
        let (status, _) = send(&h.router, get_request("/candidates/top?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&h.router, get_request("/candidates/top?limit=101")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = send(&h.router, get_request("/candidates/top")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "hrdesk-test-boundary";
        let mut body = String::new();
        for (name, filename, value) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: text/plain\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/resume/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_resume_upload_scores_archives_and_saves() {
        let h = harness(
            vec![
                r#"{"name": "Jane Doe", "skills": ["Python", "SQL"], "years_of_experience": 6,
                    "education": [{"degree": "Master of Science"}]}"#,
                r#"{"overall_quality_score": 70}"#,
            ],
            false,
        )
        .await;
        let resume = "Jane Doe\njane@example.com\nData engineer with six years of Python and SQL.";
        let request = multipart(&[
            ("file", Some("jane.txt"), resume),
            ("required_skills", None, "python, sql"),
            ("min_experience", None, "3"),
        ]);

        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["name"], "Jane Doe");
        assert_eq!(body["is_qualified"], true);
        assert_eq!(body["matched_skills"], json!(["python", "sql"]));

        let objects = h.store.objects();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].0.ends_with("/jane.txt"));

        let (_, top) = send(&h.router, get_request("/candidates/top?limit=5")).await;
        assert_eq!(top["count"], 1);
        assert_eq!(top["candidates"][0]["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_resume_upload_rejects_unsupported_type() {
        let h = harness(vec![], false).await;
        let request = multipart(&[("file", Some("cv.docx"), "binary")]);
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("docx"));
    }
}
