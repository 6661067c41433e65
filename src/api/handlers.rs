//! HTTP request handlers

use super::sse::reply_stream;
use super::types::{
    AdminOverview, AuthResponse, ChatRequest, ChatResponse, ErrorResponse, FlaggedResponse,
    MoodRequest, NavigateQuery, NavigateResponse, NoteRequest, NoteResponse, PlanListing, SignInRequest,
    SignUpBody, SubscriptionRequest, SubscriptionResponse, SuccessResponse,
};
use super::{AppState, ChatClaim};
use crate::chat::{ChatAdapter, ChatError, ChatState, SendOutcome, StreamUpdate};
use crate::guard::{self, Access, View};
use crate::identity::{
    all_plans, find_plan, AuthError, Identity, SessionSnapshot, SignUpRequest,
};
use crate::system_prompt;
use crate::wellness::{fixtures, MoodSubmission, StudentDashboard, StudentDetail, WellnessError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot, OwnedMutexGuard};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/session", get(get_session))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-out", post(sign_out))
        // Navigation decisions
        .route("/api/navigate", get(navigate))
        // Pricing
        .route("/api/plans", get(list_plans))
        .route("/api/subscription", post(subscribe))
        // Dashboards
        .route("/api/student/dashboard", get(student_dashboard))
        .route("/api/student/mood", post(submit_mood))
        .route("/api/faculty/flagged", get(flagged_students))
        .route("/api/faculty/students/:id", get(student_detail))
        .route("/api/faculty/students/:id/notes", post(add_note))
        .route("/api/admin/overview", get(admin_overview))
        // Chat
        .route("/api/chat", get(get_chat))
        .route("/api/chat/start", post(start_chat))
        .route("/api/chat/messages", post(send_chat))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

/// Ask the guard whether the current session may use `view`
fn authorize(state: &AppState, view: View) -> Result<Identity, AppError> {
    let snapshot = state.session.snapshot();
    match guard::authorize(view, &snapshot) {
        Access::Render { .. } => snapshot.identity.ok_or_else(|| AppError::Unauthorized {
            message: "Sign in required".to_string(),
            return_to: Some(view),
        }),
        Access::Loading => Err(AppError::Unavailable("Session is loading".to_string())),
        Access::SignIn { return_to } => Err(AppError::Unauthorized {
            message: "Sign in required".to_string(),
            return_to: Some(return_to),
        }),
        Access::Redirect { to } => Err(AppError::Forbidden { redirect: to }),
    }
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let identity = state.session.sign_in(&req.email, &req.secret).await?;
    state.chat.reset().await;

    let return_to = req.return_to.as_deref().and_then(View::from_path);
    let redirect = guard::after_sign_in(return_to, &identity).path();

    Ok(Json(AuthResponse {
        organization: state.session.organization(),
        identity,
        redirect,
    }))
}

async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpBody>,
) -> Result<Json<AuthResponse>, AppError> {
    let required = [
        ("organization_name", &body.organization_name),
        ("display_name", &body.display_name),
        ("email", &body.email),
        ("secret", &body.secret),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }

    let chosen_plan = body
        .plan_id
        .as_deref()
        .map(|id| find_plan(id).ok_or_else(|| AppError::BadRequest(format!("Unknown plan: {id}"))))
        .transpose()?;

    let request = SignUpRequest {
        organization_name: body.organization_name,
        display_name: body.display_name,
        email: body.email,
        secret: body.secret,
        role: body.role,
        plan: chosen_plan,
    };
    let identity = state.session.sign_up(&request).await;
    state.chat.reset().await;

    Ok(Json(AuthResponse {
        organization: state.session.organization(),
        redirect: guard::default_view(identity.role).path(),
        identity,
    }))
}

async fn sign_out(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.session.sign_out().await;
    state.chat.reset().await;
    Json(SuccessResponse { success: true })
}

async fn navigate(
    State(state): State<AppState>,
    Query(query): Query<NavigateQuery>,
) -> Json<NavigateResponse> {
    let access = guard::navigate(&query.path, &state.session.snapshot());
    Json(access.into())
}

// ============================================================
// Pricing
// ============================================================

async fn list_plans() -> Json<Vec<PlanListing>> {
    Json(all_plans().into_iter().map(PlanListing::from).collect())
}

async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let plan = find_plan(&req.plan_id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown plan: {}", req.plan_id)))?;

    let Some(organization) = state.session.update_organization_plan(plan).await else {
        return Err(AppError::Unauthorized {
            message: "Sign in to confirm a subscription".to_string(),
            return_to: Some(View::PricingPlans),
        });
    };
    let redirect = state
        .session
        .identity()
        .map_or(View::Landing, |identity| guard::default_view(identity.role))
        .path();

    Ok(Json(SubscriptionResponse {
        organization,
        redirect,
    }))
}

// ============================================================
// Dashboards
// ============================================================

async fn student_dashboard(
    State(state): State<AppState>,
) -> Result<Json<StudentDashboard>, AppError> {
    let identity = authorize(&state, View::Student)?;
    let dashboard = state
        .wellness
        .lock()
        .await
        .student_dashboard(&identity.id, Utc::now());
    Ok(Json(dashboard))
}

async fn submit_mood(
    State(state): State<AppState>,
    Json(req): Json<MoodRequest>,
) -> Result<Json<MoodSubmission>, AppError> {
    let identity = authorize(&state, View::Student)?;
    let submission = state.wellness.lock().await.submit_mood(
        &identity.id,
        req.rating,
        req.journal,
        Utc::now(),
    );
    Ok(Json(submission))
}

async fn flagged_students(
    State(state): State<AppState>,
) -> Result<Json<FlaggedResponse>, AppError> {
    authorize(&state, View::Faculty)?;
    let students = state.wellness.lock().await.flagged().to_vec();
    Ok(Json(FlaggedResponse { students }))
}

async fn student_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentDetail>, AppError> {
    authorize(&state, View::Faculty)?;
    let detail = state.wellness.lock().await.student_detail(&id)?;
    Ok(Json(detail))
}

async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<NoteResponse>, AppError> {
    let identity = authorize(&state, View::Faculty)?;
    let note = state.wellness.lock().await.add_note(
        &id,
        &req.text,
        Some(&identity.display_name),
        Utc::now(),
    )?;
    Ok(Json(NoteResponse { note }))
}

async fn admin_overview(State(state): State<AppState>) -> Result<Json<AdminOverview>, AppError> {
    authorize(&state, View::Admin)?;
    Ok(Json(AdminOverview {
        organization: state.session.organization(),
        plans: all_plans(),
        members: fixtures::admin_roster(),
    }))
}

// ============================================================
// Chat
// ============================================================

/// Open the session if needed and greet the user on first start
async fn ensure_started(chat: &mut ChatAdapter, identity: &Identity) -> Result<(), ChatError> {
    let fresh = *chat.state() == ChatState::Uninitialized;
    chat.start_session(Vec::new()).await?;
    if fresh {
        chat.push_greeting(system_prompt::greeting(&identity.display_name));
    }
    Ok(())
}

async fn get_chat(State(state): State<AppState>) -> Result<Json<ChatResponse>, AppError> {
    authorize(&state, View::Chatbot)?;
    Ok(Json(state.chat.snapshot().into()))
}

async fn start_chat(State(state): State<AppState>) -> Result<Json<ChatResponse>, AppError> {
    let identity = authorize(&state, View::Chatbot)?;
    match state.chat.try_claim() {
        Ok(mut claim) => ensure_started(&mut claim.adapter, &identity).await?,
        // A reply is streaming, so the session is already open
        Err(ChatError::Busy) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(Json(state.chat.snapshot().into()))
}

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let identity = authorize(&state, View::Chatbot)?;
    if req.text.trim().is_empty() {
        return Err(ChatError::EmptyMessage.into());
    }

    let ChatClaim {
        adapter,
        mut reply_task,
    } = state.chat.try_claim()?;
    let (started_tx, started_rx) = oneshot::channel();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_reply(adapter, identity, req.text, started_tx, tx));
    *reply_task = Some(task.abort_handle());
    drop(reply_task);

    match started_rx.await {
        Ok(Ok(())) => Ok(reply_stream(rx).into_response()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(AppError::Conflict("Chat was reset".to_string())),
    }
}

/// Owns the adapter for one reply; aborting the task abandons the reply
async fn run_reply(
    mut chat: OwnedMutexGuard<ChatAdapter>,
    identity: Identity,
    text: String,
    started: oneshot::Sender<Result<(), ChatError>>,
    updates: mpsc::UnboundedSender<StreamUpdate>,
) {
    if let Err(e) = ensure_started(&mut chat, &identity).await {
        let _ = started.send(Err(e));
        return;
    }
    let _ = started.send(Ok(()));

    let result = chat
        .send_message(&text, move |update| {
            let _ = updates.send(update);
        })
        .await;
    match result {
        Ok(SendOutcome::Completed) => {}
        Ok(SendOutcome::Recovered { error }) => {
            tracing::debug!(error = %error, "Chat reply replaced with apology");
        }
        Err(e) => tracing::error!(error = %e, "Chat send failed"),
    }
}

async fn get_version() -> &'static str {
    concat!("mindsetu ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    /// Not signed in; the client should go to sign-in
    Unauthorized {
        message: String,
        return_to: Option<View>,
    },
    /// Signed in with a role that may not see the view
    Forbidden { redirect: View },
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized {
            message: err.to_string(),
            return_to: None,
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::ProviderUnavailable(_) => AppError::Unavailable(err.to_string()),
            ChatError::Busy => AppError::Conflict(err.to_string()),
            ChatError::EmptyMessage => AppError::BadRequest(err.to_string()),
            ChatError::InvalidState(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<WellnessError> for AppError {
    fn from(err: WellnessError) -> Self {
        match err {
            WellnessError::EmptyNote => AppError::BadRequest(err.to_string()),
            WellnessError::UnknownStudent(_) => AppError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::Unauthorized { message, return_to } => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    redirect: Some(View::Auth.path()),
                    return_to: return_to.map(View::path),
                    ..ErrorResponse::new(message)
                },
            ),
            AppError::Forbidden { redirect } => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    redirect: Some(redirect.path()),
                    ..ErrorResponse::new("Not permitted for this role")
                },
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new(msg)),
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorResponse::new(msg))
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{MockProvider, ScriptedReply};
    use crate::chat::{Sender, APOLOGY_TEXT};
    use crate::identity::{MockIdentityBackend, SessionStore};
    use crate::llm::LlmError;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(provider: Option<Arc<MockProvider>>) -> AppState {
        let session = SessionStore::new(Arc::new(MockIdentityBackend::new()));
        let provider = provider.map(|p| p as Arc<dyn crate::llm::ChatProvider>);
        AppState::new(session, ChatAdapter::new(provider, "test-model", "be kind"))
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn call_json(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, text) = call(state, method, uri, body).await;
        let value = serde_json::from_str(&text).unwrap_or(Value::Null);
        (status, value)
    }

    async fn sign_in_as(state: &AppState, email: &str) {
        let (status, _) = call_json(
            state,
            "POST",
            "/api/auth/sign-in",
            Some(json!({ "email": email, "secret": "password" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_sign_in_returns_to_origin() {
        let state = test_state(None);
        let (status, body) = call_json(
            &state,
            "POST",
            "/api/auth/sign-in",
            Some(json!({
                "email": "faculty@example.com",
                "secret": "password",
                "return_to": "/chatbot"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["identity"]["role"], "faculty");
        assert_eq!(body["organization"]["plan"]["id"], "premium");
        assert_eq!(body["redirect"], "/chatbot");
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let state = test_state(None);
        let (status, body) = call_json(
            &state,
            "POST",
            "/api/auth/sign-in",
            Some(json!({ "email": "nobody@example.com", "secret": "password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
        assert!(state.session.snapshot().identity.is_none());
    }

    #[tokio::test]
    async fn test_guard_applied_to_dashboards() {
        let state = test_state(None);

        let (status, body) = call_json(&state, "GET", "/api/faculty/flagged", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["return_to"], "/faculty");

        sign_in_as(&state, "student@example.com").await;
        let (status, body) = call_json(&state, "GET", "/api/faculty/flagged", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["redirect"], "/student");

        let (status, body) = call_json(&state, "GET", "/api/admin/overview", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["redirect"], "/student");

        let (status, _) = call_json(&state, "GET", "/api/student/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_navigate_decisions() {
        let state = test_state(None);
        let (_, body) = call_json(&state, "GET", "/api/navigate?path=/admin", None).await;
        assert_eq!(body["decision"], "sign_in");
        assert_eq!(body["return_to"], "admin");
        assert_eq!(body["location"], "/auth");

        sign_in_as(&state, "faculty@example.com").await;
        let (_, body) = call_json(&state, "GET", "/api/navigate?path=/admin", None).await;
        assert_eq!(body["decision"], "redirect");
        assert_eq!(body["location"], "/faculty");

        let (_, body) = call_json(&state, "GET", "/api/navigate?path=/nowhere", None).await;
        assert_eq!(body["location"], "/");
    }

    #[tokio::test]
    async fn test_mood_submission_same_day() {
        let state = test_state(None);
        sign_in_as(&state, "student@example.com").await;

        let (status, first) = call_json(
            &state,
            "POST",
            "/api/student/mood",
            Some(json!({ "rating": 2, "journal": "Tired" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["points_awarded"], 5);
        assert_eq!(first["replaced"], false);

        let (_, second) = call_json(
            &state,
            "POST",
            "/api/student/mood",
            Some(json!({ "rating": 5 })),
        )
        .await;
        assert_eq!(second["replaced"], true);
        assert_eq!(second["points_awarded"], 20);

        let (_, dashboard) = call_json(&state, "GET", "/api/student/dashboard", None).await;
        assert_eq!(dashboard["today_mood"]["rating"], 5);
        assert_eq!(dashboard["student"]["wellness_points"], 1275);
        assert_eq!(dashboard["assignment_summary"]["missed"], 1);

        let (status, _) = call_json(
            &state,
            "POST",
            "/api/student/mood",
            Some(json!({ "rating": 9 })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_faculty_notes_use_author_name() {
        let state = test_state(None);
        sign_in_as(&state, "faculty@example.com").await;

        let (status, body) = call_json(
            &state,
            "POST",
            "/api/faculty/students/student001_anon/notes",
            Some(json!({ "text": "Offered tutoring." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["note"]["text"], "Offered tutoring.");
        assert!(body["note"]["author"].as_str().is_some_and(|a| !a.is_empty()));

        let (_, detail) = call_json(&state, "GET", "/api/faculty/students/student001_anon", None).await;
        assert_eq!(detail["notes"].as_array().map(Vec::len), Some(1));

        let (status, _) = call_json(&state, "GET", "/api/faculty/students/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_plans_listed_with_labels() {
        let state = test_state(None);
        let (status, body) = call_json(&state, "GET", "/api/plans", None).await;
        assert_eq!(status, StatusCode::OK);

        let plans = body.as_array().unwrap();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0]["id"], "basic");
        assert_eq!(plans[1]["highlight"], true);
        assert_eq!(plans[1]["feature_labels"].as_array().map(Vec::len), Some(8));
    }

    #[tokio::test]
    async fn test_subscription_updates_plan() {
        let state = test_state(None);

        let (status, _) = call_json(
            &state,
            "POST",
            "/api/subscription",
            Some(json!({ "plan_id": "advanced" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        sign_in_as(&state, "admin@example.com").await;
        let (status, body) = call_json(
            &state,
            "POST",
            "/api/subscription",
            Some(json!({ "plan_id": "advanced" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["organization"]["id"], "org123");
        assert_eq!(body["organization"]["plan"]["id"], "advanced");
        assert_eq!(body["redirect"], "/admin");

        let (status, _) = call_json(
            &state,
            "POST",
            "/api/subscription",
            Some(json!({ "plan_id": "platinum" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sign_up_with_chosen_plan() {
        let state = test_state(None);
        let (status, body) = call_json(
            &state,
            "POST",
            "/api/auth/sign-up",
            Some(json!({
                "organization_name": "Shelbyville College",
                "display_name": "Pat",
                "email": "pat@shelbyville.edu",
                "secret": "hunter2",
                "role": "admin",
                "plan_id": "premium"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["organization"]["name"], "Shelbyville College");
        assert_eq!(body["organization"]["plan"]["id"], "premium");
        assert_eq!(body["redirect"], "/admin");

        let (_, session) = call_json(&state, "GET", "/api/session", None).await;
        assert_eq!(session["organization"]["plan"]["id"], "premium");

        let (status, _) = call_json(
            &state,
            "POST",
            "/api/auth/sign-up",
            Some(json!({
                "organization_name": "",
                "display_name": "Pat",
                "email": "pat@shelbyville.edu",
                "secret": "hunter2",
                "role": "admin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_streams_reply_events() {
        let provider = Arc::new(MockProvider::new());
        provider.queue(ScriptedReply::chunks(&["Hel", "lo"]));
        let state = test_state(Some(provider.clone()));
        sign_in_as(&state, "student@example.com").await;

        let (status, body) = call(
            &state,
            "POST",
            "/api/chat/messages",
            Some(json!({ "text": "Hi there" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let first = body.find("event: delta").unwrap();
        let hel = body.find(r#""text":"Hel""#).unwrap();
        let lo = body.find(r#""text":"lo""#).unwrap();
        let done = body.find("event: done").unwrap();
        assert!(first < hel && hel < lo && lo < done);
        assert!(!body.contains("event: failed"));

        let chat = state.chat.snapshot();
        let messages = &chat.messages;
        assert_eq!(messages[0].sender, Sender::System);
        assert!(messages[0].text.starts_with("Hi "));
        let reply = messages.last().unwrap();
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, "Hello");
        assert!(!reply.streaming);
        assert_eq!(provider.sent_texts(), vec!["Hi there".to_string()]);
    }

    #[tokio::test]
    async fn test_chat_failure_reports_apology() {
        let provider = Arc::new(MockProvider::new());
        provider.queue(ScriptedReply::Stream(vec![
            Ok("Part".to_string()),
            Err(LlmError::network("connection reset")),
        ]));
        let state = test_state(Some(provider));
        sign_in_as(&state, "student@example.com").await;

        let (_, body) = call(
            &state,
            "POST",
            "/api/chat/messages",
            Some(json!({ "text": "Hello?" })),
        )
        .await;
        assert!(body.contains("event: failed"));
        assert!(body.contains(APOLOGY_TEXT));

        let chat = state.chat.snapshot();
        let assistant: Vec<_> = chat
            .messages
            .iter()
            .filter(|m| m.sender == Sender::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].text, APOLOGY_TEXT);
        assert_eq!(chat.state, ChatState::Ready);
    }

    /// Start a reply that never finishes and return once its stream is open
    async fn start_hanging_reply(state: &AppState) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat/messages")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "text": "Anyone there?" }).to_string()))
            .unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut view = state.chat.view.clone();
        view.wait_for(|chat| matches!(chat.state, ChatState::Streaming { .. }))
            .await
            .unwrap();
        response
    }

    #[tokio::test]
    async fn test_chat_busy_while_streaming() {
        let provider = Arc::new(MockProvider::new());
        provider.queue(ScriptedReply::Hang);
        let state = test_state(Some(provider));
        sign_in_as(&state, "student@example.com").await;

        let _reply = start_hanging_reply(&state).await;
        let (status, body) = call_json(
            &state,
            "POST",
            "/api/chat/messages",
            Some(json!({ "text": "Hello again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "A response is still streaming");

        let (status, body) = call_json(&state, "POST", "/api/chat/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["type"], "streaming");
    }

    #[tokio::test]
    async fn test_transcript_readable_while_streaming() {
        let provider = Arc::new(MockProvider::new());
        provider.queue(ScriptedReply::Hang);
        let state = test_state(Some(provider));
        sign_in_as(&state, "student@example.com").await;

        let _reply = start_hanging_reply(&state).await;
        let (status, body) = call_json(&state, "GET", "/api/chat", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["type"], "streaming");

        let messages = body["messages"].as_array().unwrap();
        let open: Vec<_> = messages.iter().filter(|m| m["streaming"] == true).collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0]["sender"], "assistant");
        assert_eq!(open[0]["id"], body["state"]["message_id"]);
    }

    #[tokio::test]
    async fn test_sign_out_not_blocked_by_streaming_reply() {
        let provider = Arc::new(MockProvider::new());
        provider.queue(ScriptedReply::Hang);
        let state = test_state(Some(provider));
        sign_in_as(&state, "student@example.com").await;

        let _reply = start_hanging_reply(&state).await;
        let signed_out = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            call_json(&state, "POST", "/api/auth/sign-out", None),
        )
        .await;
        let (status, _) = signed_out.expect("sign-out waited on the streaming reply");
        assert_eq!(status, StatusCode::OK);

        let chat = state.chat.snapshot();
        assert!(chat.messages.is_empty());
        assert_eq!(chat.state, ChatState::Uninitialized);
        assert!(state.chat.try_claim().is_ok());
    }

    #[tokio::test]
    async fn test_chat_unavailable_without_provider() {
        let state = test_state(None);
        sign_in_as(&state, "student@example.com").await;

        let (status, _) = call_json(&state, "POST", "/api/chat/start", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = call_json(&state, "GET", "/api/chat", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], false);
        assert_eq!(body["state"]["type"], "unavailable");
    }

    #[tokio::test]
    async fn test_sign_out_resets_chat() {
        let provider = Arc::new(MockProvider::new());
        let state = test_state(Some(provider));
        sign_in_as(&state, "student@example.com").await;

        let (status, body) = call_json(&state, "POST", "/api/chat/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));

        let (status, _) = call_json(&state, "POST", "/api/auth/sign-out", None).await;
        assert_eq!(status, StatusCode::OK);

        let chat = state.chat.snapshot();
        assert!(chat.messages.is_empty());
        assert_eq!(chat.state, ChatState::Uninitialized);

        let (_, session) = call_json(&state, "GET", "/api/session", None).await;
        assert!(session["identity"].is_null());
        assert!(session["organization"].is_null());
    }
}
