//! Web layer: router, application state and the per-action handlers.
//!
//! One explicit handler per user action, each handled synchronously: one
//! action, one state transition. Sessions ride on a cookie with
//! create-on-first-access semantics.

use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::models::{CapabilityError, ModelProvider};
use crate::session::{Session, SessionStore};
use crate::summary::{self, SummaryLength};

/// Cookie carrying the session id.
const SESSION_COOKIE: &str = "condensa_session";

const TOO_FEW_WORDS: &str = "Please enter at least 50 words for meaningful summarization.";
const EMPTY_QUESTION: &str = "Please enter a question.";
const NO_SUMMARY_YET: &str = "Generate a summary before asking questions.";
const CONTEXT_TOO_SHORT: &str = "The generated summary is too short to answer this question.";

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub models: ModelProvider,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(models: ModelProvider) -> Self {
        Self {
            models,
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

/// Create the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/summarise", post(summarise))
        .route("/answer", post(answer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    summary: Option<String>,
    error: Option<String>,
    answer: Option<AnswerView>,
    length: &'static str,
}

/// A transient Q&A result, rendered once and discarded.
struct AnswerView {
    text: String,
    score: String,
}

impl IndexTemplate {
    fn for_session(session: &Session) -> Self {
        Self {
            summary: session.summary.clone(),
            error: None,
            answer: None,
            length: SummaryLength::default().as_str(),
        }
    }

    fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

fn render(template: IndexTemplate) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| e.to_string()))
}

/// Resolve the session for this request, creating one (and its cookie) on
/// first access.
fn establish_session(state: &AppState, jar: CookieJar) -> (Session, CookieJar) {
    let id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let session = state.sessions.get_or_create(id);

    if id == Some(session.id) {
        return (session, jar);
    }
    let mut cookie = Cookie::new(SESSION_COOKIE, session.id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    let jar = jar.add(cookie);
    (session, jar)
}

async fn health() -> &'static str {
    "ok"
}

async fn index(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (session, jar) = establish_session(&state, jar);
    (jar, render(IndexTemplate::for_session(&session)))
}

#[derive(Debug, Deserialize)]
struct SummariseForm {
    #[serde(default)]
    text: String,
    #[serde(default)]
    length: SummaryLength,
}

async fn summarise(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SummariseForm>,
) -> impl IntoResponse {
    let (session, jar) = establish_session(&state, jar);

    // Validate before any model call
    if summary::word_count(&form.text) < summary::MIN_INPUT_WORDS {
        let page = IndexTemplate {
            length: form.length.as_str(),
            ..IndexTemplate::for_session(&session)
        }
        .with_error(TOO_FEW_WORDS);
        return (jar, render(page));
    }

    let page = match summary::generate_summary(
        state.models.summarizer.as_ref(),
        &form.text,
        form.length,
    )
    .await
    {
        Ok(text) => {
            state.sessions.set_summary(session.id, text.clone());
            IndexTemplate {
                summary: Some(text),
                error: None,
                answer: None,
                length: form.length.as_str(),
            }
        }
        Err(e) => {
            warn!(error = %e, "summary generation failed");
            // The previous summary, if any, stays in place
            IndexTemplate {
                length: form.length.as_str(),
                ..IndexTemplate::for_session(&session)
            }
            .with_error(format!("Error generating summary: {e}"))
        }
    };
    (jar, render(page))
}

#[derive(Debug, Deserialize)]
struct AnswerForm {
    #[serde(default)]
    question: String,
}

async fn answer(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AnswerForm>,
) -> impl IntoResponse {
    let (session, jar) = establish_session(&state, jar);

    let Some(context) = session.summary.clone() else {
        let page = IndexTemplate::for_session(&session).with_error(NO_SUMMARY_YET);
        return (jar, render(page));
    };

    let question = form.question.trim();
    if question.is_empty() {
        let page = IndexTemplate::for_session(&session).with_error(EMPTY_QUESTION);
        return (jar, render(page));
    }

    let page = match state.models.qa.answer(question, &context).await {
        Ok(result) => IndexTemplate {
            summary: Some(context),
            error: None,
            answer: Some(AnswerView {
                text: result.text,
                score: format!("{:.2}", result.score),
            }),
            length: SummaryLength::default().as_str(),
        },
        Err(CapabilityError::ContextTooShort) => {
            IndexTemplate::for_session(&session).with_error(CONTEXT_TOO_SHORT)
        }
        Err(e) => {
            warn!(error = %e, "question answering failed");
            IndexTemplate::for_session(&session)
                .with_error(format!("Error processing question: {e}"))
        }
    };
    (jar, render(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, QuestionAnswerer, Summarizer};
    use crate::summary::LengthBounds;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubSummarizer {
        calls: Mutex<Vec<LengthBounds>>,
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(
            &self,
            _text: &str,
            bounds: LengthBounds,
        ) -> Result<String, CapabilityError> {
            self.calls.lock().unwrap().push(bounds);
            Ok(format!(
                "stub summary #{}",
                self.calls.lock().unwrap().len()
            ))
        }
    }

    enum QaBehaviour {
        Answer(Answer),
        ContextTooShort,
        Fail,
    }

    struct StubAnswerer {
        behaviour: QaBehaviour,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubAnswerer {
        fn new(behaviour: QaBehaviour) -> Self {
            Self {
                behaviour,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuestionAnswerer for StubAnswerer {
        async fn answer(&self, question: &str, context: &str) -> Result<Answer, CapabilityError> {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), context.to_string()));
            match &self.behaviour {
                QaBehaviour::Answer(answer) => Ok(answer.clone()),
                QaBehaviour::ContextTooShort => Err(CapabilityError::ContextTooShort),
                QaBehaviour::Fail => {
                    Err(CapabilityError::RequestFailed("boom".to_string()))
                }
            }
        }
    }

    fn test_app(qa: QaBehaviour) -> (Router, Arc<StubSummarizer>, Arc<StubAnswerer>) {
        let summarizer = Arc::new(StubSummarizer::default());
        let answerer = Arc::new(StubAnswerer::new(qa));
        let state = AppState::new(ModelProvider::new(summarizer.clone(), answerer.clone()));
        (router(state), summarizer, answerer)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, cookie, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn form_post(uri: &str, body: String, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[tokio::test]
    async fn fresh_session_has_no_qa_section() {
        let (app, _, _) = test_app(QaBehaviour::Fail);
        let (status, cookie, body) =
            send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cookie.is_some(), "first access sets the session cookie");
        assert!(!body.contains("Generated Summary"));
        assert!(!body.contains("Get Answer"));
    }

    #[tokio::test]
    async fn short_input_is_rejected_without_a_model_call() {
        let (app, summarizer, _) = test_app(QaBehaviour::Fail);
        let body = format!("text={}&length=long", words(10).replace(' ', "+"));
        let (status, _, page) = send(&app, form_post("/summarise", body, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains(TOO_FEW_WORDS));
        assert!(summarizer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_input_is_summarised_with_preset_bounds() {
        let (app, summarizer, _) = test_app(QaBehaviour::Fail);
        let body = format!("text={}&length=medium", words(60).replace(' ', "+"));
        let (status, _, page) = send(&app, form_post("/summarise", body, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("Generated Summary"));
        assert!(page.contains("stub summary #1"));
        assert_eq!(
            *summarizer.calls.lock().unwrap(),
            vec![LengthBounds {
                min_length: 80,
                max_length: 250
            }]
        );
    }

    #[tokio::test]
    async fn regeneration_overwrites_the_stored_summary() {
        let (app, _, _) = test_app(QaBehaviour::Fail);
        let body = format!("text={}&length=short", words(60).replace(' ', "+"));
        let (_, cookie, _) = send(&app, form_post("/summarise", body.clone(), None)).await;
        let cookie = cookie.unwrap();
        let (_, _, page) = send(&app, form_post("/summarise", body, Some(&cookie))).await;
        assert!(page.contains("stub summary #2"));
        assert!(!page.contains("stub summary #1"));
    }

    #[tokio::test]
    async fn empty_question_is_rejected_without_a_model_call() {
        let (app, _, answerer) = test_app(QaBehaviour::Fail);
        let body = format!("text={}&length=medium", words(60).replace(' ', "+"));
        let (_, cookie, _) = send(&app, form_post("/summarise", body, None)).await;
        let cookie = cookie.unwrap();

        let (_, _, page) =
            send(&app, form_post("/answer", "question=".to_string(), Some(&cookie))).await;
        assert!(page.contains(EMPTY_QUESTION));
        assert!(answerer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn question_is_answered_against_the_stored_summary() {
        let (app, _, answerer) = test_app(QaBehaviour::Answer(Answer {
            text: "X".to_string(),
            score: 0.87,
        }));
        let body = format!("text={}&length=medium", words(60).replace(' ', "+"));
        let (_, cookie, _) = send(&app, form_post("/summarise", body, None)).await;
        let cookie = cookie.unwrap();

        let (_, _, page) = send(
            &app,
            form_post(
                "/answer",
                "question=What+was+the+main+conclusion%3F".to_string(),
                Some(&cookie),
            ),
        )
        .await;
        assert!(page.contains("Answer:"));
        assert!(page.contains("X"));
        assert!(page.contains("Confidence score: 0.87"));

        let calls = answerer.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "What was the main conclusion?".to_string(),
                "stub summary #1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn too_short_context_gets_the_tailored_message() {
        let (app, _, _) = test_app(QaBehaviour::ContextTooShort);
        let body = format!("text={}&length=medium", words(60).replace(' ', "+"));
        let (_, cookie, _) = send(&app, form_post("/summarise", body, None)).await;
        let cookie = cookie.unwrap();

        let (_, _, page) = send(
            &app,
            form_post("/answer", "question=why%3F".to_string(), Some(&cookie)),
        )
        .await;
        assert!(page.contains(CONTEXT_TOO_SHORT));
        assert!(!page.contains("Answer:"));
    }

    #[tokio::test]
    async fn other_qa_failures_get_the_generic_message() {
        let (app, _, _) = test_app(QaBehaviour::Fail);
        let body = format!("text={}&length=medium", words(60).replace(' ', "+"));
        let (_, cookie, _) = send(&app, form_post("/summarise", body, None)).await;
        let cookie = cookie.unwrap();

        let (_, _, page) = send(
            &app,
            form_post("/answer", "question=why%3F".to_string(), Some(&cookie)),
        )
        .await;
        assert!(page.contains("Error processing question:"));
    }

    #[tokio::test]
    async fn question_without_a_summary_is_refused() {
        let (app, _, answerer) = test_app(QaBehaviour::Fail);
        let (_, _, page) =
            send(&app, form_post("/answer", "question=why%3F".to_string(), None)).await;
        assert!(page.contains(NO_SUMMARY_YET));
        assert!(answerer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let (app, _, _) = test_app(QaBehaviour::Fail);
        let (status, _, body) =
            send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
