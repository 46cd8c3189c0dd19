use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
    Form, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::page::{render_page, PageView};
use super::types::{ComebackApiRequest, ComebackApiResponse, ComebackForm};
use super::ServerState;
use crate::comeback::{generate_comeback, ComebackRequest, Intensity, Tone};
use crate::error::LLMError;

/// Maps crate errors onto HTTP status codes
fn status_for(err: &LLMError) -> StatusCode {
    match err {
        LLMError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LLMError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Parses an optional tone/intensity field, falling back to the default when blank
fn parse_choice<T>(value: Option<&str>) -> Result<T, LLMError>
where
    T: std::str::FromStr<Err = LLMError> + Default,
{
    match value.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(v) => v.parse(),
    }
}

/// Serves the empty form
pub async fn handle_index() -> Html<String> {
    Html(render_page(&PageView::default()))
}

/// Handles the HTML form submission
///
/// Re-renders the form with the user's inputs. On success the page also
/// carries the rendered transcript; on failure it carries the error message.
pub async fn handle_form(
    State(state): State<ServerState>,
    Form(form): Form<ComebackForm>,
) -> (StatusCode, Html<String>) {
    let mut view = PageView {
        chat_text: &form.chat_text,
        ..PageView::default()
    };

    let tone = parse_choice::<Tone>(Some(form.tone.as_str()));
    let intensity = parse_choice::<Intensity>(Some(form.intensity.as_str()));
    if let Ok(tone) = &tone {
        view.tone = *tone;
    }
    if let Ok(intensity) = &intensity {
        view.intensity = *intensity;
    }

    let result = match (tone, intensity) {
        (Ok(tone), Ok(intensity)) => {
            let request = ComebackRequest::new(form.chat_text.clone(), tone, intensity);
            generate_comeback(&state.agent, &request).await
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    };

    match result {
        Ok(run) => {
            view.markdown = Some(&run.content);
            (StatusCode::OK, Html(render_page(&view)))
        }
        Err(e) => {
            log::warn!("comeback form request failed: {e}");
            let status = status_for(&e);
            view.error = Some(e.to_string());
            (status, Html(render_page(&view)))
        }
    }
}

/// Handles JSON comeback requests
///
/// # Authentication
/// If the server has an auth key configured, validates the Bearer token in the
/// Authorization header
///
/// # Response Format
/// Returns the Markdown transcript together with the tools the agent used
pub async fn handle_api_comeback(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(req): Json<ComebackApiRequest>,
) -> Result<Json<ComebackApiResponse>, (StatusCode, Json<Value>)> {
    if let Some(key) = &state.auth_key {
        let auth_header = headers
            .get("Authorization")
            .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "Missing authorization"))?;

        let auth_str = auth_header.to_str().map_err(|_| {
            error_body(StatusCode::UNAUTHORIZED, "Invalid authorization header")
        })?;

        if auth_str.strip_prefix("Bearer ") != Some(key.as_str()) {
            return Err(error_body(StatusCode::UNAUTHORIZED, "Invalid API key"));
        }
    }

    let tone: Tone = parse_choice(req.tone.as_deref()).map_err(into_error_body)?;
    let intensity: Intensity = parse_choice(req.intensity.as_deref()).map_err(into_error_body)?;
    let request = ComebackRequest::new(req.chat_text, tone, intensity);

    let run = generate_comeback(&state.agent, &request)
        .await
        .map_err(into_error_body)?;

    Ok(Json(ComebackApiResponse {
        id: format!("comeback-{}", Uuid::new_v4()),
        created: chrono::Utc::now().timestamp(),
        tone,
        intensity,
        markdown: run.content,
        tool_calls: run.tool_calls.into_iter().map(|c| c.function.name).collect(),
    }))
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

fn into_error_body(err: LLMError) -> (StatusCode, Json<Value>) {
    log::warn!("comeback API request failed: {err}");
    error_body(status_for(&err), &err.to_string())
}
