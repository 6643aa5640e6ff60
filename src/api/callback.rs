use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension,
    extract::Query,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tokio::sync::Mutex;

use crate::types::AuthSession;

const SUCCESS_PAGE: &str = r#"<html><body style="font-family: -apple-system, BlinkMacSystemFont, sans-serif;
    display: flex; justify-content: center; align-items: center; height: 100vh;
    background: linear-gradient(135deg, #1DB954, #191414);">
    <div style="text-align: center; color: white;">
        <h1>&#127911; Success!</h1>
        <p>You can close this window and return to the terminal.</p>
    </div>
</body></html>"#;

const FAILURE_PAGE: &str =
    "<html><body><h2>Authorization failed.</h2><p>Return to the terminal for details.</p></body></html>";

const ALREADY_SERVED_PAGE: &str =
    "<html><body><h4>This authorization request was already handled.</h4></body></html>";

/// Handles the single OAuth redirect.
///
/// Takes the session's responder, hands it the captured code (or `None`) and
/// answers with a confirmation page. Nothing about the request is logged.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(session): Extension<Arc<Mutex<AuthSession>>>,
) -> Response {
    let mut session = session.lock().await;

    let Some(responder) = session.responder.take() else {
        return page(StatusCode::GONE, ALREADY_SERVED_PAGE);
    };

    let state_matches = match &session.expected_state {
        Some(expected) => params.get("state") == Some(expected),
        None => true,
    };

    let code = params
        .get("code")
        .filter(|code| !code.is_empty() && state_matches && !params.contains_key("error"))
        .cloned();

    let status = if code.is_some() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    let _ = responder.send(code);

    match status {
        StatusCode::OK => page(status, SUCCESS_PAGE),
        _ => page(status, FAILURE_PAGE),
    }
}

fn page(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONNECTION, "close")], Html(body)).into_response()
}
