//! HTTP server
//!
//! axum router and handlers for the poll API. Rejections are plain-text 400
//! bodies whose wording existing consumers depend on, so request bodies are
//! taken as raw JSON and validated field by field; the offending value is
//! interpolated into the message the way the previous server did it.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::polls::{CreateOutcome, PollError, PollStore};

/// Build the poll API router with shared store state.
pub fn router(store: Arc<PollStore>) -> Router {
    Router::new()
        .route("/api/add", post(add_poll))
        .route("/api/list", get(list_polls))
        .route("/api/vote", post(cast_vote))
        .route("/api/result", get(poll_result))
        .route("/api/clear", get(clear_polls))
        .with_state(store)
}

fn bad_request(reason: String) -> Response {
    debug!(%reason, "request rejected");
    (StatusCode::BAD_REQUEST, reason).into_response()
}

/// Render a JSON value the way JS template interpolation would: strings
/// unquoted, a missing field as `undefined`, arrays comma-joined, integral
/// floats without the trailing `.0`.
fn js_display(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| js_display(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Non-empty string field, or None.
fn string_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// `POST /api/add` with `{name, minutes, options}`.
async fn add_poll(State(store): State<Arc<PollStore>>, Json(body): Json<Value>) -> Response {
    let Some(name) = string_field(&body, "name") else {
        return bad_request(PollError::InvalidName.to_string());
    };
    // The duplicate check comes before the rest of the validation: a
    // replayed create answers `added: false` even if its other fields are
    // malformed.
    if store.contains(name) {
        return Json(json!({ "added": false })).into_response();
    }

    let Some(minutes) = body.get("minutes").and_then(Value::as_f64) else {
        return bad_request(format!(
            "'minutes' is not a number: {}",
            js_display(body.get("minutes"))
        ));
    };
    if minutes < 1.0 || minutes.fract() != 0.0 {
        return bad_request(format!(
            "'minutes' is not a positive integer: {}",
            js_display(body.get("minutes"))
        ));
    }

    let options: Vec<String> = match body.get("options") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => js_display(Some(other)),
            })
            .collect(),
        _ => return bad_request("\"options\" is not an array".to_string()),
    };
    if options.len() < 2 {
        return bad_request(PollError::TooFewOptions(options.len()).to_string());
    }

    match store.create(name, minutes as i64, options) {
        Ok(CreateOutcome::Added(poll)) => {
            info!(poll = %poll.name, end_time = poll.end_time, "poll created");
            Json(json!({ "added": true, "poll": poll })).into_response()
        }
        Ok(CreateOutcome::Duplicate) => Json(json!({ "added": false })).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

/// `GET /api/list`. Open polls closing soonest first, then closed polls most
/// recently closed first.
async fn list_polls(State(store): State<Arc<PollStore>>) -> Json<Value> {
    Json(json!({ "polls": store.list() }))
}

/// `POST /api/vote` with `{name, voterName, option}`. A repeat vote by the
/// same voter replaces the earlier one.
async fn cast_vote(State(store): State<Arc<PollStore>>, Json(body): Json<Value>) -> Response {
    let Some(name) = string_field(&body, "name") else {
        return bad_request(PollError::InvalidName.to_string());
    };
    if !store.contains(name) {
        return bad_request(PollError::UnknownPoll(name.to_string()).to_string());
    }
    let Some(voter) = string_field(&body, "voterName") else {
        return bad_request(PollError::InvalidVoter.to_string());
    };
    let Some(option) = body.get("option").and_then(Value::as_str) else {
        return bad_request(PollError::InvalidOption.to_string());
    };

    match store.vote(name, voter, option) {
        Ok(replaced) => {
            debug!(poll = %name, voter = %voter, replaced, "vote recorded");
            Json(json!({ "replaced": replaced })).into_response()
        }
        Err(err) => bad_request(err.to_string()),
    }
}

/// `GET /api/result?name=...`. Counts per option plus a `"total"` key.
async fn poll_result(
    State(store): State<Arc<PollStore>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(name) = params.get("name") else {
        return bad_request("missing \"name\" parameter".to_string());
    };
    match store.tally(name) {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

/// `GET /api/clear`. Drops every poll and every ballot.
async fn clear_polls(State(store): State<Arc<PollStore>>) -> Json<Value> {
    store.clear();
    info!("all polls cleared");
    Json(json!({ "clear": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_display_matches_template_interpolation() {
        assert_eq!(js_display(None), "undefined");
        assert_eq!(js_display(Some(&json!(null))), "null");
        assert_eq!(js_display(Some(&json!("2"))), "2");
        assert_eq!(js_display(Some(&json!(3.1))), "3.1");
        assert_eq!(js_display(Some(&json!(-1))), "-1");
        assert_eq!(js_display(Some(&json!(true))), "true");
        assert_eq!(js_display(Some(&json!(["a", 1]))), "a,1");
        assert_eq!(js_display(Some(&json!({"k": 1}))), "[object Object]");
    }
}
