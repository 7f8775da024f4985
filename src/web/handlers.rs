use std::{collections::HashMap, convert::Infallible, sync::Arc};

use serde::Serialize;
use serde_json::{json, Map, Value};
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
};

use crate::{
    core::{
        dashboard::DashboardFilter,
        readiness::Readiness,
        service::{
            ApprovePaymentRequest, CheckinService, RecordTarget, SetGamesRequest,
            SetMemberRequest, ToggleRequest,
        },
        sync::SyncRequest,
    },
    error::{CheckinError, CheckinResult},
};

fn error_reply(err: &CheckinError) -> WithStatus<Json> {
    log::warn!("{}", err);
    warp::reply::with_status(
        warp::reply::json(&json!({
            "error": err.kind(),
            "message": err.to_string(),
            "field": err.field(),
        })),
        err.status_code(),
    )
}

pub fn to_http_output<T: Serialize>(
    result: CheckinResult<T>,
) -> Result<WithStatus<Json>, Infallible> {
    match result {
        Ok(data) => Ok(warp::reply::with_status(
            warp::reply::json(&data),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(&e)),
    }
}

/// Decode a percent-encoded path segment. `+` is kept literally.
fn decode_segment(raw: &str) -> String {
    let escaped = format!("v={}", raw.replace('+', "%2B").replace('&', "%26"));
    url::form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

fn query_value<'a>(args: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    args.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_filter(args: &HashMap<String, String>) -> CheckinResult<DashboardFilter> {
    let status = match query_value(args, "status") {
        None => None,
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => Some(Readiness::parse(s).ok_or_else(|| {
            CheckinError::validation("status", format!("Unknown status '{}'", s))
        })?),
    };

    Ok(DashboardFilter {
        status,
        search: query_value(args, "search").map(str::to_string),
    })
}

/// Public status lookup. Unknown participants and store failures still produce a
/// body the status page can render, marked distinctly from "Pending".
pub async fn get_participant_status(
    name: String,
    args: HashMap<String, String>,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    let name = decode_segment(&name);
    match service
        .participant_status(&name, query_value(&args, "slug"))
        .await
    {
        Ok(report) => Ok(warp::reply::with_status(
            warp::reply::json(&report),
            StatusCode::OK,
        )),
        Err(
            e @ (CheckinError::Unavailable(_)
            | CheckinError::Misconfigured
            | CheckinError::NotFound(_)),
        ) => {
            let status = match e {
                CheckinError::Misconfigured => "Misconfigured",
                CheckinError::NotFound(_) => "NotFound",
                _ => "Unavailable",
            };
            log::warn!("Status for '{}' is {}: {}", name, status, e);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({
                    "name": name,
                    "ready": false,
                    "status": status,
                    "missing": [],
                    "message": e.to_string(),
                })),
                e.status_code(),
            ))
        }
        Err(e) => Ok(error_reply(&e)),
    }
}

pub async fn get_health(service: Arc<CheckinService>) -> Result<WithStatus<Json>, Infallible> {
    let health = service.health().await;
    Ok(warp::reply::with_status(
        warp::reply::json(&health),
        StatusCode::OK,
    ))
}

pub async fn get_requirements(
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.requirements().await)
}

pub async fn get_checkins(
    args: HashMap<String, String>,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    let result = match parse_filter(&args) {
        Ok(filter) => {
            service
                .dashboard(query_value(&args, "slug"), &filter)
                .await
        }
        Err(e) => Err(e),
    };
    to_http_output(result)
}

pub async fn get_stats(
    args: HashMap<String, String>,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.stats(query_value(&args, "slug")).await)
}

pub async fn get_event_slugs(
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.event_slugs().await)
}

pub async fn get_players(service: Arc<CheckinService>) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.players().await)
}

/// Archived events. `?view=dashboard` reads the dashboard's denormalized table.
pub async fn get_event_history(
    args: HashMap<String, String>,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    let result = match query_value(&args, "view") {
        None | Some("archive") => service.event_history(false).await,
        Some("dashboard") => service.event_history(true).await,
        Some(other) => Err(CheckinError::validation(
            "view",
            format!("Unknown history view '{}'", other),
        )),
    };
    to_http_output(result)
}

pub async fn get_tournament_events(
    slug: String,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    let slug = decode_segment(&slug);
    let events = service.tournament_events(&slug).await;
    to_http_output(Ok(json!({ "slug": slug, "events": events })))
}

pub async fn notify_checkin(
    payload: Map<String, Value>,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.notify_checkin(payload).await)
}

pub async fn toggle_field(
    request: ToggleRequest,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.toggle_field(request).await)
}

pub async fn approve_payment(
    request: ApprovePaymentRequest,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.approve_payment(request).await)
}

pub async fn delete_checkin(
    target: RecordTarget,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.delete_checkin(target).await)
}

pub async fn set_games(
    request: SetGamesRequest,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.set_games(request).await)
}

pub async fn set_member(
    request: SetMemberRequest,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.set_member(request).await)
}

pub async fn sync_settings(
    request: SyncRequest,
    service: Arc<CheckinService>,
) -> Result<WithStatus<Json>, Infallible> {
    to_http_output(service.sync_active_event(&request.link).await)
}
