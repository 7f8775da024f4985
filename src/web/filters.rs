use std::{collections::HashMap, convert::Infallible, sync::Arc};

use warp::{reject::Rejection, Filter};

use crate::core::service::CheckinService;

use super::{
    dashboard::dashboard_filters,
    handlers::{
        approve_payment, delete_checkin, get_health, get_participant_status,
        get_tournament_events, notify_checkin, set_games, set_member, sync_settings, toggle_field,
    },
    streams::stream_filters,
};

pub fn with_service(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (Arc<CheckinService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn public_filters(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(get_health);

    let status = warp::path!("api" / "participant" / String / "status")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_service(service.clone()))
        .and_then(get_participant_status);

    let tournament_events = warp::path!("api" / "tournament" / String / "events")
        .and(warp::get())
        .and(with_service(service))
        .and_then(get_tournament_events);

    health.or(status).or(tournament_events)
}

/// Routes that change check-ins or settings. Each successful call broadcasts once.
fn mutation_filters(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let notify = warp::path!("api" / "checkins" / "notify")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(notify_checkin);

    let toggle = warp::path!("api" / "checkins" / "toggle")
        .and(warp::patch())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(toggle_field);

    let delete = warp::path!("api" / "checkins")
        .and(warp::delete())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(delete_checkin);

    let approve = warp::path!("api" / "payment" / "approve")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(approve_payment);

    let games = warp::path!("api" / "player" / "games")
        .and(warp::patch())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(set_games);

    let member = warp::path!("api" / "player" / "member")
        .and(warp::patch())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(set_member);

    let sync = warp::path!("api" / "settings" / "sync")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service))
        .and_then(sync_settings);

    notify
        .or(toggle)
        .or(delete)
        .or(approve)
        .or(games)
        .or(member)
        .or(sync)
}

pub fn api_filters(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    public_filters(service.clone())
        .or(dashboard_filters(service.clone()))
        .or(mutation_filters(service.clone()))
        .or(stream_filters(service))
}
