use std::{collections::HashMap, sync::Arc};

use warp::{reject::Rejection, Filter};

use crate::core::service::CheckinService;

use super::{
    filters::with_service,
    handlers::{
        get_checkins, get_event_history, get_event_slugs, get_players, get_requirements,
        get_stats,
    },
};

/// Read-only routes backing the operator dashboard.
pub fn dashboard_filters(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let requirements = warp::path!("api" / "requirements")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(get_requirements);

    let checkins = warp::path!("api" / "checkins")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_service(service.clone()))
        .and_then(get_checkins);

    let stats = warp::path!("api" / "stats")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_service(service.clone()))
        .and_then(get_stats);

    let event_slugs = warp::path!("api" / "event-slugs")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(get_event_slugs);

    let players = warp::path!("api" / "players")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(get_players);

    let event_history = warp::path!("api" / "event-history")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_service(service))
        .and_then(get_event_history);

    requirements
        .or(checkins)
        .or(stats)
        .or(event_slugs)
        .or(players)
        .or(event_history)
}
