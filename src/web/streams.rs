use std::{convert::Infallible, sync::Arc, time::Duration};

use futures::{stream, Stream};
use warp::{reject::Rejection, sse::Event, Filter};

use crate::core::{
    hub::{Delivery, Subscription},
    service::CheckinService,
};

use super::filters::with_service;

fn to_sse_event(delivery: Delivery) -> Event {
    match delivery {
        Delivery::Message(message) => Event::default()
            .event(message.event)
            .data(message.data.to_string()),
        Delivery::KeepAlive => Event::default().comment("keep-alive"),
    }
}

/// Turn a hub subscription into an SSE event stream.
///
/// The stream ends when the hub evicts the subscriber. Dropping the stream (client
/// gone) drops the subscription, which deregisters it.
pub fn subscription_stream(
    subscription: Subscription,
    idle: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    stream::unfold(subscription, move |mut sub| async move {
        let delivery = sub.next(idle).await?;
        Some((Ok(to_sse_event(delivery)), sub))
    })
}

async fn open_event_stream(service: Arc<CheckinService>) -> Result<impl warp::Reply, Infallible> {
    let subscription = service.hub.subscribe();
    log::debug!("Opened event stream for subscriber {}", subscription.id());
    Ok(warp::sse::reply(subscription_stream(
        subscription,
        service.keepalive,
    )))
}

pub fn stream_filters(
    service: Arc<CheckinService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "events" / "stream")
        .and(warp::get())
        .and(with_service(service))
        .and_then(open_event_stream)
}
