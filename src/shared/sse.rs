use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use crate::modules::datastore::Subscription;

/// Latest snapshot only; a reader that falls behind skips straight to the newest one.
fn latest_snapshots<T>(rx: watch::Receiver<Option<T>>) -> impl Stream<Item = T>
where
    T: Clone + Send + Sync + 'static,
{
    WatchStream::new(rx).filter_map(|snapshot| snapshot)
}

/// Turn a live collection subscription into a server-sent event stream.
///
/// The subscription callback publishes into `rx` with `send_replace`. Each
/// snapshot becomes one `event` with the JSON payload. The subscription
/// lives as long as the stream, so a disconnecting client stops delivery.
pub fn snapshot_stream<T>(
    name: &'static str,
    rx: watch::Receiver<Option<T>>,
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    let stream = latest_snapshots(rx).map(move |snapshot| {
        let _subscription = &subscription;
        let event = Event::default()
            .event(name)
            .json_data(&snapshot)
            .unwrap_or_else(|e| {
                tracing::error!("Failed to encode {} snapshot: {}", name, e);
                Event::default().event("error").data("encoding failed")
            });
        Ok::<_, Infallible>(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
