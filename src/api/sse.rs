//! Server-Sent Events for streamed chat replies

use crate::chat::StreamUpdate;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Stream chat updates until the sender side closes
pub fn reply_stream(
    updates: UnboundedReceiver<StreamUpdate>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = UnboundedReceiverStream::new(updates).map(|update| Ok(update_to_event(&update)));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn update_to_event(update: &StreamUpdate) -> Event {
    let event_type = match update {
        StreamUpdate::Delta(_) => "delta",
        StreamUpdate::Done => "done",
        StreamUpdate::Failed { .. } => "failed",
    };
    let data = json!({
        "text": update.text(),
        "final": update.is_final(),
    });

    Event::default().event(event_type).data(data.to_string())
}
