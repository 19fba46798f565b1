//! Event collection helpers

use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use uframe_async::Event;

/// Drain every event already sent on `events`, waiting at most `idle` for
/// each next one
pub async fn drain_events(events: &mut Receiver<Event>, idle: Duration) -> Vec<Event> {
    let mut collected = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(idle, events.recv()).await {
        collected.push(event);
    }
    collected
}

/// Number of events matching `predicate`
pub fn count_events(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|e| predicate(e)).count()
}
