use chrono::{DateTime, Utc};

/// A marketplace event.
///
/// Events are immutable facts. They are cloned once per subscriber, so keep
/// payloads small.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "market.order.placed").
    fn event_type(&self) -> &'static str;

    /// When the event occurred (wall clock).
    fn occurred_at(&self) -> DateTime<Utc>;
}
