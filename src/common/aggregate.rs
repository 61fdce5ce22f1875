use crate::common::{DomainEvent, DomainResult, EventEnvelope, EventMetadata, EventSink};
use serde::{Deserialize, Serialize};

pub trait AggregateRoot: Send + Sync + Clone {
    type Event: DomainEvent + Serialize + for<'de> Deserialize<'de>;

    const AGGREGATE_TYPE: &'static str;

    fn aggregate_id(&self) -> &str;
    fn version(&self) -> u64;

    /// Apply an event to update the aggregate state
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()>;

    /// Get uncommitted events
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Mark events as committed
    fn mark_events_as_committed(&mut self);

    /// Add a new event to the uncommitted events list
    fn add_event(&mut self, event: Self::Event);
}

/// Wraps every uncommitted event of `aggregate` in an envelope, hands it to
/// `sink` and marks the events as committed. Returns the number published.
pub fn publish_uncommitted<T: AggregateRoot>(
    aggregate: &mut T,
    sink: &mut dyn EventSink,
    metadata: &EventMetadata,
) -> Result<usize, String> {
    let published = publish_events(aggregate.uncommitted_events(), T::AGGREGATE_TYPE, sink, metadata)?;
    aggregate.mark_events_as_committed();
    Ok(published)
}

pub fn publish_events<E: DomainEvent + Serialize>(
    events: &[E],
    aggregate_type: &str,
    sink: &mut dyn EventSink,
    metadata: &EventMetadata,
) -> Result<usize, String> {
    for event in events {
        let envelope = EventEnvelope::new(event, aggregate_type, metadata.clone())
            .map_err(|e| e.to_string())?;
        sink.publish(envelope)?;
    }
    Ok(events.len())
}
