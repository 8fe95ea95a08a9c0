use crate::common::MAPSIFT_EVENT;
use crate::errors::{ErrorKind, MapsiftError, MapsiftResult};
use crate::feature::CollectionEventListener;
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::error::Error;
use std::marker::PhantomData;
use std::sync::Arc;

/// Trait for types that publish collection events to subscribers.
pub trait EventAware {
    // NOTE: impl closures cannot be used directly to keep this object safe
    fn subscribe(&self, handler: CollectionEventListener) -> MapsiftResult<Option<SubscriberRef>>;

    fn unsubscribe(&self, subscriber: SubscriberRef) -> MapsiftResult<()>;
}

/// Publishes and subscribes to events in the mapsift system.
///
/// This struct manages an event bus that allows components to register
/// listeners and receive notifications about collection changes. Handlers
/// run inline on the publishing thread; the engine relies on this to keep
/// index maintenance synchronous with collection mutations.
///
/// # Responsibilities
///
/// * **Event Publishing**: Broadcasts events to all registered listeners
/// * **Listener Registration**: Registers event handlers to receive notifications
/// * **Listener Deregistration**: Removes previously registered event handlers
/// * **Performance Optimization**: Fast path for no-listener scenarios
///
/// # Example
///
/// ```ignore
/// let event_bus: MapsiftEventBus<E, L> = MapsiftEventBus::new();
/// let subscriber = event_bus.register(listener)?;
/// event_bus.publish(my_event)?;
/// event_bus.deregister(subscriber)?;
/// ```
#[derive(Clone)]
pub struct MapsiftEventBus<E, L> {
    inner: Arc<MapsiftEventBusInner<E, L>>,
}

impl<E, L> Default for MapsiftEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> MapsiftEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        let inner = MapsiftEventBusInner::new();
        MapsiftEventBus {
            inner: Arc::new(inner),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: L) -> MapsiftResult<Option<SubscriberRef>> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered event listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> MapsiftResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: E) -> MapsiftResult<()> {
        self.inner.publish(event)
    }

    /// Closes the event bus and clears all registered listeners.
    pub fn close(&self) -> MapsiftResult<()> {
        self.inner.close()
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

/// Inner implementation of the event bus.
struct MapsiftEventBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> MapsiftEventBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        let event_bus = EventBus::new();
        MapsiftEventBusInner {
            event_bus,
            phantom_data: PhantomData,
        }
    }

    pub fn register(&self, listener: L) -> MapsiftResult<Option<SubscriberRef>> {
        let subscriber = self.event_bus.subscribe(MAPSIFT_EVENT, Box::new(listener));
        match subscriber {
            Ok(subscriber) => Ok(Some(SubscriberRef::new(subscriber))),
            Err(e) => Err(Self::bus_error(e)),
        }
    }

    #[inline]
    pub fn deregister(&self, subscriber: SubscriberRef) -> MapsiftResult<()> {
        match self.event_bus.unsubscribe(MAPSIFT_EVENT, &subscriber.inner) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::bus_error(e)),
        }
    }

    #[inline]
    pub fn publish(&self, event: E) -> MapsiftResult<()> {
        // Fast path: check if there are listeners before creating event
        let handler_count = match self.event_bus.get_handler_count(MAPSIFT_EVENT) {
            Ok(count) => count,
            Err(e) => {
                // If event type not found, no listeners - early return
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    return Ok(());
                }
                return Err(Self::bus_error(e));
            }
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        match self.event_bus.publish(MAPSIFT_EVENT, &basu_event) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::bus_error(e)),
        }
    }

    #[inline]
    pub fn close(&self) -> MapsiftResult<()> {
        match self.event_bus.clear() {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::bus_error(e)),
        }
    }

    #[inline]
    pub fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(MAPSIFT_EVENT) {
            Ok(count) => count > 0,
            Err(e) => {
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    false
                } else {
                    log::warn!("Failed to check listeners: {}, defaulting to false", e);
                    false
                }
            }
        }
    }

    #[inline]
    pub fn bus_error(e: BasuError) -> MapsiftError {
        match e {
            BasuError::EventTypeNotFOUND => MapsiftError::new(
                "Event bus error: the requested event type is not registered",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => MapsiftError::new(
                "Event bus error: internal mutex poisoned - the event bus may be in an inconsistent state",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Unknown error in event handler".to_string());
                MapsiftError::new(
                    &format!("Event handler error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basu::event::Event;
    use std::sync::Arc;

    #[derive(Clone)]
    struct MockListener;

    impl Handle<Event<&str>> for MockListener {
        fn handle(&self, _event: &Event<Event<&str>>) -> Result<(), BasuError> {
            Ok(())
        }
    }

    #[test]
    fn test_event_bus_new() {
        let event_bus: MapsiftEventBus<Event<&str>, MockListener> = MapsiftEventBus::new();
        assert!(Arc::strong_count(&event_bus.inner) > 0);
    }

    #[test]
    fn test_event_bus_register_and_deregister() {
        let event_bus: MapsiftEventBus<Event<&str>, MockListener> = MapsiftEventBus::new();
        let subscriber = event_bus.register(MockListener).unwrap().unwrap();
        assert!(event_bus.has_listeners());
        event_bus.deregister(subscriber).unwrap();
    }

    #[test]
    fn test_event_bus_publish_without_listeners() {
        let event_bus: MapsiftEventBus<Event<&str>, MockListener> = MapsiftEventBus::new();
        // no listeners registered; publish is a no-op
        assert!(event_bus.publish(Event::new("hello")).is_ok());
    }

    #[test]
    fn test_event_bus_close() {
        let event_bus: MapsiftEventBus<Event<&str>, MockListener> = MapsiftEventBus::new();
        event_bus.register(MockListener).unwrap();
        assert!(event_bus.close().is_ok());
        assert!(!event_bus.has_listeners());
    }
}
