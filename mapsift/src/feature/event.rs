use crate::common::current_time_millis;
use crate::errors::MapsiftResult;
use crate::feature::Feature;
use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use std::fmt::Debug;
use std::sync::Arc;

/// Event types that can occur on a feature collection.
///
/// # Variants
/// - `Add`: a feature was added to the collection
/// - `Remove`: a feature was removed from the collection
/// - `Reset`: the collection contents were replaced wholesale
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvents {
    Add,
    Remove,
    Reset,
}

/// Information about a collection event that occurred.
///
/// Event listeners receive `CollectionEventInfo` instances when features are
/// added, removed, or the collection is reset. Handlers run inline on the
/// mutating thread, so index maintenance stays synchronous with the
/// mutation that caused it.
///
/// # Characteristics
/// - **Cloneable**: thread-safe sharing via Arc
/// - **Immutable item**: the feature is captured at event time (None for Reset)
/// - **Timestamped**: each event records its creation time automatically
#[derive(Clone)]
pub struct CollectionEventInfo {
    /// Arc-wrapped implementation pointer (opaque to users)
    inner: Arc<CollectionEventInner>,
}

impl CollectionEventInfo {
    /// Creates a new collection event.
    ///
    /// # Arguments
    ///
    /// * `item` - The feature associated with this event (None for Reset)
    /// * `event_type` - The type of event (Add, Remove, Reset)
    /// * `originator` - A string identifying the source of this event,
    ///   usually the collection name
    pub fn new(item: Option<Feature>, event_type: CollectionEvents, originator: String) -> Self {
        CollectionEventInfo {
            inner: Arc::new(CollectionEventInner::new(item, event_type, originator)),
        }
    }

    /// Returns the type of event (Add, Remove, Reset).
    pub fn event_type(&self) -> CollectionEvents {
        self.inner.event_type.clone()
    }

    /// Returns the feature associated with this event, if any.
    pub fn item(&self) -> Option<Feature> {
        self.inner.item.clone()
    }

    /// Returns the originator/source of this event.
    pub fn originator(&self) -> String {
        self.inner.originator.clone()
    }

    /// Returns the timestamp (milliseconds since epoch) of this event.
    pub fn timestamp(&self) -> u128 {
        self.inner.timestamp
    }
}

impl Debug for CollectionEventInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEventInfo")
            .field("item", &self.item().map(|f| f.id().clone()))
            .field("event_type", &self.event_type())
            .field("timestamp", &self.timestamp())
            .field("originator", &self.originator())
            .finish()
    }
}

/// Opaque implementation details of CollectionEventInfo.
pub(crate) struct CollectionEventInner {
    item: Option<Feature>,
    event_type: CollectionEvents,
    timestamp: u128,
    originator: String,
}

impl CollectionEventInner {
    fn new(item: Option<Feature>, event_type: CollectionEvents, originator: String) -> Self {
        CollectionEventInner {
            item,
            event_type,
            timestamp: current_time_millis(),
            originator,
        }
    }
}

/// Trait for closure-based event handlers.
///
/// Any closure matching `Fn(CollectionEventInfo) -> MapsiftResult<()>`
/// automatically implements this trait.
pub trait CollectionEventCallback:
    Send + Sync + Fn(CollectionEventInfo) -> MapsiftResult<()>
{
}

impl<F> CollectionEventCallback for F where
    F: Send + Sync + Fn(CollectionEventInfo) -> MapsiftResult<()>
{
}

/// Listener for collection events.
///
/// Wraps an event handler callback and can be registered with a
/// [FeatureCollection](crate::feature::FeatureCollection) to receive
/// notifications when the collection changes.
///
/// # Usage
///
/// ```ignore
/// collection.subscribe(CollectionEventListener::new(|event| {
///     println!("Event: {:?}", event.event_type());
///     Ok(())
/// }))?;
/// ```
#[derive(Clone)]
pub struct CollectionEventListener {
    on_event: Arc<dyn CollectionEventCallback>,
}

impl CollectionEventListener {
    /// Creates a new event listener wrapping the provided callback.
    pub fn new(on_event: impl CollectionEventCallback + 'static) -> Self {
        CollectionEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<CollectionEventInfo> for CollectionEventListener {
    fn handle(&self, event: &Event<CollectionEventInfo>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for CollectionEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEventListener").finish()
    }
}
