use crate::common::{ColorPalette, EventAware, MapsiftEventBus, SubscriberRef, Value};
use crate::errors::MapsiftResult;
use crate::feature::{
    CollectionEventInfo, CollectionEventListener, CollectionEvents, Feature, FeatureId,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// An ordered, id-keyed collection of features.
///
/// `FeatureCollection` is the single source of truth for the feature set the
/// filter engine operates on. It supports individual and wholesale
/// add/remove, stable iteration in insertion order, and publishes
/// [CollectionEvents] to subscribed listeners on every mutation so derived
/// indexes can maintain themselves incrementally.
///
/// The collection never initiates network or storage I/O; loading is the
/// concern of an external collaborator that feeds features in.
///
/// # Responsibilities
///
/// * **Feature Storage**: id-keyed insertion-ordered feature map
/// * **Change Notification**: Add/Remove/Reset events via the event bus
/// * **Color Assignment**: a per-collection [ColorPalette] for categorical
///   values, never shared across collections
///
/// # Example
///
/// ```rust,ignore
/// use mapsift::feature::{Feature, FeatureCollection, FeatureId};
///
/// let collection = FeatureCollection::new("points");
/// collection.add(Feature::new(FeatureId::new("f1"), -55.2, 5.8)
///     .with_property("severity", "high"))?;
/// assert_eq!(collection.len(), 1);
/// ```
#[derive(Clone)]
pub struct FeatureCollection {
    inner: Arc<FeatureCollectionInner>,
}

struct FeatureCollectionInner {
    name: String,
    features: RwLock<IndexMap<FeatureId, Feature>>,
    event_bus: MapsiftEventBus<CollectionEventInfo, CollectionEventListener>,
    palette: RwLock<ColorPalette>,
}

impl FeatureCollection {
    /// Creates an empty collection with the given name. The name is used as
    /// the originator on published events.
    pub fn new(name: &str) -> Self {
        FeatureCollection {
            inner: Arc::new(FeatureCollectionInner {
                name: name.to_string(),
                features: RwLock::new(IndexMap::new()),
                event_bus: MapsiftEventBus::new(),
                palette: RwLock::new(ColorPalette::new()),
            }),
        }
    }

    /// Creates a collection pre-populated with features. No events are
    /// published for the initial contents.
    pub fn with_features(name: &str, features: impl IntoIterator<Item = Feature>) -> Self {
        let collection = FeatureCollection::new(name);
        {
            let mut guard = collection.inner.features.write();
            for feature in features {
                guard.insert(feature.id().clone(), feature);
            }
        }
        collection
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Adds a feature. A feature with the same id replaces the existing one,
    /// publishing a Remove for the old feature before the Add. The old
    /// feature leaves the collection before the Remove is published, so
    /// Remove handlers observe a collection containing neither version;
    /// the replacement then takes a fresh slot at the end of collection
    /// order.
    pub fn add(&self, feature: Feature) -> MapsiftResult<()> {
        let replaced = {
            let mut guard = self.inner.features.write();
            guard.shift_remove(feature.id())
        };
        // publish outside the lock so handlers can read the collection
        if let Some(old) = replaced {
            self.publish(Some(old), CollectionEvents::Remove)?;
        }
        {
            let mut guard = self.inner.features.write();
            guard.insert(feature.id().clone(), feature.clone());
        }
        self.publish(Some(feature), CollectionEvents::Add)
    }

    /// Adds every feature from the iterator.
    pub fn add_all(&self, features: impl IntoIterator<Item = Feature>) -> MapsiftResult<()> {
        for feature in features {
            self.add(feature)?;
        }
        Ok(())
    }

    /// Removes the feature with the given id, returning it if present.
    pub fn remove(&self, id: &FeatureId) -> MapsiftResult<Option<Feature>> {
        let removed = {
            let mut guard = self.inner.features.write();
            guard.shift_remove(id)
        };
        if let Some(feature) = &removed {
            self.publish(Some(feature.clone()), CollectionEvents::Remove)?;
        }
        Ok(removed)
    }

    /// Replaces the entire contents and publishes a single Reset event.
    pub fn reset(&self, features: impl IntoIterator<Item = Feature>) -> MapsiftResult<()> {
        {
            let mut guard = self.inner.features.write();
            guard.clear();
            for feature in features {
                guard.insert(feature.id().clone(), feature);
            }
        }
        self.publish(None, CollectionEvents::Reset)
    }

    pub fn get(&self, id: &FeatureId) -> Option<Feature> {
        self.inner.features.read().get(id).cloned()
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.inner.features.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.features.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.features.read().is_empty()
    }

    /// Snapshot of the feature ids in collection order.
    pub fn ids(&self) -> Vec<FeatureId> {
        self.inner.features.read().keys().cloned().collect()
    }

    /// Snapshot of the features in collection order.
    pub fn to_vec(&self) -> Vec<Feature> {
        self.inner.features.read().values().cloned().collect()
    }

    /// Stable color for a categorical value, assigned from this collection's
    /// own palette.
    pub fn color_for(&self, value: &Value) -> &'static str {
        self.inner.palette.write().color_for(value)
    }

    fn publish(&self, item: Option<Feature>, event_type: CollectionEvents) -> MapsiftResult<()> {
        let info = CollectionEventInfo::new(item, event_type, self.inner.name.clone());
        self.inner.event_bus.publish(info)
    }
}

impl EventAware for FeatureCollection {
    fn subscribe(&self, handler: CollectionEventListener) -> MapsiftResult<Option<SubscriberRef>> {
        self.inner.event_bus.register(handler)
    }

    fn unsubscribe(&self, subscriber: SubscriberRef) -> MapsiftResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic;

    fn feature(id: &str, severity: &str) -> Feature {
        Feature::new(FeatureId::new(id), 0.0, 0.0).with_property("severity", severity)
    }

    #[test]
    fn test_add_get_remove() {
        let collection = FeatureCollection::new("points");
        collection.add(feature("f1", "high")).unwrap();
        collection.add(feature("f2", "low")).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.contains(&FeatureId::new("f1")));

        let removed = collection.remove(&FeatureId::new("f1")).unwrap().unwrap();
        assert_eq!(removed.id().as_str(), "f1");
        assert_eq!(collection.len(), 1);
        assert!(collection.remove(&FeatureId::new("gone")).unwrap().is_none());
    }

    #[test]
    fn test_add_replaces_same_id() {
        let collection = FeatureCollection::new("points");
        collection.add(feature("f1", "high")).unwrap();
        collection.add(feature("f1", "low")).unwrap();
        assert_eq!(collection.len(), 1);
        let current = collection.get(&FeatureId::new("f1")).unwrap();
        assert_eq!(
            current.property("severity"),
            Some(&Value::from("low"))
        );
    }

    #[test]
    fn test_replace_remove_handler_sees_neither_version() {
        let collection = FeatureCollection::new("points");
        collection.add(feature("f1", "high")).unwrap();
        let observer = collection.clone();
        let seen = atomic(Vec::new());
        let seen_clone = seen.clone();
        collection
            .subscribe(CollectionEventListener::new(move |event| {
                if event.event_type() == CollectionEvents::Remove {
                    let id = event.item().unwrap().id().clone();
                    seen_clone.write().push(observer.contains(&id));
                }
                Ok(())
            }))
            .unwrap();
        collection.add(feature("f1", "low")).unwrap();
        // the Remove for the old version fires while the id is absent
        assert_eq!(seen.read().clone(), vec![false]);
    }

    #[test]
    fn test_reset_replaces_contents() {
        let collection =
            FeatureCollection::with_features("points", vec![feature("f1", "high")]);
        collection.reset(vec![feature("f2", "low"), feature("f3", "medium")]).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(!collection.contains(&FeatureId::new("f1")));
    }

    #[test]
    fn test_events_published_in_order() {
        let collection = FeatureCollection::new("points");
        let seen = atomic(Vec::new());
        let seen_clone = seen.clone();
        collection
            .subscribe(CollectionEventListener::new(move |event| {
                seen_clone.write().push(event.event_type());
                Ok(())
            }))
            .unwrap();

        collection.add(feature("f1", "high")).unwrap();
        collection.add(feature("f1", "low")).unwrap();
        collection.remove(&FeatureId::new("f1")).unwrap();
        collection.reset(Vec::new()).unwrap();

        let events = seen.read().clone();
        assert_eq!(
            events,
            vec![
                CollectionEvents::Add,
                CollectionEvents::Remove,
                CollectionEvents::Add,
                CollectionEvents::Remove,
                CollectionEvents::Reset,
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let collection = FeatureCollection::new("points");
        let seen = atomic(0usize);
        let seen_clone = seen.clone();
        let subscriber = collection
            .subscribe(CollectionEventListener::new(move |_| {
                *seen_clone.write() += 1;
                Ok(())
            }))
            .unwrap()
            .unwrap();
        collection.add(feature("f1", "high")).unwrap();
        collection.unsubscribe(subscriber).unwrap();
        collection.add(feature("f2", "low")).unwrap();
        assert_eq!(*seen.read(), 1);
    }

    #[test]
    fn test_color_assignment_is_per_collection() {
        let a = FeatureCollection::new("a");
        let b = FeatureCollection::new("b");
        let first = a.color_for(&Value::from("mining"));
        a.color_for(&Value::from("logging"));
        // a fresh collection starts from the beginning of the palette
        assert_eq!(b.color_for(&Value::from("logging")), first);
    }
}
