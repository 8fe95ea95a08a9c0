use crate::analyzer::{analyze, FieldDescriptor, FieldDomain, FieldType};
use crate::common::{not_recorded_value, EventAware, SubscriberRef, Value};
use crate::engine::Dimension;
use crate::errors::{ErrorKind, MapsiftError, MapsiftResult};
use crate::feature::{
    CollectionEventListener, CollectionEvents, Feature, FeatureCollection, FeatureId,
};
use crate::filter::{decompile, Clause, Expression, FilterState};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The visible/hidden partition of a collection under the applied filter,
/// both halves in collection order.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleSet {
    visible: Vec<FeatureId>,
    hidden: Vec<FeatureId>,
}

impl VisibleSet {
    pub fn visible(&self) -> &[FeatureId] {
        &self.visible
    }

    pub fn hidden(&self) -> &[FeatureId] {
        &self.hidden
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn is_visible(&self, id: &FeatureId) -> bool {
        self.visible.contains(id)
    }
}

/// Per-value aggregate for one field: how many features carry the value at
/// all, and how many of those survive every *other* field's clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCount {
    pub total: usize,
    pub matching: usize,
}

/// Incremental filter evaluator over a [FeatureCollection].
///
/// On construction the engine analyzes the collection, builds one
/// [Dimension] index per filterable field, and subscribes to collection
/// events so the indexes maintain themselves as features come and go.
///
/// Filtering is crossfilter-style: each feature carries a count of the
/// clauses it currently fails, and a feature is visible exactly when that
/// count is zero. Changing the clause on one field touches only the
/// features whose match status in that field changed, so a slider drag
/// re-evaluates one dimension instead of the whole filter.
///
/// `FilterEngine` is cheaply cloneable and thread-safe; clones share state.
///
/// # Example
///
/// ```rust,ignore
/// use mapsift::engine::FilterEngine;
/// use mapsift::filter::Clause;
///
/// let engine = FilterEngine::new(collection)?;
/// engine.apply_clause("severity", Some(Clause::membership([
///     Value::from("high"),
/// ])?))?;
/// let partition = engine.visible();
/// ```
#[derive(Clone)]
pub struct FilterEngine {
    inner: Arc<FilterEngineInner>,
}

struct FilterEngineInner {
    collection: FeatureCollection,
    state: RwLock<EngineState>,
    subscriber: RwLock<Option<SubscriberRef>>,
}

struct EngineState {
    descriptors: IndexMap<String, FieldDescriptor>,
    dimensions: IndexMap<String, Dimension>,
    applied: FilterState,
    fail_counts: HashMap<FeatureId, u32>,
}

impl FilterEngine {
    /// Creates an engine over the collection and subscribes to its events.
    ///
    /// Call [FilterEngine::close] when done to detach from the collection.
    pub fn new(collection: FeatureCollection) -> MapsiftResult<FilterEngine> {
        let features = collection.to_vec();
        let state = EngineState::build(&features, FilterState::new());
        let engine = FilterEngine {
            inner: Arc::new(FilterEngineInner {
                collection: collection.clone(),
                state: RwLock::new(state),
                subscriber: RwLock::new(None),
            }),
        };

        let listener = engine.clone();
        let subscriber = collection.subscribe(CollectionEventListener::new(move |event| {
            match event.event_type() {
                CollectionEvents::Add => match event.item() {
                    Some(feature) => listener.on_added(&feature),
                    None => Ok(()),
                },
                CollectionEvents::Remove => match event.item() {
                    Some(feature) => listener.on_removed(&feature),
                    None => Ok(()),
                },
                CollectionEvents::Reset => listener.rebuild(),
            }
        }))?;
        *engine.inner.subscriber.write() = subscriber;
        Ok(engine)
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.inner.collection
    }

    /// Snapshot of the field descriptors from the last analysis pass.
    pub fn descriptors(&self) -> IndexMap<String, FieldDescriptor> {
        self.inner.state.read().descriptors.clone()
    }

    /// Snapshot of the currently applied filter state.
    pub fn applied(&self) -> FilterState {
        self.inner.state.read().applied.clone()
    }

    /// Whether the applied filter constrains anything beyond its trivial
    /// full-domain clauses.
    pub fn is_active(&self) -> bool {
        let state = self.inner.state.read();
        state.applied.is_active(&state.descriptors)
    }

    /// Sets or clears the clause on one field, re-evaluating only the
    /// features whose match status in that dimension changed.
    ///
    /// A clause on a field unknown to the analysis is honored as-is: with
    /// no recorded values, features match a membership clause only through
    /// the `not_recorded` sentinel and never match a range clause.
    pub fn apply_clause(&self, field: &str, clause: Option<Clause>) -> MapsiftResult<()> {
        let mut state = self.inner.state.write();
        state.apply_clause(field, clause);
        Ok(())
    }

    /// Replaces the whole filter state, diffing against the applied state
    /// so unchanged fields are not re-evaluated.
    pub fn set_state(&self, next: FilterState) -> MapsiftResult<()> {
        let mut state = self.inner.state.write();
        let fields: Vec<String> = state
            .applied
            .fields()
            .chain(next.fields())
            .map(str::to_string)
            .collect();
        for field in fields {
            let clause = next.get_clause(&field).cloned();
            if state.applied.get_clause(&field) != clause.as_ref() {
                state.apply_clause(&field, clause);
            }
        }
        Ok(())
    }

    /// Applies a wire expression and returns the resulting partition.
    ///
    /// Sub-expressions the decompiler cannot interpret are skipped with a
    /// warning; the understood subset is applied.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::CompileError] when the expression is completely
    /// invalid, leaving the applied state untouched.
    pub fn evaluate(&self, expression: &Expression) -> MapsiftResult<VisibleSet> {
        let decompiled = decompile(expression)?;
        self.set_state(decompiled.state)?;
        Ok(self.visible())
    }

    /// The current visible/hidden partition in collection order.
    ///
    /// An id the engine has never evaluated (a feature added after
    /// [FilterEngine::close], say) counts as hidden, never as passing.
    pub fn visible(&self) -> VisibleSet {
        let state = self.inner.state.read();
        let mut visible = Vec::new();
        let mut hidden = Vec::new();
        for id in self.inner.collection.ids() {
            match state.fail_counts.get(&id) {
                Some(&0) => visible.push(id),
                _ => hidden.push(id),
            }
        }
        VisibleSet { visible, hidden }
    }

    /// Per-value aggregates for one field, excluding the field's own clause.
    ///
    /// The exclusion is what keeps a discrete filter's value list fully
    /// selectable while a subset is checked: a value's `matching` count
    /// reflects every other field's clause but never the filter on the
    /// grouped field itself. Values arrive in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::NotFound] when the field has no dimension.
    pub fn group(&self, field: &str) -> MapsiftResult<Vec<(Value, GroupCount)>> {
        let state = self.inner.state.read();
        let dimension = state.dimensions.get(field).ok_or_else(|| {
            log::error!("No dimension indexed for field {}", field);
            MapsiftError::new(
                &format!("No dimension indexed for field {}", field),
                ErrorKind::NotFound,
            )
        })?;

        // ids that fail the grouped field's own clause carry one fail count
        // that must not hide them from their own group
        let own_failures: Option<HashSet<FeatureId>> =
            state.applied.get_clause(field).map(|clause| {
                let matching = dimension.ids_matching(clause);
                state
                    .fail_counts
                    .keys()
                    .filter(|id| !matching.contains(*id))
                    .cloned()
                    .collect()
            });

        let mut groups = Vec::new();
        for (value, ids) in dimension.iter() {
            let matching = ids
                .iter()
                .filter(|id| {
                    let fails = state.fail_counts.get(*id).copied().unwrap_or(0);
                    let own: u32 = match &own_failures {
                        Some(failed) if failed.contains(*id) => 1,
                        _ => 0,
                    };
                    fails.saturating_sub(own) == 0
                })
                .count();
            groups.push((
                value.clone(),
                GroupCount {
                    total: ids.len(),
                    matching,
                },
            ));
        }
        Ok(groups)
    }

    /// Re-analyzes the collection from scratch: descriptors, dimensions and
    /// fail counts are rebuilt while the applied filter state is preserved
    /// verbatim.
    pub fn rebuild(&self) -> MapsiftResult<()> {
        let features = self.inner.collection.to_vec();
        let mut state = self.inner.state.write();
        let applied = state.applied.clone();
        *state = EngineState::build(&features, applied);
        Ok(())
    }

    /// Detaches the engine from the collection's event bus.
    pub fn close(&self) -> MapsiftResult<()> {
        if let Some(subscriber) = self.inner.subscriber.write().take() {
            self.inner.collection.unsubscribe(subscriber)?;
        }
        Ok(())
    }

    fn on_added(&self, feature: &Feature) -> MapsiftResult<()> {
        let needs_analysis = {
            let state = self.inner.state.read();
            feature
                .property_names()
                .any(|name| !state.descriptors.contains_key(name))
        };
        // a field the analysis has never seen requires a fresh pass
        if needs_analysis {
            return self.rebuild();
        }
        let mut state = self.inner.state.write();
        state.absorb(feature);
        Ok(())
    }

    fn on_removed(&self, feature: &Feature) -> MapsiftResult<()> {
        let incremental = {
            let mut state = self.inner.state.write();
            state.release(feature)
        };
        // domain bounds cannot always be maintained incrementally
        if !incremental {
            return self.rebuild();
        }
        Ok(())
    }
}

impl EngineState {
    fn build(features: &[Feature], applied: FilterState) -> EngineState {
        let descriptors = analyze(features);
        let mut dimensions: IndexMap<String, Dimension> = descriptors
            .values()
            .map(|d| {
                (
                    d.name().to_string(),
                    Dimension::new(d.name(), d.field_type()),
                )
            })
            .collect();
        for feature in features {
            for dimension in dimensions.values_mut() {
                dimension.insert(feature);
            }
        }
        let mut state = EngineState {
            descriptors,
            dimensions,
            applied,
            fail_counts: HashMap::new(),
        };
        state.fail_counts = features
            .iter()
            .map(|f| (f.id().clone(), state.fail_count_for(f)))
            .collect();
        state
    }

    fn apply_clause(&mut self, field: &str, clause: Option<Clause>) {
        if self.applied.get_clause(field) == clause.as_ref() {
            return;
        }
        let before = self.matching_ids(field, self.applied.get_clause(field));
        let after = self.matching_ids(field, clause.as_ref());
        for id in before.difference(&after) {
            if let Some(fails) = self.fail_counts.get_mut(id) {
                *fails += 1;
            }
        }
        for id in after.difference(&before) {
            if let Some(fails) = self.fail_counts.get_mut(id) {
                *fails -= 1;
            }
        }
        self.applied.set_clause(field, clause);
    }

    /// Every feature id satisfying the clause on the field; no clause means
    /// every feature matches.
    fn matching_ids(&self, field: &str, clause: Option<&Clause>) -> HashSet<FeatureId> {
        let clause = match clause {
            Some(clause) => clause,
            None => return self.fail_counts.keys().cloned().collect(),
        };
        match self.dimensions.get(field) {
            Some(dimension) => dimension.ids_matching(clause),
            // unknown field: every feature reads as not_recorded
            None => match clause {
                Clause::Membership(allowed) if allowed.contains(&not_recorded_value()) => {
                    self.fail_counts.keys().cloned().collect()
                }
                _ => HashSet::new(),
            },
        }
    }

    fn fail_count_for(&self, feature: &Feature) -> u32 {
        let mut fails = 0;
        for (field, clause) in self.applied.iter() {
            let matched = match self.dimensions.get(field) {
                Some(dimension) => dimension.matches(clause, feature),
                None => matches!(
                    clause,
                    Clause::Membership(allowed) if allowed.contains(&not_recorded_value())
                ),
            };
            if !matched {
                fails += 1;
            }
        }
        fails
    }

    /// Folds an added feature into the indexes and domains.
    fn absorb(&mut self, feature: &Feature) {
        for dimension in self.dimensions.values_mut() {
            dimension.insert(feature);
        }
        for descriptor in self.descriptors.values_mut() {
            widen_domain(descriptor, feature);
        }
        let fails = self.fail_count_for(feature);
        self.fail_counts.insert(feature.id().clone(), fails);
    }

    /// Removes a feature from the indexes and domains. Returns false when
    /// the domains need a full re-analysis to stay exact.
    fn release(&mut self, feature: &Feature) -> bool {
        for dimension in self.dimensions.values_mut() {
            dimension.remove(feature);
        }
        self.fail_counts.remove(feature.id());
        let incremental = self
            .descriptors
            .values()
            .all(|descriptor| can_narrow_incrementally(descriptor, feature));
        if incremental {
            for descriptor in self.descriptors.values_mut() {
                narrow_domain(descriptor, feature);
            }
        }
        incremental
    }
}

fn canonical_value(descriptor: &FieldDescriptor, feature: &Feature) -> Option<Value> {
    feature
        .property(descriptor.name())
        .and_then(|v| descriptor.field_type().canonicalize(v))
}

fn widen_domain(descriptor: &mut FieldDescriptor, feature: &Feature) {
    let value = canonical_value(descriptor, feature);
    let name = descriptor.name().to_string();
    let field_type = descriptor.field_type();
    match (descriptor.domain().clone(), value) {
        (FieldDomain::Discrete(mut counts), value) => {
            let key = match field_type {
                FieldType::Discrete => value.unwrap_or_else(not_recorded_value),
                _ => match value {
                    Some(value) => value,
                    None => return,
                },
            };
            *counts.entry(key).or_insert(0) += 1;
            *descriptor = FieldDescriptor::new(name, field_type, FieldDomain::Discrete(counts));
        }
        (FieldDomain::Range { min, max }, Some(value)) => {
            let min = if value < min { value.clone() } else { min };
            let max = if value > max { value } else { max };
            *descriptor = FieldDescriptor::new(name, field_type, FieldDomain::Range { min, max });
        }
        (FieldDomain::Range { .. }, None) => {}
    }
}

fn can_narrow_incrementally(descriptor: &FieldDescriptor, feature: &Feature) -> bool {
    match descriptor.domain() {
        FieldDomain::Discrete(_) => true,
        FieldDomain::Range { min, max } => match canonical_value(descriptor, feature) {
            // a removal at a bound may leave the domain too wide
            Some(value) => &value != min && &value != max,
            None => true,
        },
    }
}

fn narrow_domain(descriptor: &mut FieldDescriptor, feature: &Feature) {
    if let FieldDomain::Discrete(counts) = descriptor.domain() {
        let key = canonical_value(descriptor, feature).unwrap_or_else(not_recorded_value);
        let mut counts = counts.clone();
        match counts.get_mut(&key) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                counts.shift_remove(&key);
            }
            None => {}
        }
        let name = descriptor.name().to_string();
        let field_type = descriptor.field_type();
        *descriptor = FieldDescriptor::new(name, field_type, FieldDomain::Discrete(counts));
    }
}
