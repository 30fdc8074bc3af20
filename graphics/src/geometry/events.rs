//! Geometry change notifications.

/// Something observers of a geometry record may care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryEvent {
    /// Positions changed; cached bounds and spatial data were discarded.
    BoundaryChanged,
    /// The record is being destroyed.
    Destroyed,
}

/// Handle returned by [`GeometryRecord::observe`](super::GeometryRecord::observe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryObserverId(u64);

type Observer = Box<dyn Fn(GeometryEvent) + Send + Sync>;

/// Observer list owned by a single record.
#[derive(Default)]
pub(crate) struct GeometryObservers {
    next_id: u64,
    observers: Vec<(GeometryObserverId, Observer)>,
}

impl GeometryObservers {
    pub(crate) fn add(
        &mut self,
        observer: impl Fn(GeometryEvent) + Send + Sync + 'static,
    ) -> GeometryObserverId {
        let id = GeometryObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub(crate) fn remove(&mut self, id: GeometryObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub(crate) fn emit(&self, event: GeometryEvent) {
        for (_, observer) in &self.observers {
            observer(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for GeometryObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryObservers")
            .field("count", &self.observers.len())
            .finish()
    }
}
