//! Change tracking for partial inserts and updates.
//!
//! A source payload is diffed onto a target: every property the source
//! carries is copied to the target property of the same name and recorded in
//! the returned [`ChangeSet`]. The changeset then drives the partial
//! statements of the target's statement set.
//!
//! When the source is the same type as the target, a property whose value is
//! still its type's default (`0`, `""`, `None`, ...) is treated as "not set"
//! and skipped. This lets a sparsely filled instance act as a patch, at the
//! cost of never being able to set a property back to its default through
//! such a patch. A source of any other type has no such sentinel, so all of
//! its readable properties are recorded.

use std::any::TypeId;
use std::sync::Arc;

use crudsql_core::error::ConfigErrorKind;
use crudsql_core::{AccessorCache, ChangeSet, Error, PropertyAccessor, Result, Shape, Value};

/// One property write decided by the diff.
struct Planned<T> {
    accessor: Arc<PropertyAccessor<T>>,
    value: Value,
}

/// Diffs source payloads onto targets through the accessor cache.
#[derive(Debug, Clone, Copy)]
pub struct ChangeTracker<'c> {
    cache: &'c AccessorCache,
}

impl ChangeTracker<'static> {
    /// A tracker over the process-wide accessor cache.
    pub fn new() -> Self {
        Self::with_cache(AccessorCache::global())
    }
}

impl Default for ChangeTracker<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> ChangeTracker<'c> {
    pub fn with_cache(cache: &'c AccessorCache) -> Self {
        Self { cache }
    }

    /// Names `apply` would record when copying `source` onto a `T`.
    ///
    /// Depends only on `source`, so no target instance is needed.
    pub fn changes<T: Shape, U: Shape>(&self, source: &U) -> Result<Vec<&'static str>> {
        Ok(self
            .plan::<T, U>(source)?
            .into_iter()
            .map(|p| p.accessor.name())
            .collect())
    }

    /// Copy the properties `source` carries onto `target`.
    ///
    /// Every mapped source property must exist on `T` by exact name, or the
    /// call fails with a configuration error before `target` is modified.
    /// Source properties without a getter and target properties without a
    /// setter are skipped. A value that does not convert into the target
    /// property's type fails with a type error; writes made before it are kept.
    #[tracing::instrument(
        level = "debug",
        skip(self, target, source),
        fields(model = std::any::type_name::<T>(), payload = std::any::type_name::<U>())
    )]
    pub fn apply<'a, T: Shape, U: Shape>(
        &self,
        target: &'a mut T,
        source: &U,
    ) -> Result<ChangeSet<'a, T>> {
        let planned = self.plan::<T, U>(source)?;
        let mut changes = ChangeSet::new(target);
        for Planned { accessor, value } in planned {
            accessor.set(changes.target_mut(), value)?;
            changes.record(accessor.name());
        }
        tracing::debug!(changed = ?changes.names(), "Applied changes");
        Ok(changes)
    }

    fn plan<T: Shape, U: Shape>(&self, source: &U) -> Result<Vec<Planned<T>>> {
        let same_type = TypeId::of::<T>() == TypeId::of::<U>();
        let targets = self.cache.accessors::<T>();
        let sources = self.cache.accessors::<U>();

        let mut planned: Vec<Planned<T>> = Vec::with_capacity(sources.len());
        for from in sources.iter() {
            if from.flags().is_not_mapped() {
                continue;
            }
            let Some(to) = targets.get(from.name()) else {
                return Err(Error::config(
                    ConfigErrorKind::UnknownProperty,
                    std::any::type_name::<T>(),
                    format!(
                        "property '{}' of {} is not declared on the target",
                        from.name(),
                        std::any::type_name::<U>()
                    ),
                ));
            };
            let Some(value) = from.get(source) else {
                tracing::trace!(property = from.name(), "Source property has no getter");
                continue;
            };
            if same_type && value == from.zero() {
                tracing::trace!(property = from.name(), "Skipping default value");
                continue;
            }
            if !to.is_writable() {
                tracing::trace!(property = to.name(), "Target property has no setter");
                continue;
            }
            if planned.iter().any(|p| p.accessor.name() == to.name()) {
                continue;
            }
            planned.push(Planned {
                accessor: Arc::clone(to),
                value,
            });
        }
        Ok(planned)
    }
}

/// Diff a payload onto `self` with the process-wide [`ChangeTracker`].
///
/// ```
/// use crudsql_core::{Property, Shape};
/// use crudsql_tracker::SetProperties;
///
/// #[derive(Default)]
/// struct Hero {
///     name: String,
///     age: i32,
/// }
///
/// impl Shape for Hero {
///     fn properties() -> Vec<Property<Self>> {
///         vec![
///             Property::field("Name", |h: &Hero| &h.name, |h: &mut Hero| &mut h.name),
///             Property::field("Age", |h: &Hero| &h.age, |h: &mut Hero| &mut h.age),
///         ]
///     }
/// }
///
/// let mut hero = Hero { name: "Rusty".into(), age: 30 };
/// let patch = Hero { age: 31, ..Hero::default() };
/// let changes = hero.set_properties(&patch).unwrap();
/// assert_eq!(changes.names(), ["Age"]);
/// assert_eq!(hero.age, 31);
/// assert_eq!(hero.name, "Rusty");
/// ```
pub trait SetProperties: Shape {
    fn set_properties<U: Shape>(&mut self, source: &U) -> Result<ChangeSet<'_, Self>> {
        ChangeTracker::new().apply(self, source)
    }
}

impl<T: Shape> SetProperties for T {}
