//! Cached typed property accessors.
//!
//! A [`Shape`] describes its properties by building a fresh `Vec<Property>`
//! every time it is asked. The accessor cache asks once per type, keeps the
//! resulting get/set pairs for the lifetime of the process and serves every
//! later lookup by name from a map.
//!
//! Two threads missing on the same type at the same time may both build the
//! accessor table. Whichever insert lands first wins and both callers get the
//! winning table back, so the cache converges on a single instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::Result;
use crate::error::Error;
use crate::model::Shape;
use crate::property::PropertyFlags;
use crate::value::Value;

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

fn zero_of<V: Default + Into<Value>>() -> Value {
    V::default().into()
}

/// A bound get/set pair for one property of `T`.
///
/// Either half may be missing: payload shapes often expose read-only
/// properties, and computed model properties have no setter.
pub struct PropertyAccessor<T> {
    name: &'static str,
    type_name: &'static str,
    flags: PropertyFlags,
    zero: fn() -> Value,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

impl<T: 'static> PropertyAccessor<T> {
    pub(crate) fn field<V, G, M>(name: &'static str, get: G, get_mut: M) -> Self
    where
        V: Into<Value> + TryFrom<Value, Error = Error> + Default + Clone + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self {
            name,
            type_name: std::any::type_name::<V>(),
            flags: PropertyFlags::NONE,
            zero: zero_of::<V>,
            getter: Some(Box::new(move |target: &T| get(target).clone().into())),
            setter: Some(Box::new(move |target: &mut T, value: Value| {
                *get_mut(target) = V::try_from(value).map_err(|e| e.for_property(name))?;
                Ok(())
            })),
        }
    }

    pub(crate) fn readonly<V, G>(name: &'static str, get: G) -> Self
    where
        V: Into<Value> + Default + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self {
            name,
            type_name: std::any::type_name::<V>(),
            flags: PropertyFlags::NONE,
            zero: zero_of::<V>,
            getter: Some(Box::new(move |target: &T| get(target).into())),
            setter: None,
        }
    }

    pub(crate) fn writeonly<V, S>(name: &'static str, set: S) -> Self
    where
        V: Into<Value> + TryFrom<Value, Error = Error> + Default + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            name,
            type_name: std::any::type_name::<V>(),
            flags: PropertyFlags::NONE,
            zero: zero_of::<V>,
            getter: None,
            setter: Some(Box::new(move |target: &mut T, value: Value| {
                set(target, V::try_from(value).map_err(|e| e.for_property(name))?);
                Ok(())
            })),
        }
    }
}

impl<T> PropertyAccessor<T> {
    pub(crate) fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// The value of `V::default()` for the property's value type `V`.
    pub fn zero(&self) -> Value {
        (self.zero)()
    }

    /// Read the property, or `None` if it has no getter.
    pub fn get(&self, source: &T) -> Option<Value> {
        self.getter.as_ref().map(|get| get(source))
    }

    /// Write the property.
    ///
    /// Returns `Ok(false)` without touching `target` when the property has no
    /// setter, and a type error when `value` does not convert.
    pub fn set(&self, target: &mut T, value: Value) -> Result<bool> {
        match &self.setter {
            Some(set) => set(target, value).map(|()| true),
            None => Ok(false),
        }
    }
}

impl<T> fmt::Debug for PropertyAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("flags", &self.flags)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// All accessors of one type, in declaration order.
#[derive(Debug)]
pub struct Accessors<T> {
    list: Vec<Arc<PropertyAccessor<T>>>,
    index: HashMap<&'static str, usize>,
}

impl<T: Shape> Accessors<T> {
    fn reflect() -> Self {
        let list: Vec<_> = T::properties()
            .into_iter()
            .map(|p| Arc::new(p.into_accessor()))
            .collect();
        let mut index = HashMap::with_capacity(list.len());
        for (i, accessor) in list.iter().enumerate() {
            // first declaration wins on duplicate names
            index.entry(accessor.name()).or_insert(i);
        }
        Self { list, index }
    }
}

impl<T> Accessors<T> {
    /// Look up an accessor by exact property name.
    pub fn get(&self, name: &str) -> Option<&Arc<PropertyAccessor<T>>> {
        self.index.get(name).map(|&i| &self.list[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PropertyAccessor<T>>> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Process-lifetime cache of accessor tables keyed by type.
#[derive(Default)]
pub struct AccessorCache {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

static GLOBAL_ACCESSORS: OnceLock<AccessorCache> = OnceLock::new();

impl AccessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared cache used by [`accessors`] and [`accessor`].
    pub fn global() -> &'static AccessorCache {
        GLOBAL_ACCESSORS.get_or_init(AccessorCache::new)
    }

    /// Get the accessor table for `T`, building it on first use.
    pub fn accessors<T: Shape>(&self) -> Arc<Accessors<T>> {
        let key = TypeId::of::<T>();
        let hit = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(entry) = hit.and_then(|e| e.downcast::<Accessors<T>>().ok()) {
            return entry;
        }

        tracing::trace!(
            shape = std::any::type_name::<T>(),
            "Reflecting property accessors"
        );
        let built = Arc::new(Accessors::<T>::reflect());
        let winner = Arc::clone(
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert_with(|| Arc::clone(&built) as Arc<dyn Any + Send + Sync>),
        );
        winner.downcast::<Accessors<T>>().unwrap_or(built)
    }

    /// Get a single accessor of `T` by property name.
    pub fn accessor<T: Shape>(&self, name: &str) -> Option<Arc<PropertyAccessor<T>>> {
        self.accessors::<T>().get(name).cloned()
    }

    /// Number of types with a cached accessor table.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for AccessorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorCache")
            .field("types", &self.len())
            .finish()
    }
}

/// Accessor table for `T` from the global cache.
pub fn accessors<T: Shape>() -> Arc<Accessors<T>> {
    AccessorCache::global().accessors::<T>()
}

/// Single accessor of `T` from the global cache.
pub fn accessor<T: Shape>(name: &str) -> Option<Arc<PropertyAccessor<T>>> {
    AccessorCache::global().accessor::<T>(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static REFLECTIONS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Default)]
    struct Gadget {
        id: i32,
        name: String,
        secret: String,
    }

    impl Shape for Gadget {
        fn properties() -> Vec<Property<Self>> {
            REFLECTIONS.fetch_add(1, Ordering::SeqCst);
            vec![
                Property::field("Id", |g: &Gadget| &g.id, |g: &mut Gadget| &mut g.id),
                Property::field("Name", |g: &Gadget| &g.name, |g: &mut Gadget| &mut g.name),
                Property::readonly("Upper", |g: &Gadget| g.name.to_uppercase()),
                Property::writeonly("Secret", |g: &mut Gadget, v: String| g.secret = v),
            ]
        }
    }

    #[test]
    fn get_and_set_through_accessors() {
        let cache = AccessorCache::new();
        let mut gadget = Gadget::default();

        let name = cache.accessor::<Gadget>("Name").unwrap();
        assert!(name.set(&mut gadget, Value::from("widget")).unwrap());
        assert_eq!(gadget.name, "widget");
        assert_eq!(name.get(&gadget), Some(Value::Text("widget".into())));

        let upper = cache.accessor::<Gadget>("Upper").unwrap();
        assert_eq!(upper.get(&gadget), Some(Value::Text("WIDGET".into())));
        assert!(!upper.is_writable());
        assert!(!upper.set(&mut gadget, Value::from("x")).unwrap());

        let secret = cache.accessor::<Gadget>("Secret").unwrap();
        assert!(!secret.is_readable());
        assert_eq!(secret.get(&gadget), None);
        assert!(secret.set(&mut gadget, Value::from("s3")).unwrap());
        assert_eq!(gadget.secret, "s3");
    }

    #[test]
    fn zero_value_matches_default() {
        let cache = AccessorCache::new();
        let id = cache.accessor::<Gadget>("Id").unwrap();
        assert_eq!(id.zero(), Value::Int(0));
        let name = cache.accessor::<Gadget>("Name").unwrap();
        assert_eq!(name.zero(), Value::Text(String::new()));
    }

    #[test]
    fn type_mismatch_names_the_property() {
        let cache = AccessorCache::new();
        let id = cache.accessor::<Gadget>("Id").unwrap();
        let err = id
            .set(&mut Gadget::default(), Value::Text("one".into()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type error: expected i32 for property 'Id', found TEXT"
        );
    }

    #[test]
    fn unknown_name_is_none() {
        let cache = AccessorCache::new();
        assert!(cache.accessor::<Gadget>("Missing").is_none());
    }

    #[test]
    fn table_is_built_once_per_cache() {
        let cache = AccessorCache::new();
        let before = REFLECTIONS.load(Ordering::SeqCst);
        let first = cache.accessors::<Gadget>();
        let second = cache.accessors::<Gadget>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 4);
        assert_eq!(cache.len(), 1);
        // other tests may reflect concurrently on their own caches
        assert!(REFLECTIONS.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn concurrent_misses_converge() {
        let cache = AccessorCache::new();
        let tables: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.accessors::<Gadget>()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let winner = cache.accessors::<Gadget>();
        assert!(tables.iter().all(|t| Arc::ptr_eq(t, &winner)));
    }
}
