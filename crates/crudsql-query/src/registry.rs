//! Statement registry.
//!
//! Maps `(model type, dialect type)` to the statement set built for that
//! pair. Each entry is a single-initialization cell: concurrent first
//! requests for the same pair wait on one build and observe the same
//! [`StatementSet`] instance, or the same error, from then on.
//!
//! ```
//! use crudsql_core::{Model, Property, Shape};
//! use crudsql_query::{DialectKind, StatementRegistry};
//!
//! struct Tag {
//!     id: i32,
//! }
//!
//! impl Shape for Tag {
//!     fn properties() -> Vec<Property<Self>> {
//!         vec![Property::field("Id", |t: &Tag| &t.id, |t: &mut Tag| &mut t.id).key()]
//!     }
//! }
//!
//! impl Model for Tag {
//!     const TABLE_NAME: &'static str = "Tags";
//! }
//!
//! let registry = StatementRegistry::new();
//! let first = registry.get::<Tag>(DialectKind::Postgres.dialect()).unwrap();
//! let again = registry.get::<Tag>(DialectKind::Postgres.dialect()).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crudsql_core::{Model, Result};

use crate::dialect::Dialect;
use crate::statement::StatementSet;

type Slot = Arc<OnceLock<Result<Arc<StatementSet>>>>;

/// Concrete type behind a dialect object.
fn dialect_id(dialect: &(dyn Dialect + 'static)) -> TypeId {
    <dyn Dialect as Any>::type_id(dialect)
}

/// Lazily built, immutable statement sets keyed by model and dialect.
#[derive(Debug, Default)]
pub struct StatementRegistry {
    slots: RwLock<HashMap<(TypeId, TypeId), Slot>>,
}

impl StatementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the statement set of `M` under `dialect`, building it on first use.
    ///
    /// A mapping that fails reflection is remembered: every later request
    /// returns the same error without reflecting again.
    pub fn get<M: Model>(&self, dialect: &'static dyn Dialect) -> Result<Arc<StatementSet>> {
        let slot = self.slot((TypeId::of::<M>(), dialect_id(dialect)));
        slot.get_or_init(|| StatementSet::build::<M>(dialect).map(Arc::new))
            .clone()
    }

    fn slot(&self, key: (TypeId, TypeId)) -> Slot {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(&key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }

    /// Whether the pair has been requested before.
    pub fn contains<M: Model>(&self, dialect: &(dyn Dialect + 'static)) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(TypeId::of::<M>(), dialect_id(dialect)))
    }

    /// Number of `(model, dialect)` pairs requested so far.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
