//! Property declarations and the descriptors derived from them.

use std::fmt;
use std::ops::BitOr;

use crate::accessor::PropertyAccessor;
use crate::error::Error;
use crate::value::Value;

/// Flags controlling how a property takes part in generated statements.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The property identifies the row and appears in WHERE predicates.
    pub const KEY: Self = Self(1);
    /// The value is produced by the database; never written by insert/update.
    pub const DATABASE_GENERATED: Self = Self(1 << 1);
    /// The property is not mapped to a column at all.
    pub const NOT_MAPPED: Self = Self(1 << 2);

    /// Check whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Combine two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_key(self) -> bool {
        self.contains(Self::KEY)
    }

    pub const fn is_generated(self) -> bool {
        self.contains(Self::DATABASE_GENERATED)
    }

    pub const fn is_not_mapped(self) -> bool {
        self.contains(Self::NOT_MAPPED)
    }
}

impl BitOr for PropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for PropertyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.is_key() {
            names.push("KEY");
        }
        if self.is_generated() {
            names.push("DATABASE_GENERATED");
        }
        if self.is_not_mapped() {
            names.push("NOT_MAPPED");
        }
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

/// A property declared by a [`Shape`](crate::Shape).
///
/// This is the declarative mapping for a single property: its name, optional
/// column override, flags and explicit order, plus the typed accessor used to
/// read and write it.
///
/// ```
/// use crudsql_core::Property;
///
/// struct Hero {
///     id: i32,
///     tag: String,
/// }
///
/// let props = vec![
///     Property::field("Id", |h: &Hero| &h.id, |h: &mut Hero| &mut h.id).key().generated(),
///     Property::field("Tag", |h: &Hero| &h.tag, |h: &mut Hero| &mut h.tag).column("Alias"),
/// ];
/// assert_eq!(props[1].column_name(), "Alias");
/// assert!(props[0].flags.is_key());
/// ```
pub struct Property<T> {
    /// Rust-facing property name, also used for aliases and parameter names
    pub name: &'static str,
    /// Database column name override
    pub column: Option<&'static str>,
    pub flags: PropertyFlags,
    /// Explicit declared order (retained, not used for statement assembly)
    pub order: Option<i32>,
    accessor: PropertyAccessor<T>,
}

impl<T: 'static> Property<T> {
    /// Declare a readable and writable property backed by a struct field.
    pub fn field<V, G, M>(name: &'static str, get: G, get_mut: M) -> Self
    where
        V: Into<Value> + TryFrom<Value, Error = Error> + Default + Clone + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self::from_accessor(PropertyAccessor::field(name, get, get_mut))
    }

    /// Declare a property that can only be read (a computed value or a
    /// payload field that is never written back).
    pub fn readonly<V, G>(name: &'static str, get: G) -> Self
    where
        V: Into<Value> + Default + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self::from_accessor(PropertyAccessor::readonly(name, get))
    }

    /// Declare a property that can only be written.
    pub fn writeonly<V, S>(name: &'static str, set: S) -> Self
    where
        V: Into<Value> + TryFrom<Value, Error = Error> + Default + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::from_accessor(PropertyAccessor::writeonly(name, set))
    }

    fn from_accessor(accessor: PropertyAccessor<T>) -> Self {
        Self {
            name: accessor.name(),
            column: None,
            flags: PropertyFlags::NONE,
            order: None,
            accessor,
        }
    }
}

impl<T> Property<T> {
    /// Map the property to a differently named column.
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Mark the property as part of the row key.
    pub fn key(mut self) -> Self {
        self.flags = self.flags | PropertyFlags::KEY;
        self
    }

    /// Mark the property as generated by the database.
    pub fn generated(mut self) -> Self {
        self.flags = self.flags | PropertyFlags::DATABASE_GENERATED;
        self
    }

    /// Exclude the property from the mapping.
    pub fn not_mapped(mut self) -> Self {
        self.flags = self.flags | PropertyFlags::NOT_MAPPED;
        self
    }

    /// Set an explicit declared order.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// The effective column name.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    /// Rust type name of the property's value.
    pub fn type_name(&self) -> &'static str {
        self.accessor.type_name()
    }

    pub(crate) fn into_accessor(self) -> PropertyAccessor<T> {
        self.accessor.with_flags(self.flags)
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("flags", &self.flags)
            .field("order", &self.order)
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}

/// Immutable metadata describing how one mapped property maps to a column.
///
/// Built once per model type during schema reflection and shared for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property name
    pub name: &'static str,
    /// Column the property is mapped to
    pub column_name: &'static str,
    /// Table or view the property belongs to
    pub object_name: &'static str,
    /// Database the object lives in, if addressed explicitly
    pub database: Option<&'static str>,
    /// Resolved schema of the object
    pub schema: Option<&'static str>,
    /// Declared order; carried along but not used when assembling statements
    pub order: Option<i32>,
    /// Rust type name of the property's value
    pub type_name: &'static str,
    pub flags: PropertyFlags,
}

impl PropertyDescriptor {
    pub fn is_key(&self) -> bool {
        self.flags.is_key()
    }

    pub fn is_generated(&self) -> bool {
        self.flags.is_generated()
    }
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name)
    }
}
