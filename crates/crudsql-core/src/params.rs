//! Named statement parameters.

use crate::Result;
use crate::accessor::accessors;
use crate::error::{Error, LookupError};
use crate::model::Shape;
use crate::value::Value;

/// Prefix shared by every named parameter on every dialect.
pub const PARAM_SIGIL: char = '@';

/// Parameter name for a property: the property name behind [`PARAM_SIGIL`].
///
/// ```
/// assert_eq!(crudsql_core::parameter_name("Name"), "@Name");
/// ```
pub fn parameter_name(property: &str) -> String {
    let mut name = String::with_capacity(property.len() + 1);
    name.push(PARAM_SIGIL);
    name.push_str(property);
    name
}

/// Read the named properties of `source` as `(parameter name, value)` pairs.
///
/// Every name must be a readable property of `T`.
pub fn bind<'n, T: Shape>(
    source: &T,
    names: impl IntoIterator<Item = &'n str>,
) -> Result<Vec<(String, Value)>> {
    let table = accessors::<T>();
    names
        .into_iter()
        .map(|name| {
            let value = table
                .get(name)
                .and_then(|accessor| accessor.get(source))
                .ok_or_else(|| {
                    Error::Lookup(LookupError {
                        model: std::any::type_name::<T>(),
                        property: name.to_string(),
                    })
                })?;
            Ok((parameter_name(name), value))
        })
        .collect()
}
