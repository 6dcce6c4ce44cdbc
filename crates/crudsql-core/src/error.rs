//! Error types for crudsql operations.
//!
//! Every error in this crate describes a mapping-authoring defect rather than a
//! transient fault, so nothing here is retryable. Errors are `Clone` because a
//! failed statement build is memoized and handed back on every request.

use std::fmt;

/// The primary error type for all crudsql operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The mapping cannot support the requested operation
    Config(ConfigError),
    /// A property name could not be resolved during statement assembly
    Lookup(LookupError),
    /// A value could not be converted into a property's Rust type
    Type(TypeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    /// Rust type name of the model or payload involved
    pub model: Option<&'static str>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The model declares no key property
    NoKey,
    /// The model declares no property that can be written
    NoUpdatableProperty,
    /// A partial update was requested with an empty changeset
    EmptyChangeset,
    /// A payload property does not exist on the target type
    UnknownProperty,
    /// The table/view mapping itself is invalid
    InvalidMapping,
    /// The dialect does not support the requested object path
    UnsupportedPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupError {
    /// Rust type name of the model
    pub model: &'static str,
    /// The property name that failed to resolve
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub property: Option<String>,
}

impl ConfigError {
    /// Create a configuration error of the given kind.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            model: None,
            message: message.into(),
        }
    }

    /// Attach the Rust type name of the model or payload.
    pub fn model(mut self, model: &'static str) -> Self {
        self.model = Some(model);
        self
    }
}

impl Error {
    /// Shorthand for a configuration error about `model`.
    pub fn config(
        kind: ConfigErrorKind,
        model: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Error::Config(ConfigError::new(kind, message).model(model))
    }

    /// Is this a configuration error?
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Is this a lookup error?
    pub fn is_lookup(&self) -> bool {
        matches!(self, Error::Lookup(_))
    }

    /// Get the configuration error kind, if this is one.
    pub fn config_kind(&self) -> Option<ConfigErrorKind> {
        match self {
            Error::Config(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Attach a property name to a type error; other errors pass through.
    pub fn for_property(self, property: &str) -> Self {
        match self {
            Error::Type(mut e) => {
                e.property.get_or_insert_with(|| property.to_string());
                Error::Type(e)
            }
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Lookup(e) => write!(f, "Lookup error: {}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(model) = self.model {
            write!(f, "{} ({})", self.message, model)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}' is not a mapped property of {}",
            self.property, self.model
        )
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(property) = &self.property {
            write!(
                f,
                "expected {} for property '{}', found {}",
                self.expected, property, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        Error::Lookup(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for crudsql operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_model() {
        let err = Error::config(ConfigErrorKind::NoKey, "app::Hero", "no key properties");
        assert_eq!(
            err.to_string(),
            "Configuration error: no key properties (app::Hero)"
        );
        assert!(err.is_config());
        assert_eq!(err.config_kind(), Some(ConfigErrorKind::NoKey));
    }

    #[test]
    fn lookup_error_display() {
        let err = Error::from(LookupError {
            model: "app::Hero",
            property: "Alias".to_string(),
        });
        assert!(err.is_lookup());
        assert!(!err.is_config());
        assert_eq!(
            err.to_string(),
            "Lookup error: property 'Alias' is not a mapped property of app::Hero"
        );
    }

    #[test]
    fn type_error_picks_up_property_once() {
        let err = Error::Type(TypeError {
            expected: "i32",
            actual: "TEXT".to_string(),
            property: None,
        })
        .for_property("Age")
        .for_property("Other");
        assert_eq!(
            err.to_string(),
            "Type error: expected i32 for property 'Age', found TEXT"
        );
    }
}
