//! Schema reflection: from a model's declared mapping to descriptors.

use std::collections::HashSet;
use std::sync::OnceLock;

use crudsql_core::error::ConfigErrorKind;
use crudsql_core::{Error, Model, ObjectIdentity, PropertyDescriptor, Result};
use regex::Regex;

use crate::dialect::Dialect;

/// The reflected mapping of one model under one dialect.
#[derive(Debug, Clone)]
pub struct Schema {
    model: &'static str,
    identity: ObjectIdentity,
    properties: Vec<PropertyDescriptor>,
}

const PARAMETER_NAME: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Check that `name` can follow the parameter sigil.
fn check_parameter_name(model: &'static str, name: &str) -> Result<()> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(PARAMETER_NAME))
        .as_ref()
        .map_err(|e| {
            Error::config(
                ConfigErrorKind::InvalidMapping,
                model,
                format!("parameter name pattern failed to compile: {e}"),
            )
        })?;
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(Error::config(
            ConfigErrorKind::InvalidMapping,
            model,
            format!("property name '{name}' cannot be used as a parameter name"),
        ))
    }
}

impl Schema {
    /// Reflect `M` under `dialect`.
    ///
    /// Properties flagged not-mapped are dropped; the rest keep declaration
    /// order. A missing schema resolves to the dialect default, a missing
    /// database leaves that path segment out.
    #[tracing::instrument(level = "debug", skip(dialect), fields(model = std::any::type_name::<M>(), dialect = dialect.name()))]
    pub fn reflect<M: Model>(dialect: &dyn Dialect) -> Result<Self> {
        let model = std::any::type_name::<M>();

        if M::TABLE_NAME.trim().is_empty() {
            return Err(Error::config(
                ConfigErrorKind::InvalidMapping,
                model,
                "table name is empty",
            ));
        }
        if M::DATABASE_NAME.is_some() && !dialect.supports_cross_database() {
            return Err(Error::config(
                ConfigErrorKind::UnsupportedPath,
                model,
                format!(
                    "dialect '{}' cannot address database '{}'",
                    dialect.name(),
                    M::DATABASE_NAME.unwrap_or_default()
                ),
            ));
        }

        let identity = ObjectIdentity::new(M::TABLE_NAME)
            .with_schema(M::SCHEMA_NAME.or_else(|| dialect.default_schema()))
            .with_database(M::DATABASE_NAME);

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        let mut properties = Vec::new();
        for prop in M::properties() {
            if prop.flags.is_not_mapped() {
                continue;
            }
            check_parameter_name(model, prop.name)?;
            if !names.insert(prop.name) {
                return Err(Error::config(
                    ConfigErrorKind::InvalidMapping,
                    model,
                    format!("property '{}' is declared twice", prop.name),
                ));
            }
            if !columns.insert(prop.column_name()) {
                return Err(Error::config(
                    ConfigErrorKind::InvalidMapping,
                    model,
                    format!("column '{}' is mapped twice", prop.column_name()),
                ));
            }
            properties.push(PropertyDescriptor {
                name: prop.name,
                column_name: prop.column_name(),
                object_name: identity.table,
                database: identity.database,
                schema: identity.schema,
                order: prop.order,
                type_name: prop.type_name(),
                flags: prop.flags,
            });
        }

        if properties.is_empty() {
            return Err(Error::config(
                ConfigErrorKind::InvalidMapping,
                model,
                "no mapped properties",
            ));
        }

        tracing::trace!(
            object = %identity,
            properties = properties.len(),
            "Reflected schema"
        );
        Ok(Self {
            model,
            identity,
            properties,
        })
    }

    /// Rust type name of the reflected model.
    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    /// Mapped properties in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Key-flagged properties.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_key())
    }

    /// Properties whose values are written by insert and update.
    pub fn writable(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| !p.is_generated())
    }

    pub fn has_key(&self) -> bool {
        self.keys().next().is_some()
    }

    /// Find a mapped property by exact name.
    pub fn find(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}
