//! The section registry: section names mapped to their field schemas.
//!
//! The shared default registry is built once, on first use, from the schemas
//! in `sections::schemas`. Callers that want an isolated set of sections build
//! their own [`Registry`] and hand it to [`crate::Timepiece::with_registry`].

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::normalize::Fields;
use crate::sections::{schemas, Section, SectionKind};

/// How a raw argument is turned into a typed field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    /// An integer within `min..=max`.
    BoundedInteger { min: i64, max: i64 },
    Float,
    Text,
    /// Text restricted to the listed choices.
    Choice(&'static [&'static str]),
    /// `;` separated integers, each within `min..=max`.
    IntegerList { min: i64, max: i64 },
    /// `;` separated choices.
    ChoiceList(&'static [&'static str]),
    /// A nested section, simplified, that must be one of these kinds.
    Section(&'static [SectionKind]),
    /// A nested section resolved to a single moment. `forever()` is accepted
    /// when `forever` is set.
    Instant { forever: bool },
}

impl FieldKind {
    pub const NON_NEGATIVE: FieldKind = FieldKind::BoundedInteger { min: 0, max: i64::MAX };

    pub const fn within(min: i64, max: i64) -> Self {
        FieldKind::BoundedInteger { min, max }
    }

    pub const fn list_within(min: i64, max: i64) -> Self {
        FieldKind::IntegerList { min, max }
    }
}

/// One named field of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Builds a section from fields that already passed type checking. Returns
/// every field that failed a semantic check otherwise.
pub type BuildFn = fn(&mut Fields) -> std::result::Result<Section, Vec<crate::error::FieldError>>;

/// The shape of one section and how to build it.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub fields: &'static [Field],
    pub build: BuildFn,
}

impl FieldSchema {
    pub const fn new(fields: &'static [Field], build: BuildFn) -> Self {
        Self { fields, build }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Section names and their schemas.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    sections: BTreeMap<String, FieldSchema>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in section.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        schemas::register_defaults(&mut registry);
        registry
    }

    /// Add a section. Returns the schema previously registered under `name`,
    /// which callers are not expected to rely on.
    pub fn register(&mut self, name: impl Into<String>, schema: FieldSchema) -> Option<FieldSchema> {
        self.sections.insert(name.into(), schema)
    }

    pub fn resolve(&self, name: &str) -> Option<&FieldSchema> {
        self.sections.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

static DEFAULT_REGISTRY: LazyLock<Arc<Registry>> =
    LazyLock::new(|| Arc::new(Registry::with_defaults()));

/// The registry shared by every parse that doesn't bring its own.
pub fn default_registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}
