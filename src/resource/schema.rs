//! Declared schema tables
//!
//! Every resource publishes a static table of its fields. The engine reads
//! it to validate configuration and to decide, per changed field, whether
//! a change is applied in place, forces replacement, or is rejected.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ProviderError, Result};

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Int,
    Bool,
    StringSet,
    /// List of `{tag_key, tag_value}` objects
    TagList,
    /// List of computed records
    ObjectList,
}

/// Whether the user must, may or cannot set a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Optional; the vendor fills it in when omitted
    OptionalComputed,
    Computed,
}

/// What happens when a field changes after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Applied through the resource's modify call
    Updatable,
    /// Rejected with "do not support change now"
    Immutable,
    /// Resource is destroyed and created again
    ForceNew,
}

/// One row of a schema table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    pub mutability: Mutability,
    pub sensitive: bool,
    pub conflicts_with: &'static [&'static str],
    /// Inclusive character length bounds for strings
    pub length: Option<(usize, usize)>,
    pub description: &'static str,
}

impl FieldSchema {
    const fn new(name: &'static str, kind: FieldKind, presence: Presence, description: &'static str) -> Self {
        Self {
            name,
            kind,
            presence,
            mutability: Mutability::Immutable,
            sensitive: false,
            conflicts_with: &[],
            length: None,
            description,
        }
    }

    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::Required, description)
    }

    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::Optional, description)
    }

    pub const fn optional_computed(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::OptionalComputed, description)
    }

    pub const fn computed(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, Presence::Computed, description)
    }

    pub const fn updatable(self) -> Self {
        Self {
            mutability: Mutability::Updatable,
            ..self
        }
    }

    pub const fn force_new(self) -> Self {
        Self {
            mutability: Mutability::ForceNew,
            ..self
        }
    }

    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    pub const fn conflicts_with(self, fields: &'static [&'static str]) -> Self {
        Self {
            conflicts_with: fields,
            ..self
        }
    }

    pub const fn length(self, min: usize, max: usize) -> Self {
        Self {
            length: Some((min, max)),
            ..self
        }
    }
}

/// Schema of one resource or data source
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSchema],
}

/// "Set" in the sense of a non-empty value: null, `""` and `[]` are unset
pub fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

/// Normalize for comparison: unset becomes null and sets are sorted
fn normalized(field: &FieldSchema, value: Option<&Value>) -> Value {
    if !is_set(value) {
        return Value::Null;
    }
    let value = value.cloned().unwrap_or(Value::Null);

    match (field.kind, value) {
        (FieldKind::StringSet, Value::Array(mut items)) => {
            items.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
            items.dedup();
            Value::Array(items)
        }
        (_, other) => other,
    }
}

/// What applying a desired config to the prior state would do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    NoOp,
    Update,
    Replace,
    Reject,
}

/// Result of [`ResourceSchema::plan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub action: PlanAction,
    /// Changed fields in schema order
    pub changed: Vec<&'static str>,
    /// Changed fields without an update path
    pub rejected: Vec<&'static str>,
}

impl ResourceSchema {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&'static FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check a configuration object against the table
    pub fn validate(&self, attributes: &Value) -> Result<()> {
        let Value::Object(map) = attributes else {
            return Err(ProviderError::Validation(format!(
                "{}: attributes must be an object",
                self.type_name
            )));
        };

        for (key, value) in map {
            if self.field(key).is_none() && is_set(Some(value)) {
                return Err(ProviderError::Validation(format!(
                    "{}: unsupported argument `{}`",
                    self.type_name, key
                )));
            }
        }

        for field in self.fields {
            let value = map.get(field.name);

            if field.presence == Presence::Required && !is_set(value) {
                return Err(ProviderError::Validation(format!(
                    "{}: `{}` is required",
                    self.type_name, field.name
                )));
            }

            if !is_set(value) {
                continue;
            }

            for other in field.conflicts_with {
                if is_set(map.get(*other)) {
                    return Err(ProviderError::Conflict {
                        field: field.name.to_string(),
                        other: other.to_string(),
                    });
                }
            }

            if let (Some((min, max)), Some(Value::String(s))) = (field.length, value) {
                let len = s.chars().count();
                if len < min || len > max {
                    return Err(ProviderError::Validation(format!(
                        "{}: `{}` length must be between {} and {}, got {}",
                        self.type_name, field.name, min, max, len
                    )));
                }
            }
        }

        Ok(())
    }

    /// Fields whose value differs between prior state and desired config.
    /// Computed fields never count, and an unset optional-computed field
    /// keeps whatever the vendor assigned.
    pub fn changed_fields(&self, prior: &Value, desired: &Value) -> Vec<&'static FieldSchema> {
        self.fields
            .iter()
            .filter(|field| field.presence != Presence::Computed)
            .filter(|field| {
                let next = desired.get(field.name);
                if field.presence == Presence::OptionalComputed && !is_set(next) {
                    return false;
                }
                normalized(field, prior.get(field.name)) != normalized(field, next)
            })
            .collect()
    }

    /// Classify the change from `prior` (None when absent) to `desired`
    pub fn plan(&self, prior: Option<&Value>, desired: &Value) -> Plan {
        let Some(prior) = prior else {
            return Plan {
                action: PlanAction::Create,
                changed: self
                    .fields
                    .iter()
                    .filter(|f| is_set(desired.get(f.name)))
                    .map(|f| f.name)
                    .collect(),
                rejected: Vec::new(),
            };
        };

        let changed = self.changed_fields(prior, desired);
        let rejected: Vec<&'static str> = changed
            .iter()
            .filter(|f| f.mutability == Mutability::Immutable)
            .map(|f| f.name)
            .collect();

        let action = if changed.is_empty() {
            PlanAction::NoOp
        } else if !rejected.is_empty() {
            PlanAction::Reject
        } else if changed.iter().any(|f| f.mutability == Mutability::ForceNew) {
            PlanAction::Replace
        } else {
            PlanAction::Update
        };

        Plan {
            action,
            changed: changed.iter().map(|f| f.name).collect(),
            rejected,
        }
    }
}
