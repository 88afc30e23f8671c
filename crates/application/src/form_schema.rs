use std::sync::{Arc, PoisonError, RwLock};

use hirely_core::FieldViolation;
use hirely_domain::{FieldDefinition, FieldType, sort_fields};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

mod rules;
mod suggestions;

#[cfg(test)]
mod tests;

pub use suggestions::{normalize_phone, suggest_email_correction};

use rules::FieldRule;

/// Structural validator generated from the active field catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    fingerprint: String,
    fields: Vec<FieldValidator>,
}

#[derive(Debug, Clone, PartialEq)]
struct FieldValidator {
    key: String,
    field_type: FieldType,
    required: bool,
    rule: FieldRule,
}

/// Builds the validator for every active field in `fields`.
#[must_use]
pub fn generate_schema(fields: &[FieldDefinition]) -> FormSchema {
    let mut active: Vec<FieldDefinition> = fields
        .iter()
        .filter(|field| field.is_active())
        .cloned()
        .collect();
    sort_fields(&mut active);

    FormSchema {
        fingerprint: fingerprint(&active),
        fields: active
            .iter()
            .map(|field| FieldValidator {
                key: field.key().to_owned(),
                field_type: field.field_type(),
                required: field.is_required(),
                rule: FieldRule::for_field(field),
            })
            .collect(),
    }
}

impl FormSchema {
    /// Returns the validated field keys in display order.
    #[must_use]
    pub fn field_keys(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.key.as_str()).collect()
    }

    /// Returns keys of required fields of the given type.
    #[must_use]
    pub fn required_keys_of_type(&self, field_type: FieldType) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.required && field.field_type == field_type)
            .map(|field| field.key.as_str())
            .collect()
    }

    /// Returns the catalog fingerprint this schema was built from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.as_str()
    }

    /// Validates a record, reporting every failing field.
    ///
    /// On success returns the normalized record: strings trimmed, numbers
    /// coerced, absent optional values omitted. Values for keys outside the
    /// active catalog are dropped.
    pub fn validate(
        &self,
        values: &Map<String, Value>,
    ) -> Result<Map<String, Value>, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        let mut normalized = Map::new();

        let dropped: Vec<&str> = values
            .keys()
            .filter(|key| !self.fields.iter().any(|field| field.key == **key))
            .map(String::as_str)
            .collect();
        if !dropped.is_empty() {
            debug!(fields = ?dropped, "ignoring values outside the active catalog");
        }

        for field in &self.fields {
            let value = values.get(field.key.as_str()).filter(|value| !value.is_null());
            match field.rule.check(field.required, value) {
                Ok(Some(normalized_value)) => {
                    normalized.insert(field.key.clone(), normalized_value);
                }
                Ok(None) => {}
                Err((rule, message)) => {
                    violations.push(FieldViolation::new(field.key.as_str(), rule, message));
                }
            }
        }

        if violations.is_empty() {
            Ok(normalized)
        } else {
            Err(violations)
        }
    }
}

/// Caches the last generated schema keyed by the catalog fingerprint.
#[derive(Debug, Default)]
pub struct SchemaCache {
    current: RwLock<Option<Arc<FormSchema>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached schema when the active fields are unchanged,
    /// otherwise generates and stores a new one.
    pub fn schema_for(&self, fields: &[FieldDefinition]) -> Arc<FormSchema> {
        let mut active: Vec<FieldDefinition> = fields
            .iter()
            .filter(|field| field.is_active())
            .cloned()
            .collect();
        sort_fields(&mut active);
        let expected = fingerprint(&active);

        if let Some(schema) = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|schema| schema.fingerprint == expected)
        {
            return Arc::clone(schema);
        }

        let schema = Arc::new(generate_schema(&active));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&schema));
        schema
    }
}

fn fingerprint(active_fields: &[FieldDefinition]) -> String {
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    for field in active_fields {
        // Serializing plain data structs into a Vec cannot fail.
        let encoded = serde_json::to_vec(field).unwrap_or_default();
        hasher.update(encoded);
        hasher.update([0]);
    }

    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
