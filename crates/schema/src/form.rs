use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::field::FieldDef;

/// An ordered set of field definitions, usually loaded from a configuration
/// document.
///
/// Documents may be a bare list of fields or an object with a `fields` list.
/// Loading checks that every field has a non-empty, unique name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDef {
    fields: Vec<FieldDef>,
}

impl FormDef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML or JSON document.
    ///
    /// YAML is tried first. If both formats fail the YAML error is reported.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the text is neither format or the document
    /// is not a valid form definition.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        match serde_yaml::from_str::<Value>(text) {
            Ok(value) => Self::from_document(value, "YAML"),
            Err(yaml_err) => match serde_json::from_str::<Value>(text) {
                Ok(value) => Self::from_document(value, "JSON"),
                Err(_) => Err(SchemaError::Parse {
                    format: "YAML/JSON",
                    reason: yaml_err.to_string(),
                }),
            },
        }
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] on malformed JSON or an invalid definition.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let value = serde_json::from_str::<Value>(text).map_err(|e| SchemaError::Parse {
            format: "JSON",
            reason: e.to_string(),
        })?;
        Self::from_document(value, "JSON")
    }

    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] on malformed YAML or an invalid definition.
    pub fn from_yaml(text: &str) -> Result<Self, SchemaError> {
        let value = serde_yaml::from_str::<Value>(text).map_err(|e| SchemaError::Parse {
            format: "YAML",
            reason: e.to_string(),
        })?;
        Self::from_document(value, "YAML")
    }

    /// Build from an already-structured document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the document is not a valid definition.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        Self::from_document(value, "JSON")
    }

    fn from_document(value: Value, format: &'static str) -> Result<Self, SchemaError> {
        let list = match value {
            Value::Array(_) => value,
            Value::Object(mut map) => match map.remove("fields") {
                Some(list @ Value::Array(_)) => list,
                Some(_) => {
                    return Err(SchemaError::InvalidShape {
                        reason: "`fields` must be a list".into(),
                    });
                }
                None => {
                    return Err(SchemaError::InvalidShape {
                        reason: "expected a list of fields or an object with `fields`".into(),
                    });
                }
            },
            other => {
                return Err(SchemaError::InvalidShape {
                    reason: format!("expected a list of fields, got {}", kind_of(&other)),
                });
            }
        };

        let fields: Vec<FieldDef> =
            serde_json::from_value(list).map_err(|e| SchemaError::Parse {
                format,
                reason: e.to_string(),
            })?;

        let form = Self { fields };
        form.check()?;
        Ok(form)
    }

    /// Check that field names are non-empty and unique.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName { index });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn add(&mut self, field: FieldDef) -> &mut Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

impl IntoIterator for FormDef {
    type Item = FieldDef;
    type IntoIter = std::vec::IntoIter<FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormDef {
    type Item = &'a FieldDef;
    type IntoIter = std::slice::Iter<'a, FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<FieldDef> for FormDef {
    fn from_iter<I: IntoIterator<Item = FieldDef>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
