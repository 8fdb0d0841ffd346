//! Tool specifications and argument validation.

use super::result::ToolFailure;
use crate::role::Role;
use serde_json::{json, Map, Value};
use url::Url;

/// Declared type of a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// A JSON array of free-text items.
    TextList,
    /// Text restricted to a closed set of literals.
    OneOf(&'static [&'static str]),
}

/// One named argument of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            description,
        }
    }

    pub const fn text_list(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::TextList,
            description,
        }
    }

    pub const fn one_of(
        name: &'static str,
        allowed: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::OneOf(allowed),
            description,
        }
    }

    /// Check a single value against this field.
    fn check(&self, value: &Value) -> Result<(), ToolFailure> {
        match self.kind {
            FieldKind::Text => {
                if !value.is_string() {
                    return Err(ToolFailure::invalid(self.name, "expected text"));
                }
            }
            FieldKind::TextList => {
                let items = value
                    .as_array()
                    .ok_or_else(|| ToolFailure::invalid(self.name, "expected a list of text"))?;
                if let Some(pos) = items.iter().position(|item| !item.is_string()) {
                    return Err(ToolFailure::invalid(
                        self.name,
                        format!("item {} is not text", pos),
                    ));
                }
            }
            FieldKind::OneOf(allowed) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| ToolFailure::invalid(self.name, "expected text"))?;
                if !allowed.contains(&text) {
                    return Err(ToolFailure::invalid(
                        self.name,
                        format!("'{}' is not one of {}", text, allowed.join(", ")),
                    ));
                }
            }
        }
        Ok(())
    }

    fn json_schema(&self) -> Value {
        match self.kind {
            FieldKind::Text => json!({
                "type": "string",
                "description": self.description,
            }),
            FieldKind::TextList => json!({
                "type": "array",
                "items": { "type": "string" },
                "description": self.description,
            }),
            FieldKind::OneOf(allowed) => json!({
                "type": "string",
                "enum": allowed,
                "description": self.description,
            }),
        }
    }
}

/// Static description of a tool, before an endpoint is bound.
#[derive(Debug, Clone, Copy)]
pub struct ToolTemplate {
    pub name: &'static str,
    pub role: Role,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A tool bound to its webhook endpoint. Immutable after startup.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub role: Role,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    pub endpoint: Url,
}

impl ToolSpec {
    pub fn bind(template: &ToolTemplate, endpoint: Url) -> Self {
        Self {
            name: template.name,
            role: template.role,
            description: template.description,
            fields: template.fields,
            endpoint,
        }
    }

    /// Validate arguments and produce the exact request body.
    ///
    /// Every declared field is required and undeclared fields are rejected,
    /// so the body always matches the field set.
    pub fn validate(&self, arguments: &Value) -> Result<Map<String, Value>, ToolFailure> {
        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ToolFailure::invalid("arguments", "expected a JSON object")),
        };

        if let Some(extra) = args
            .keys()
            .find(|key| !self.fields.iter().any(|f| f.name == key.as_str()))
        {
            return Err(ToolFailure::invalid(extra.as_str(), "unexpected field"));
        }

        let mut body = Map::new();
        for field in self.fields {
            let value = args
                .get(field.name)
                .ok_or_else(|| ToolFailure::invalid(field.name, "missing required field"))?;
            field.check(value)?;
            body.insert(field.name.to_string(), value.clone());
        }

        Ok(body)
    }

    /// JSON schema of the arguments, in OpenAI function-parameter form.
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self.fields.iter().map(|f| f.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}
