//! Output-shape declarations for structured generation stages.
//!
//! A schema is sent to the provider so the model constrains its output, and
//! the same schema validates whatever text comes back before it is trusted.

use serde_json::{json, Map, Value};

/// Property holding an array root in the JSON Schema dialect
pub const WRAPPED_ROOT_KEY: &str = "items";

/// Declared shape of a structured response
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSchema {
    String {
        description: Option<String>,
    },
    Number {
        description: Option<String>,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Array {
        items: Box<OutputSchema>,
        description: Option<String>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object {
        properties: Vec<(String, OutputSchema)>,
        required: Vec<String>,
        description: Option<String>,
    },
}

impl OutputSchema {
    pub fn string(description: &str) -> Self {
        OutputSchema::String {
            description: Some(description.to_string()),
        }
    }

    pub fn number(description: &str) -> Self {
        OutputSchema::Number {
            description: Some(description.to_string()),
            minimum: None,
            maximum: None,
        }
    }

    /// Number constrained to an inclusive range
    pub fn number_in(description: &str, minimum: f64, maximum: f64) -> Self {
        OutputSchema::Number {
            description: Some(description.to_string()),
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    pub fn string_list(description: &str) -> Self {
        OutputSchema::Array {
            items: Box::new(OutputSchema::String { description: None }),
            description: Some(description.to_string()),
            min_items: None,
            max_items: None,
        }
    }

    pub fn array_of(items: OutputSchema) -> Self {
        OutputSchema::Array {
            items: Box::new(items),
            description: None,
            min_items: None,
            max_items: None,
        }
    }

    /// Object whose every listed property is required
    pub fn object(properties: Vec<(&str, OutputSchema)>) -> Self {
        let required = properties.iter().map(|(name, _)| name.to_string()).collect();
        OutputSchema::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required,
            description: None,
        }
    }

    /// Bound the number of items of an array schema; no-op for other kinds
    pub fn with_item_bounds(mut self, min: usize, max: usize) -> Self {
        if let OutputSchema::Array {
            min_items,
            max_items,
            ..
        } = &mut self
        {
            *min_items = Some(min);
            *max_items = Some(max);
        }
        self
    }

    /// Render in the Gemini `responseSchema` dialect (upper-case type names).
    pub fn to_gemini(&self) -> Value {
        self.render(Dialect::Gemini)
    }

    /// Render as standard JSON Schema for OpenAI-compatible `json_schema` formats.
    ///
    /// Those formats only accept an object at the root, so an array root is
    /// nested under [`WRAPPED_ROOT_KEY`]. See [`OutputSchema::unwrap_root`].
    pub fn to_json_schema(&self) -> Value {
        match self {
            OutputSchema::Array { .. } => {
                OutputSchema::object(vec![(WRAPPED_ROOT_KEY, self.clone())]).render(Dialect::JsonSchema)
            }
            _ => self.render(Dialect::JsonSchema),
        }
    }

    /// Undo the root wrapping of `to_json_schema`; anything else passes through.
    pub fn unwrap_root(&self, value: Value) -> Value {
        if let (OutputSchema::Array { .. }, Value::Object(fields)) = (self, &value) {
            if fields.len() == 1 {
                if let Some(items @ Value::Array(_)) = fields.get(WRAPPED_ROOT_KEY) {
                    return items.clone();
                }
            }
        }
        value
    }

    fn render(&self, dialect: Dialect) -> Value {
        let mut out = Map::new();
        let type_name = |gemini: &str, standard: &str| match dialect {
            Dialect::Gemini => Value::String(gemini.to_string()),
            Dialect::JsonSchema => Value::String(standard.to_string()),
        };

        match self {
            OutputSchema::String { description } => {
                out.insert("type".into(), type_name("STRING", "string"));
                insert_description(&mut out, description);
            }
            OutputSchema::Number {
                description,
                minimum,
                maximum,
            } => {
                out.insert("type".into(), type_name("NUMBER", "number"));
                insert_description(&mut out, description);
                if let Some(min) = minimum {
                    out.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    out.insert("maximum".into(), json!(max));
                }
            }
            OutputSchema::Array {
                items,
                description,
                min_items,
                max_items,
            } => {
                out.insert("type".into(), type_name("ARRAY", "array"));
                out.insert("items".into(), items.render(dialect));
                insert_description(&mut out, description);
                // Gemini encodes int64 bounds as strings
                if let Some(min) = min_items {
                    let value = match dialect {
                        Dialect::Gemini => json!(min.to_string()),
                        Dialect::JsonSchema => json!(min),
                    };
                    out.insert("minItems".into(), value);
                }
                if let Some(max) = max_items {
                    let value = match dialect {
                        Dialect::Gemini => json!(max.to_string()),
                        Dialect::JsonSchema => json!(max),
                    };
                    out.insert("maxItems".into(), value);
                }
            }
            OutputSchema::Object {
                properties,
                required,
                description,
            } => {
                out.insert("type".into(), type_name("OBJECT", "object"));
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.render(dialect)))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                out.insert("required".into(), json!(required));
                insert_description(&mut out, description);
                if dialect == Dialect::JsonSchema {
                    out.insert("additionalProperties".into(), Value::Bool(false));
                }
            }
        }

        Value::Object(out)
    }

    /// Check a parsed response against this schema.
    ///
    /// Errors carry a JSONPath-like location, e.g. `$[2].viralityScore: expected number`.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        self.validate_at("$", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> std::result::Result<(), String> {
        match self {
            OutputSchema::String { .. } => {
                if !value.is_string() {
                    return Err(format!("{}: expected string, found {}", path, kind_of(value)));
                }
            }
            OutputSchema::Number {
                minimum, maximum, ..
            } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| format!("{}: expected number, found {}", path, kind_of(value)))?;
                if let Some(min) = minimum {
                    if number < *min {
                        return Err(format!("{}: {} is below minimum {}", path, number, min));
                    }
                }
                if let Some(max) = maximum {
                    if number > *max {
                        return Err(format!("{}: {} is above maximum {}", path, number, max));
                    }
                }
            }
            OutputSchema::Array {
                items,
                min_items,
                max_items,
                ..
            } => {
                let elements = value
                    .as_array()
                    .ok_or_else(|| format!("{}: expected array, found {}", path, kind_of(value)))?;
                if let Some(min) = min_items {
                    if elements.len() < *min {
                        return Err(format!(
                            "{}: expected at least {} items, found {}",
                            path,
                            min,
                            elements.len()
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if elements.len() > *max {
                        return Err(format!(
                            "{}: expected at most {} items, found {}",
                            path,
                            max,
                            elements.len()
                        ));
                    }
                }
                for (i, element) in elements.iter().enumerate() {
                    items.validate_at(&format!("{}[{}]", path, i), element)?;
                }
            }
            OutputSchema::Object {
                properties,
                required,
                ..
            } => {
                let fields = value
                    .as_object()
                    .ok_or_else(|| format!("{}: expected object, found {}", path, kind_of(value)))?;

                for name in required {
                    match fields.get(name) {
                        None | Some(Value::Null) => {
                            return Err(format!("{}.{}: required field missing", path, name));
                        }
                        Some(Value::String(s)) if s.trim().is_empty() => {
                            return Err(format!("{}.{}: required field is blank", path, name));
                        }
                        _ => {}
                    }
                }

                for (name, schema) in properties {
                    if let Some(field) = fields.get(name) {
                        if field.is_null() && !required.contains(name) {
                            continue;
                        }
                        schema.validate_at(&format!("{}.{}", path, name), field)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Gemini,
    JsonSchema,
}

fn insert_description(out: &mut Map<String, Value>, description: &Option<String>) {
    if let Some(text) = description {
        out.insert("description".into(), Value::String(text.clone()));
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
