//! JSON schema helpers for function parameters

use serde_json::{json, Value};

/// Build a JSON schema object
pub fn object_schema() -> SchemaBuilder {
    SchemaBuilder::new("object")
}

/// Build a string property
pub fn string_prop(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// Build an integer property
pub fn integer_prop(description: &str) -> Value {
    json!({
        "type": "integer",
        "description": description
    })
}

/// Build an integer property with inclusive bounds
pub fn bounded_integer_prop(description: &str, minimum: i64, maximum: i64) -> Value {
    json!({
        "type": "integer",
        "description": description,
        "minimum": minimum,
        "maximum": maximum
    })
}

/// Build a boolean property
pub fn boolean_prop(description: &str) -> Value {
    json!({
        "type": "boolean",
        "description": description
    })
}

/// Schema builder for function parameters
pub struct SchemaBuilder {
    schema_type: String,
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new(schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    /// Add a property to the schema
    pub fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Build the final schema
    pub fn build(self) -> Value {
        json!({
            "type": self.schema_type,
            "properties": self.properties,
            "required": self.required
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_schema() {
        let schema = object_schema()
            .property("id", integer_prop("Light id"), true)
            .property("is_on", boolean_prop("Power state"), false)
            .property("brightness", bounded_integer_prop("Level", 0, 100), false)
            .build();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert_eq!(schema["properties"]["is_on"]["type"], "boolean");
        assert_eq!(schema["properties"]["brightness"]["maximum"], 100);
        assert_eq!(schema["required"], json!(["id"]));
    }
}
