//! Tool declarations for function calling.
//!
//! These are the schemas attached to the intent-phase completion call so the
//! model can validate arguments before requesting a tool.

use serde::{Deserialize, Serialize};

/// A tool the model may call, in OpenAI function-calling format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDecl {
    /// Declaration type; always `"function"`.
    #[serde(rename = "type")]
    pub decl_type: String,

    /// The declared function.
    pub function: FunctionDecl,
}

impl ToolDecl {
    /// Declare a function with a JSON-schema parameter object.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            decl_type: "function".to_string(),
            function: FunctionDecl {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// A declared function: name, description, and parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Function name the model dispatches on.
    pub name: String,

    /// What the function does.
    pub description: String,

    /// JSON Schema of the argument object.
    pub parameters: serde_json::Value,
}

/// Build a JSON-schema parameter object from `(name, schema, required)`
/// property triples.
pub fn object_schema(properties: &[(&str, serde_json::Value, bool)]) -> serde_json::Value {
    let mut props = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, schema, is_required) in properties {
        props.insert((*name).to_string(), schema.clone());
        if *is_required {
            required.push(serde_json::Value::String((*name).to_string()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required
    })
}
