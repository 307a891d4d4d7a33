//! Action declarations and tool call requests.
//!
//! An `ActionSpec` is what the oracle sees: a name, a description it uses to
//! decide applicability, and a typed argument list. A `ToolCallRequest` is
//! what the oracle sends back when it wants one of those actions run.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Argument values supplied with a tool call, keyed by argument name.
pub type ActionArguments = Map<String, Value>;

/// The value type an action argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgType {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
}

impl ArgType {
    /// The JSON Schema fragment describing this type.
    pub fn json_schema(&self) -> Value {
        match self {
            ArgType::String => json!({ "type": "string" }),
            ArgType::Integer => json!({ "type": "integer" }),
            ArgType::Number => json!({ "type": "number" }),
            ArgType::Boolean => json!({ "type": "boolean" }),
            ArgType::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgType::String => "a string",
            ArgType::Integer => "an integer",
            ArgType::Number => "a number",
            ArgType::Boolean => "a boolean",
            ArgType::StringList => "a list of strings",
        };
        f.write_str(s)
    }
}

/// One declared argument of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub arg_type: ArgType,
    pub required: bool,
    /// Shown to the oracle alongside the name.
    pub description: String,
}

impl ArgumentSpec {
    pub fn required(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            arg_type,
            required: true,
            description: description.to_string(),
        }
    }

    pub fn optional(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self { required: false, ..Self::required(name, arg_type, description) }
    }
}

/// The declaration of a callable action, as exposed to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Unique within a registry.
    pub name: String,
    pub description: String,
    /// Arguments in declaration order.
    pub arguments: Vec<ArgumentSpec>,
}

impl ActionSpec {
    /// Render the argument list as a JSON Schema object.
    ///
    /// The same document is handed to the oracle as the action's parameter
    /// declaration and used by the registry to validate incoming arguments.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for arg in &self.arguments {
            let mut schema = arg.arg_type.json_schema();
            if let Some(obj) = schema.as_object_mut() {
                obj.insert("description".to_string(), Value::String(arg.description.clone()));
            }
            properties.insert(arg.name.clone(), schema);
            if arg.required {
                required.push(Value::String(arg.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A request from the oracle to run one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: ActionArguments,
    /// Opaque token echoed back on the matching tool result.
    #[serde(default)]
    pub call_id: String,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Value, call_id: impl Into<String>) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { tool_name: tool_name.into(), arguments, call_id: call_id.into() }
    }
}
