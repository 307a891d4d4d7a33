//! The action registry.
//!
//! Maps action names to their declaration and handler. Built once at
//! startup, then shared read-only behind an `Arc`. Nothing registers or
//! removes actions while runs are in flight.
//!
//! Dispatch runs in three gates, each with its own error:
//!
//! 1. name lookup                       → `UnknownAction`
//! 2. argument coercion + JSON Schema    → `InvalidArguments`
//! 3. handler                            → whatever the handler returns

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Number, Value};
use tracing::debug;

use autobook_contracts::{
    action::{ActionArguments, ActionSpec, ArgType, ToolCallRequest},
    error::{AutobookError, AutobookResult},
};

use crate::traits::ActionHandler;

/// One registered action.
struct RegisteredAction {
    /// The declaration advertised to the oracle.
    spec: ActionSpec,

    /// Compiled from `spec.json_schema()` at registration time.
    validator: jsonschema::Validator,

    /// Runs validated calls.
    handler: Arc<dyn ActionHandler>,
}

/// Name → (declaration, handler) table consulted by tool execution.
///
/// # Thread safety
///
/// Read-only once built. The executor holds it behind an `Arc` and
/// `dispatch` takes `&self`, so calls from one batch run concurrently.
#[derive(Default)]
pub struct ActionRegistry {
    /// Actions in registration order.
    entries: Vec<RegisteredAction>,

    /// Action name to its index in `entries`.
    by_name: HashMap<String, usize>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action.
    ///
    /// Fails with `ConfigError` when the name is taken or the declaration
    /// does not compile to a valid JSON Schema.
    pub fn register(&mut self, spec: ActionSpec, handler: Arc<dyn ActionHandler>) -> AutobookResult<()> {
        if self.by_name.contains_key(&spec.name) {
            return Err(AutobookError::ConfigError {
                reason: format!("action '{}' is already registered", spec.name),
            });
        }
        let validator = jsonschema::validator_for(&spec.json_schema()).map_err(|e| {
            AutobookError::ConfigError {
                reason: format!("action '{}' has an invalid argument schema: {e}", spec.name),
            }
        })?;

        self.by_name.insert(spec.name.clone(), self.entries.len());
        self.entries.push(RegisteredAction { spec, validator, handler });
        Ok(())
    }

    /// Declarations of every action, in registration order.
    pub fn specs(&self) -> Vec<ActionSpec> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn spec(&self, name: &str) -> Option<&ActionSpec> {
        self.by_name.get(name).map(|&i| &self.entries[i].spec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve and validate a call without running it.
    ///
    /// Returns the coerced arguments the handler would receive.
    pub fn prepare(&self, call: &ToolCallRequest) -> AutobookResult<ActionArguments> {
        let entry = self.lookup(&call.tool_name)?;
        validate_arguments(entry, &call.arguments)
    }

    /// Resolve, validate, and run a call.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> AutobookResult<String> {
        let entry = self.lookup(&call.tool_name)?;
        let arguments = validate_arguments(entry, &call.arguments)?;
        debug!(tool = %call.tool_name, call_id = %call.call_id, "dispatching action");
        entry.handler.invoke(&arguments).await
    }

    fn lookup(&self, name: &str) -> AutobookResult<&RegisteredAction> {
        self.by_name
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| AutobookError::UnknownAction { name: name.to_string() })
    }
}

/// Check `raw` against the declared arguments of `entry`.
///
/// Missing optional arguments are dropped, present ones are coerced to
/// their declared type, and the result is validated against the compiled
/// schema. Unknown arguments never reach the handler.
fn validate_arguments(entry: &RegisteredAction, raw: &ActionArguments) -> AutobookResult<ActionArguments> {
    let spec = &entry.spec;
    let mut coerced = Map::new();

    for arg in &spec.arguments {
        match raw.get(&arg.name) {
            None | Some(Value::Null) => {
                if arg.required {
                    return Err(AutobookError::InvalidArguments {
                        action: spec.name.clone(),
                        reason: format!("missing required argument '{}'", arg.name),
                    });
                }
            }
            Some(value) => {
                let value = coerce(arg.arg_type, value).ok_or_else(|| AutobookError::InvalidArguments {
                    action: spec.name.clone(),
                    reason: format!("argument '{}' must be {}, got {}", arg.name, arg.arg_type, value),
                })?;
                coerced.insert(arg.name.clone(), value);
            }
        }
    }

    // Final structural gate over the coerced arguments.
    let instance = Value::Object(coerced);
    let failures: Vec<String> = entry
        .validator
        .iter_errors(&instance)
        .map(|e| format!("{} at '{}'", e, e.instance_path))
        .collect();
    if !failures.is_empty() {
        return Err(AutobookError::InvalidArguments {
            action: spec.name.clone(),
            reason: failures.join("; "),
        });
    }

    let Value::Object(arguments) = instance else {
        return Err(AutobookError::StateViolation {
            reason: "coerced arguments are not an object".to_string(),
        });
    };
    Ok(arguments)
}

/// Convert `value` to `arg_type` where the intent is unambiguous.
fn coerce(arg_type: ArgType, value: &Value) -> Option<Value> {
    match (arg_type, value) {
        (ArgType::String, Value::String(_)) => Some(value.clone()),
        (ArgType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ArgType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (ArgType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Some(value.clone())
            } else {
                // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| json!(f as i64))
            }
        }
        (ArgType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (ArgType::Number, Value::Number(_)) => Some(value.clone()),
        (ArgType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),

        (ArgType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ArgType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        (ArgType::StringList, Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(|s| Value::String(s.to_string())))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (ArgType::StringList, Value::String(s)) => Some(json!([s])),

        _ => None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use autobook_contracts::{
        action::{ActionArguments, ActionSpec, ArgType, ArgumentSpec, ToolCallRequest},
        error::{AutobookError, AutobookResult, ErrorKind},
    };

    use super::ActionRegistry;
    use crate::traits::ActionHandler;

    /// Records the arguments of every invocation.
    struct RecordingHandler {
        seen: Arc<Mutex<Vec<ActionArguments>>>,
    }

    #[async_trait]
    impl ActionHandler for RecordingHandler {
        async fn invoke(&self, arguments: &ActionArguments) -> AutobookResult<String> {
            self.seen.lock().unwrap().push(arguments.clone());
            Ok("done".to_string())
        }
    }

    fn invite_spec() -> ActionSpec {
        ActionSpec {
            name: "create_calendar_invite".to_string(),
            description: "Create an invite".to_string(),
            arguments: vec![
                ArgumentSpec::required("date", ArgType::String, "YYYY-MM-DD"),
                ArgumentSpec::required("duration_minutes", ArgType::Integer, "length"),
                ArgumentSpec::optional("participants", ArgType::StringList, "emails"),
                ArgumentSpec::optional("reminder", ArgType::Boolean, "send a reminder"),
            ],
        }
    }

    fn registry() -> (ActionRegistry, Arc<Mutex<Vec<ActionArguments>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ActionRegistry::new();
        registry
            .register(invite_spec(), Arc::new(RecordingHandler { seen: seen.clone() }))
            .unwrap();
        (registry, seen)
    }

    fn call(arguments: serde_json::Value) -> ToolCallRequest {
        ToolCallRequest::new("create_calendar_invite", arguments, "call-1")
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut registry, seen) = registry();
        let err = registry
            .register(invite_spec(), Arc::new(RecordingHandler { seen }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_action_is_reported_by_name() {
        let (registry, _) = registry();
        let err = registry
            .dispatch(&ToolCallRequest::new("teleport", json!({}), "c"))
            .await
            .unwrap_err();
        assert_eq!(err, AutobookError::UnknownAction { name: "teleport".to_string() });
    }

    #[tokio::test]
    async fn missing_required_argument_is_invalid() {
        let (registry, seen) = registry();
        let err = registry.dispatch(&call(json!({ "date": "2026-10-20" }))).await.unwrap_err();

        match err {
            AutobookError::InvalidArguments { reason, .. } => {
                assert!(reason.contains("duration_minutes"), "unexpected reason: {reason}");
            }
            other => panic!("expected InvalidArguments, got {:?}", other),
        }
        assert!(seen.lock().unwrap().is_empty(), "handler must not run on invalid arguments");
    }

    #[tokio::test]
    async fn mistyped_argument_is_invalid() {
        let (registry, _) = registry();
        let err = registry
            .dispatch(&call(json!({ "date": "2026-10-20", "duration_minutes": "half an hour" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    }

    #[tokio::test]
    async fn arguments_are_coerced_before_dispatch() {
        let (registry, seen) = registry();
        let out = registry
            .dispatch(&call(json!({
                "date": "2026-10-20",
                "duration_minutes": "30",
                "participants": "a@example.com",
                "reminder": "TRUE",
                "unexpected": 1
            })))
            .await
            .unwrap();
        assert_eq!(out, "done");

        let seen = seen.lock().unwrap();
        let args = &seen[0];
        assert_eq!(args["duration_minutes"], json!(30));
        assert_eq!(args["participants"], json!(["a@example.com"]));
        assert_eq!(args["reminder"], json!(true));
        assert!(!args.contains_key("unexpected"), "undeclared arguments are dropped");
    }

    #[test]
    fn prepare_validates_without_running() {
        let (registry, seen) = registry();
        let args = registry
            .prepare(&call(json!({ "date": 20261020, "duration_minutes": 45.0 })))
            .unwrap();
        assert_eq!(args["date"], json!("20261020"));
        assert_eq!(args["duration_minutes"], json!(45));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn out_of_range_float_is_not_an_integer() {
        let (registry, seen) = registry();

        for huge in [json!(1e30), json!(-1e30), json!(9_223_372_036_854_775_808.0)] {
            let err = registry
                .prepare(&call(json!({ "date": "2026-10-20", "duration_minutes": huge })))
                .unwrap_err();
            match err {
                AutobookError::InvalidArguments { reason, .. } => {
                    assert!(reason.contains("duration_minutes"), "unexpected reason: {reason}");
                }
                other => panic!("expected InvalidArguments, got {:?}", other),
            }
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn specs_keep_registration_order() {
        let (mut registry, seen) = registry();
        registry
            .register(
                ActionSpec {
                    name: "search_knowledge_base".to_string(),
                    description: "Search".to_string(),
                    arguments: vec![ArgumentSpec::required("query", ArgType::String, "query")],
                },
                Arc::new(RecordingHandler { seen }),
            )
            .unwrap();

        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["create_calendar_invite", "search_knowledge_base"]);
        assert!(registry.spec("search_knowledge_base").is_some());
    }
}
