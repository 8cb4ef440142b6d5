//! Argument normalization applied before a call is forwarded
//!
//! Agents regularly flatten nested payloads, emit malformed cron strings, or
//! attach multi-step plans to jobs. These hooks repair or reject such
//! payloads in one place instead of in every backend.

use std::str::FromStr;

use cron::Schedule;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OrchestratorError, Result};

/// Keys whose string values must be valid cron expressions
const SCHEDULE_KEYS: &[&str] = &["cronExpression", "cron"];

/// Object that may carry a nested plan or schedule
const ACTION_KEY: &str = "action";

/// Moves flattened top-level keys back under `field`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingRule {
    /// Original tool names the rule applies to; empty means all tools
    #[serde(default)]
    pub tools: Vec<String>,
    pub field: String,
    pub keys: Vec<String>,
}

impl NestingRule {
    fn applies_to(&self, tool: &str) -> bool {
        self.tools.is_empty() || self.tools.iter().any(|t| t == tool)
    }
}

/// Built-in rules for job payloads whose `action` was flattened
pub fn default_nesting_rules() -> Vec<NestingRule> {
    vec![NestingRule {
        tools: vec!["create_job".to_string(), "queue_task".to_string()],
        field: ACTION_KEY.to_string(),
        keys: vec!["toolName".to_string(), "parameters".to_string()],
    }]
}

/// Runs the normalization hooks in order
#[derive(Debug, Clone)]
pub struct ArgumentNormalizer {
    rules: Vec<NestingRule>,
}

impl ArgumentNormalizer {
    pub fn new(rules: Vec<NestingRule>) -> Self {
        Self { rules }
    }

    /// Normalize `args` for a call to `tool` (original name)
    pub fn normalize(&self, tool: &str, args: Value) -> Result<Value> {
        let Value::Object(mut map) = args else {
            return Ok(args);
        };

        renest_dotted_keys(&mut map);
        for rule in self.rules.iter().filter(|r| r.applies_to(tool)) {
            apply_nesting_rule(&mut map, rule);
        }

        validate_schedules(&map)?;
        if let Some(Value::Object(action)) = map.get(ACTION_KEY) {
            validate_schedules(action)?;
        }

        if strip_plan(&mut map) {
            info!("Stripped multi-step plan from '{}' call", tool);
        }
        if let Some(Value::Object(action)) = map.get_mut(ACTION_KEY) {
            if strip_plan(action) {
                info!("Stripped multi-step plan from '{}' action", tool);
            }
        }

        Ok(Value::Object(map))
    }
}

impl Default for ArgumentNormalizer {
    fn default() -> Self {
        Self::new(default_nesting_rules())
    }
}

/// `{"a.b": 1}` becomes `{"a": {"b": 1}}`
fn renest_dotted_keys(map: &mut Map<String, Value>) {
    let dotted: Vec<String> = map
        .keys()
        .filter(|k| k.contains('.') && !k.starts_with('.') && !k.ends_with('.'))
        .cloned()
        .collect();

    for key in dotted {
        let Some(value) = map.remove(&key) else { continue };
        let path: Vec<&str> = key.split('.').collect();
        if !insert_path(map, &path, value.clone()) {
            // Path blocked by a non-object value, keep the key as sent
            map.insert(key, value);
        }
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &[&str], value: Value) -> bool {
    match path {
        [] => false,
        [leaf] => {
            if map.contains_key(*leaf) {
                return false;
            }
            map.insert(leaf.to_string(), value);
            true
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(child) => insert_path(child, rest, value),
                _ => false,
            }
        }
    }
}

fn apply_nesting_rule(map: &mut Map<String, Value>, rule: &NestingRule) {
    if map.contains_key(&rule.field) {
        return;
    }
    let present: Vec<&String> = rule.keys.iter().filter(|k| map.contains_key(k.as_str())).collect();
    if present.is_empty() {
        return;
    }

    let mut nested = Map::new();
    for key in present {
        if let Some(value) = map.remove(key.as_str()) {
            nested.insert(key.clone(), value);
        }
    }
    debug!("Re-nested {} flattened keys under '{}'", nested.len(), rule.field);
    map.insert(rule.field.clone(), Value::Object(nested));
}

fn validate_schedules(map: &Map<String, Value>) -> Result<()> {
    for key in SCHEDULE_KEYS {
        if let Some(Value::String(expr)) = map.get(*key) {
            validate_cron(expr)?;
        }
    }
    Ok(())
}

/// Accepts 5-field (minute-first) and 6/7-field (seconds-first) expressions
pub fn validate_cron(expression: &str) -> Result<()> {
    let fields = expression.split_whitespace().count();
    let normalized = match fields {
        5 => format!("0 {}", expression.trim()),
        6 | 7 => expression.trim().to_string(),
        n => {
            return Err(OrchestratorError::InvalidSchedule {
                expression: expression.to_string(),
                message: format!("expected 5 fields, found {}", n),
            });
        }
    };

    Schedule::from_str(&normalized)
        .map(|_| ())
        .map_err(|e| OrchestratorError::InvalidSchedule {
            expression: expression.to_string(),
            message: e.to_string(),
        })
}

/// Replace a multi-step `plan` with the list of tools it needs
fn strip_plan(map: &mut Map<String, Value>) -> bool {
    let steps = match map.get("plan") {
        Some(Value::Array(steps)) if steps.len() > 1 => steps.clone(),
        _ => return false,
    };
    map.remove("plan");

    let mut required: Vec<Value> = match map.remove("requiredTools") {
        Some(Value::Array(existing)) => existing,
        _ => Vec::new(),
    };
    for step in &steps {
        let tool = step
            .get("toolName")
            .or_else(|| step.get("tool"))
            .and_then(Value::as_str);
        if let Some(tool) = tool {
            let tool = Value::String(tool.to_string());
            if !required.contains(&tool) {
                required.push(tool);
            }
        }
    }
    map.insert("requiredTools".to_string(), Value::Array(required));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(tool: &str, args: Value) -> Result<Value> {
        ArgumentNormalizer::default().normalize(tool, args)
    }

    #[test]
    fn test_non_object_passthrough() {
        assert_eq!(normalize("x", json!("raw")).unwrap(), json!("raw"));
        assert_eq!(normalize("x", Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_plain_args_unchanged() {
        let args = json!({"path": "/tmp/a.txt", "limit": 5});
        assert_eq!(normalize("read_file", args.clone()).unwrap(), args);
    }

    #[test]
    fn test_dotted_keys_renested() {
        let args = json!({"action.toolName": "send_message", "action.parameters.chat_id": "42", "name": "j"});
        let out = normalize("anything", args).unwrap();
        assert_eq!(
            out,
            json!({"name": "j", "action": {"toolName": "send_message", "parameters": {"chat_id": "42"}}})
        );
    }

    #[test]
    fn test_dotted_key_blocked_by_scalar_is_kept() {
        let args = json!({"action": "run", "action.toolName": "x"});
        let out = normalize("anything", args.clone()).unwrap();
        assert_eq!(out, args);
    }

    #[test]
    fn test_nesting_rule_moves_flattened_keys() {
        let args = json!({"name": "daily", "toolName": "send_message", "parameters": {"chat_id": "1"}});
        let out = normalize("create_job", args).unwrap();
        assert_eq!(
            out,
            json!({"name": "daily", "action": {"toolName": "send_message", "parameters": {"chat_id": "1"}}})
        );
    }

    #[test]
    fn test_nesting_rule_scoped_to_tools() {
        let args = json!({"toolName": "x"});
        assert_eq!(normalize("send_message", args.clone()).unwrap(), args);
    }

    #[test]
    fn test_nesting_rule_skips_when_field_present() {
        let args = json!({"action": {"toolName": "a"}, "parameters": {}});
        assert_eq!(normalize("create_job", args.clone()).unwrap(), args);
    }

    #[test]
    fn test_valid_cron_accepted() {
        assert!(normalize("create_job", json!({"cronExpression": "0 9 * * 1-5"})).is_ok());
        assert!(normalize("create_job", json!({"cron": "0 0 9 * * *"})).is_ok());
    }

    #[test]
    fn test_invalid_cron_rejected() {
        let err = normalize("create_job", json!({"cronExpression": "every morning"})).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidSchedule { .. }));
        assert_eq!(err.error_code(), "INVALID_SCHEDULE");

        let err = normalize("create_job", json!({"cronExpression": "99 9 * * *"})).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_invalid_cron_inside_action_rejected() {
        let args = json!({"action": {"cron": "* *"}});
        assert!(normalize("queue_task", args).is_err());
    }

    #[test]
    fn test_multi_step_plan_stripped() {
        let args = json!({
            "name": "digest",
            "plan": [
                {"toolName": "list_emails"},
                {"toolName": "send_message"},
                {"tool": "list_emails"}
            ]
        });
        let out = normalize("create_job", args).unwrap();
        assert!(out.get("plan").is_none());
        assert_eq!(out["requiredTools"], json!(["list_emails", "send_message"]));
        assert_eq!(out["name"], "digest");
    }

    #[test]
    fn test_single_step_plan_kept() {
        let args = json!({"plan": [{"toolName": "list_emails"}]});
        assert_eq!(normalize("create_job", args.clone()).unwrap(), args);
    }

    #[test]
    fn test_plan_inside_action_stripped() {
        let args = json!({"action": {"type": "workflow", "plan": [{"toolName": "a"}, {"toolName": "b"}]}});
        let out = normalize("create_job", args).unwrap();
        assert!(out["action"].get("plan").is_none());
        assert_eq!(out["action"]["requiredTools"], json!(["a", "b"]));
        assert_eq!(out["action"]["type"], "workflow");
    }

    #[test]
    fn test_plan_stripping_merges_existing_required_tools() {
        let args = json!({"requiredTools": ["a"], "plan": [{"toolName": "a"}, {"toolName": "b"}]});
        let out = normalize("create_job", args).unwrap();
        assert_eq!(out["requiredTools"], json!(["a", "b"]));
    }

    #[test]
    fn test_validate_cron_field_count() {
        assert!(validate_cron("*/5 * * * *").is_ok());
        assert!(validate_cron("* * * *").is_err());
        assert!(validate_cron("").is_err());
    }
}
