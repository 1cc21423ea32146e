use async_trait::async_trait;
use serde_json::{Map, Value, json};
use anyhow::{Result, anyhow};
use evalexpr::{eval_with_context, HashMapContext, ContextWithMutableVariables, DefaultNumericTypes};

use crate::ops::{NodeOperation, SocketValues};

/// Emits the configured text on the `text` socket.
#[derive(Debug)]
pub struct TextInputOp;

#[async_trait]
impl NodeOperation for TextInputOp {
    async fn run(&self, _inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let text = config
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let mut out = SocketValues::new();
        out.insert("text".to_string(), json!(text));
        Ok(out)
    }
}

/// Emits the configured number on the `value` socket.
#[derive(Debug)]
pub struct NumberInputOp;

#[async_trait]
impl NodeOperation for NumberInputOp {
    async fn run(&self, _inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let value = config.get("value").cloned().unwrap_or(json!(0));
        if !value.is_number() {
            return Err(anyhow!("'value' must be a number, got {}", value));
        }
        let mut out = SocketValues::new();
        out.insert("value".to_string(), value);
        Ok(out)
    }
}

/// Emits the whole configuration map as a settings object.
#[derive(Debug)]
pub struct SettingsOp;

#[async_trait]
impl NodeOperation for SettingsOp {
    async fn run(&self, _inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let mut out = SocketValues::new();
        out.insert("settings".to_string(), Value::Object(config.clone()));
        Ok(out)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitutes `{a}` and `{b}` in the configured template string.
#[derive(Debug)]
pub struct TemplateOp;

#[async_trait]
impl NodeOperation for TemplateOp {
    async fn run(&self, inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let template = config
            .get("template")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("missing 'template' configuration"))?;

        let mut rendered = template.to_string();
        for (socket, value) in inputs {
            let placeholder = format!("{{{}}}", socket);
            rendered = rendered.replace(&placeholder, &value_to_text(value));
        }

        let mut out = SocketValues::new();
        out.insert("text".to_string(), json!(rendered));
        Ok(out)
    }
}

/// Evaluates the configured expression over the numeric inputs `a` and `b`.
#[derive(Debug)]
pub struct MathOp;

#[async_trait]
impl NodeOperation for MathOp {
    async fn run(&self, inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let expression = config
            .get("expression")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("missing 'expression' configuration"))?;

        let mut eval_ctx = HashMapContext::<DefaultNumericTypes>::new();
        for (socket, value) in inputs {
            let ev = match value {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        evalexpr::Value::Int(i)
                    } else if let Some(f) = n.as_f64() {
                        evalexpr::Value::Float(f)
                    } else {
                        return Err(anyhow!("input '{}' is not a usable number", socket));
                    }
                }
                other => return Err(anyhow!("input '{}' is not numeric: {}", socket, other)),
            };
            eval_ctx
                .set_value(socket.clone(), ev)
                .map_err(|e| anyhow!("failed to bind input '{}': {}", socket, e))?;
        }

        let result = eval_with_context(expression, &eval_ctx)
            .map_err(|e| anyhow!("expression '{}' failed: {}", expression, e))?;

        let value = match result {
            evalexpr::Value::Int(i) => json!(i),
            evalexpr::Value::Float(f) => json!(f),
            other => return Err(anyhow!("expression '{}' did not produce a number: {:?}", expression, other)),
        };

        let mut out = SocketValues::new();
        out.insert("value".to_string(), value);
        Ok(out)
    }
}

/// Terminal passthrough for output nodes: echoes its inputs so the run
/// report surfaces the final values.
#[derive(Debug)]
pub struct CollectOp;

#[async_trait]
impl NodeOperation for CollectOp {
    async fn run(&self, inputs: &SocketValues, _config: &Map<String, Value>) -> Result<SocketValues> {
        Ok(inputs.clone())
    }
}
