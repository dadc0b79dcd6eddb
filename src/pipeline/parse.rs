//! Parsers for the three JSON-shaped service replies.
//!
//! Models wrap JSON in markdown fences or chatter around it; parsing is a
//! two-step affair: locate and parse a JSON value (`CallError::Parse` on
//! failure), then check its shape (`CallError::Schema`).

use serde_json::Value;

use crate::schema::{RecipeField, RecipeRecord};
use crate::service::CallError;

/// Verdict of one classification pass.
#[derive(Debug, Clone)]
pub struct ClassificationVerdict {
    pub is_recipe: bool,
    pub reason: String,
    pub pass: u8,
}

/// Locate and parse the JSON value in a model reply. Accepts fenced
/// json blocks, bare JSON, or JSON embedded in surrounding prose.
pub fn extract_json(body: &str) -> Result<Value, CallError> {
    let candidate = if let Some(fenced) = fenced_block(body) {
        fenced
    } else {
        let start = body
            .find('{')
            .ok_or_else(|| CallError::Parse("no JSON object in response".into()))?;
        let end = body
            .rfind('}')
            .ok_or_else(|| CallError::Parse("unterminated JSON object".into()))?;
        if end < start {
            return Err(CallError::Parse("unterminated JSON object".into()));
        }
        &body[start..=end]
    };
    serde_json::from_str(candidate.trim()).map_err(|e| CallError::Parse(e.to_string()))
}

fn fenced_block(body: &str) -> Option<&str> {
    let start = body.find("```json")? + "```json".len();
    let end = body[start..].find("```")?;
    Some(&body[start..start + end])
}

pub fn parse_verdict(body: &str, pass: u8) -> Result<ClassificationVerdict, CallError> {
    let value = extract_json(body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| CallError::Schema("verdict is not a JSON object".into()))?;
    let is_recipe = obj
        .get("is_recipe")
        .and_then(Value::as_bool)
        .ok_or_else(|| CallError::Schema("verdict missing is_recipe".into()))?;
    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Ok(ClassificationVerdict { is_recipe, reason, pass })
}

pub fn parse_record(body: &str) -> Result<RecipeRecord, CallError> {
    let value = extract_json(body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| CallError::Schema("structured reply is not a JSON object".into()))?;
    Ok(RecipeRecord::from_json_object(obj))
}

/// Parse an enrichment reply into (field, value) pairs restricted to the
/// nutrition subset. Fields absent from the reply are simply not returned.
pub fn parse_nutrition(body: &str) -> Result<Vec<(RecipeField, String)>, CallError> {
    let value = extract_json(body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| CallError::Schema("enrichment reply is not a JSON object".into()))?;
    let mut updates = Vec::new();
    for field in RecipeField::NUTRITION {
        if let Some(v) = obj.get(field.key()) {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            updates.push((field, text));
        }
    }
    Ok(updates)
}
