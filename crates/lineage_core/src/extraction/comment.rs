//! Decoding of the workflow carried in a clip's comment tag.
//!
//! The comment is a JSON object. Its `prompt` key holds the node-id ->
//! node document as JSON-encoded text (a direct object is accepted too).
//! Only when `prompt` is absent is the `workflow` key consulted, and it must
//! be a direct node-id -> node object. `prompt` always wins when both exist.

use serde_json::Value;

use super::types::{ExtractionError, ExtractionResult};
use crate::models::Workflow;

/// Key holding the executed node graph.
pub const PROMPT_KEY: &str = "prompt";

/// Fallback key holding the node graph as an object.
pub const WORKFLOW_KEY: &str = "workflow";

/// Decode a comment tag into a workflow document.
///
/// Returns `Ok(None)` when the comment carries neither key.
pub fn parse_comment(raw: &str) -> ExtractionResult<Option<Workflow>> {
    let outer: Value =
        serde_json::from_str(raw).map_err(|e| ExtractionError::parse_error("comment tag", e))?;

    if let Some(prompt) = outer.get(PROMPT_KEY) {
        let workflow = match prompt {
            Value::String(text) => serde_json::from_str(text),
            other => serde_json::from_value(other.clone()),
        }
        .map_err(|e| ExtractionError::parse_error("prompt document", e))?;
        return Ok(Some(workflow));
    }

    if let Some(workflow) = outer.get(WORKFLOW_KEY) {
        let workflow = serde_json::from_value(workflow.clone())
            .map_err(|e| ExtractionError::parse_error("workflow document", e))?;
        return Ok(Some(workflow));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;
    use serde_json::json;

    fn load_image_doc(image: &str) -> Value {
        json!({"10": {"class_type": "LoadImage", "inputs": {"image": image}}})
    }

    #[test]
    fn prompt_as_encoded_text() {
        let raw = json!({"prompt": load_image_doc("a.png").to_string()}).to_string();
        let workflow = parse_comment(&raw).unwrap().unwrap();
        assert_eq!(workflow.node("10").unwrap().class_type, NodeKind::LoadImage);
    }

    #[test]
    fn prompt_wins_over_workflow() {
        let raw = json!({
            "workflow": load_image_doc("from_workflow.png"),
            "prompt": load_image_doc("from_prompt.png").to_string(),
        })
        .to_string();
        let workflow = parse_comment(&raw).unwrap().unwrap();
        assert_eq!(
            workflow.node("10").unwrap().input_str("image"),
            Some("from_prompt.png")
        );
    }

    #[test]
    fn workflow_object_used_without_prompt() {
        let raw = json!({"workflow": load_image_doc("b.png")}).to_string();
        let workflow = parse_comment(&raw).unwrap().unwrap();
        assert_eq!(workflow.len(), 1);
    }

    #[test]
    fn comment_without_keys_is_none() {
        assert!(parse_comment(r#"{"title": "x"}"#).unwrap().is_none());
        assert!(parse_comment("[1, 2]").unwrap().is_none());
    }

    #[test]
    fn malformed_comment_is_parse_error() {
        assert!(matches!(
            parse_comment("made with love"),
            Err(ExtractionError::ParseError { .. })
        ));
        let raw = json!({"prompt": "{broken"}).to_string();
        assert!(matches!(parse_comment(&raw), Err(ExtractionError::ParseError { .. })));
    }
}
