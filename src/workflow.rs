use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

use crate::config::{FieldAddress, WorkflowConfig};
use crate::error::{GenError, Result};
use crate::types::GenerationRequest;

const PATH_SEPARATOR: char = '.';

/// Load a workflow template document from disk.
pub async fn load_template(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GenError::TemplateLoad {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| GenError::TemplateParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Produce a hydrated copy of `template` with the request's overrides
/// written at the addresses configured in `config`.
///
/// The source template is never modified. A parameter is written only when
/// both its address and its override value are present; everything else is
/// left at the template default. Overrides addressing a node the template
/// does not contain are skipped with a warning — the workflow is still
/// usable, just without that parameter.
///
/// # Example
/// ```
/// use comfy_gen::{GenerationRequest, WorkflowConfig};
/// use serde_json::json;
///
/// let template = json!({"9": {"inputs": {"text": "placeholder"}}});
/// let request = GenerationRequest::new("a sunset over mountains");
///
/// let hydrated = comfy_gen::workflow::hydrate(&template, &request, &WorkflowConfig::default());
/// assert_eq!(hydrated["9"]["inputs"]["text"], "a sunset over mountains");
/// assert_eq!(template["9"]["inputs"]["text"], "placeholder");
/// ```
pub fn hydrate(template: &Value, request: &GenerationRequest, config: &WorkflowConfig) -> Value {
    let mut workflow = template.clone();

    // Templates exported from the ComfyUI editor wrap the node map in a
    // top-level "nodes" key; API-format templates are the node map itself.
    let has_node_map = workflow.get("nodes").is_some_and(Value::is_object);
    let nodes = if has_node_map {
        &mut workflow["nodes"]
    } else {
        &mut workflow
    };

    apply_field(
        nodes,
        config.positive_prompt.as_ref(),
        Some(Value::from(request.prompt.as_str())),
    );
    apply_field(
        nodes,
        config.negative_prompt.as_ref(),
        request.negative_prompt.as_deref().map(Value::from),
    );
    apply_field(nodes, config.width.as_ref(), request.width.map(Value::from));
    apply_field(nodes, config.height.as_ref(), request.height.map(Value::from));
    apply_field(nodes, config.seed.as_ref(), request.seed.map(Value::from));
    apply_field(nodes, config.steps.as_ref(), request.steps.map(Value::from));

    workflow
}

/// Failure while resolving a dotted path inside a workflow node.
#[derive(Debug, thiserror::Error)]
#[error("path segment '{segment}' is not an object")]
struct PathError {
    segment: String,
}

fn apply_field(nodes: &mut Value, address: Option<&FieldAddress>, value: Option<Value>) {
    let (Some(address), Some(value)) = (address, value) else {
        return;
    };

    let Some(node) = nodes.get_mut(&address.node_id) else {
        warn!(
            node_id = %address.node_id,
            path = %address.path,
            "workflow node not found when applying override, skipping"
        );
        return;
    };

    if let Err(err) = set_path(node, &address.path, value) {
        warn!(
            node_id = %address.node_id,
            path = %address.path,
            error = %err,
            "could not apply workflow override, skipping"
        );
    }
}

/// Walk `path` inside `node`, creating intermediate objects as needed, and
/// set the final segment to `value`.
fn set_path(node: &mut Value, path: &str, value: Value) -> std::result::Result<(), PathError> {
    let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let last = match segments.pop() {
        Some(segment) => segment,
        None => return Ok(()),
    };

    let mut cursor = node;
    for segment in segments {
        let map = cursor.as_object_mut().ok_or_else(|| PathError {
            segment: segment.to_string(),
        })?;
        cursor = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = cursor.as_object_mut().ok_or_else(|| PathError {
        segment: last.to_string(),
    })?;
    map.insert(last.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_template() -> Value {
        json!({
            "9": {"class_type": "CLIPTextEncode", "inputs": {"text": "default positive", "clip": ["4", 1]}},
            "10": {"class_type": "CLIPTextEncode", "inputs": {"text": "default negative", "clip": ["4", 1]}},
            "11": {"class_type": "EmptyLatentImage", "inputs": {"width": 512, "height": 512}},
            "12": {"class_type": "RandomNoise", "inputs": {"seed": 0}},
            "13": {"class_type": "BasicScheduler", "inputs": {"steps": 20}}
        })
    }

    fn make_request() -> GenerationRequest {
        GenerationRequest::new("a cat in space")
            .negative("lowres, blurry")
            .size(1024, 768)
            .seed(12345)
            .steps(30)
    }

    #[test]
    fn test_hydrate_applies_all_overrides() {
        let template = make_template();
        let hydrated = hydrate(&template, &make_request(), &WorkflowConfig::default());

        assert_eq!(hydrated["9"]["inputs"]["text"], "a cat in space");
        assert_eq!(hydrated["10"]["inputs"]["text"], "lowres, blurry");
        assert_eq!(hydrated["11"]["inputs"]["width"], 1024);
        assert_eq!(hydrated["11"]["inputs"]["height"], 768);
        assert_eq!(hydrated["12"]["inputs"]["seed"], 12345);
        assert_eq!(hydrated["13"]["inputs"]["steps"], 30);
    }

    #[test]
    fn test_hydrate_does_not_mutate_source() {
        let template = make_template();
        let before = template.clone();

        let _ = hydrate(&template, &make_request(), &WorkflowConfig::default());
        assert_eq!(template, before);
    }

    #[test]
    fn test_absent_overrides_keep_template_defaults() {
        let template = make_template();
        let request = GenerationRequest::new("only a prompt");
        let hydrated = hydrate(&template, &request, &WorkflowConfig::default());

        assert_eq!(hydrated["9"]["inputs"]["text"], "only a prompt");
        assert_eq!(hydrated["10"]["inputs"]["text"], "default negative");
        assert_eq!(hydrated["11"]["inputs"]["width"], 512);
        assert_eq!(hydrated["12"]["inputs"]["seed"], 0);
        assert_eq!(hydrated["13"]["inputs"]["steps"], 20);
    }

    #[test]
    fn test_unconfigured_address_is_never_written() {
        let template = make_template();
        let config = WorkflowConfig {
            steps: None,
            ..WorkflowConfig::default()
        };
        let hydrated = hydrate(&template, &make_request(), &config);

        assert_eq!(hydrated["13"]["inputs"]["steps"], 20);
        assert_eq!(hydrated["9"]["inputs"]["text"], "a cat in space");
    }

    #[test]
    fn test_missing_node_is_skipped() {
        let template = json!({
            "9": {"inputs": {"text": "default"}}
        });
        let hydrated = hydrate(&template, &make_request(), &WorkflowConfig::default());

        // node 9 exists and is overridden; nodes 10-13 are absent and skipped
        assert_eq!(hydrated["9"]["inputs"]["text"], "a cat in space");
        assert!(hydrated.get("11").is_none());
    }

    #[test]
    fn test_hydrate_unwraps_nodes_key() {
        let template = json!({
            "nodes": {
                "9": {"inputs": {"text": "default"}}
            },
            "meta": {"version": 1}
        });
        let hydrated = hydrate(&template, &make_request(), &WorkflowConfig::default());

        assert_eq!(hydrated["nodes"]["9"]["inputs"]["text"], "a cat in space");
        assert_eq!(hydrated["meta"]["version"], 1);
    }

    #[test]
    fn test_set_path_creates_intermediate_levels() {
        let mut node = json!({});
        set_path(&mut node, "inputs.noise.seed", json!(7)).unwrap();
        assert_eq!(node, json!({"inputs": {"noise": {"seed": 7}}}));
    }

    #[test]
    fn test_set_path_overwrites_existing_value() {
        let mut node = json!({"inputs": {"text": "old"}});
        set_path(&mut node, "inputs.text", json!("new")).unwrap();
        assert_eq!(node["inputs"]["text"], "new");
    }

    #[test]
    fn test_set_path_rejects_non_object_intermediate() {
        let mut node = json!({"inputs": "not a map"});
        let err = set_path(&mut node, "inputs.text", json!("value")).unwrap_err();
        assert!(err.to_string().contains("not an object"));
        assert_eq!(node["inputs"], "not a map");
    }

    #[tokio::test]
    async fn test_load_template_missing_file() {
        let err = load_template(Path::new("workflows/does-not-exist.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::TemplateLoad { .. }));
    }

    #[tokio::test]
    async fn test_load_bundled_sample_template() {
        let template = load_template(Path::new("workflows/flux-text2img.sample.json"))
            .await
            .unwrap();
        assert!(template.get("9").is_some());
        assert!(template["9"]["inputs"].get("text").is_some());
    }
}
