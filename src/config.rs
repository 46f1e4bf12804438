use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Location of an override point inside a workflow template: a node id plus
/// a dotted key path within that node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAddress {
    /// Identifier of the target node in the workflow's node map.
    pub node_id: String,
    /// Dotted path inside the node, e.g. `"inputs.text"`.
    pub path: String,
}

impl FieldAddress {
    /// Create a field address from a node id and a dotted path.
    pub fn new(node_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            path: path.into(),
        }
    }
}

/// Maps logical generation parameters to addresses inside a workflow
/// template.
///
/// Fields left as `None` are never written during hydration; the template
/// value at that point is used as-is. The default configuration targets the
/// bundled flux text2img workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Path to the base workflow JSON document.
    pub workflow_path: PathBuf,
    /// Address of the positive prompt text.
    pub positive_prompt: Option<FieldAddress>,
    /// Address of the negative prompt text.
    pub negative_prompt: Option<FieldAddress>,
    /// Address of the output width.
    pub width: Option<FieldAddress>,
    /// Address of the output height.
    pub height: Option<FieldAddress>,
    /// Address of the sampler seed.
    pub seed: Option<FieldAddress>,
    /// Address of the sampler step count.
    pub steps: Option<FieldAddress>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            workflow_path: PathBuf::from("workflows/flux-text2img.sample.json"),
            positive_prompt: Some(FieldAddress::new("9", "inputs.text")),
            negative_prompt: Some(FieldAddress::new("10", "inputs.text")),
            width: Some(FieldAddress::new("11", "inputs.width")),
            height: Some(FieldAddress::new("11", "inputs.height")),
            seed: Some(FieldAddress::new("12", "inputs.seed")),
            steps: Some(FieldAddress::new("13", "inputs.steps")),
        }
    }
}

impl WorkflowConfig {
    /// Build a configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// Recognized variables: `WORKFLOW_PATH`, `PROMPT_NODE_ID`,
    /// `PROMPT_NODE_PATH`, `NEGATIVE_NODE_ID`, `NEGATIVE_NODE_PATH`,
    /// `SIZE_NODE_ID`, `SIZE_WIDTH_PATH`, `SIZE_HEIGHT_PATH`,
    /// `SEED_NODE_ID`, `SEED_NODE_PATH`, `STEPS_NODE_ID`, `STEPS_NODE_PATH`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            workflow_path: env::var("WORKFLOW_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.workflow_path),
            positive_prompt: env_field("PROMPT_NODE_ID", "PROMPT_NODE_PATH", defaults.positive_prompt),
            negative_prompt: env_field(
                "NEGATIVE_NODE_ID",
                "NEGATIVE_NODE_PATH",
                defaults.negative_prompt,
            ),
            width: env_field("SIZE_NODE_ID", "SIZE_WIDTH_PATH", defaults.width),
            height: env_field("SIZE_NODE_ID", "SIZE_HEIGHT_PATH", defaults.height),
            seed: env_field("SEED_NODE_ID", "SEED_NODE_PATH", defaults.seed),
            steps: env_field("STEPS_NODE_ID", "STEPS_NODE_PATH", defaults.steps),
        }
    }
}

fn env_field(id_var: &str, path_var: &str, default: Option<FieldAddress>) -> Option<FieldAddress> {
    let default = default?;
    Some(FieldAddress {
        node_id: env::var(id_var).unwrap_or(default.node_id),
        path: env::var(path_var).unwrap_or(default.path),
    })
}

/// A selectable server endpoint preset for the form layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerPreset {
    /// Stable preset identifier.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Base URL of the ComfyUI endpoint; empty when the user must supply one.
    pub base_url: String,
    /// Optional description shown alongside the preset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the preset requires the user to paste an endpoint URL.
    #[serde(default)]
    pub requires_base_url_input: bool,
}

/// Built-in server presets offered by the form layer.
pub fn server_presets() -> Vec<ServerPreset> {
    vec![
        ServerPreset {
            id: "local".to_string(),
            label: "Local Docker Worker".to_string(),
            base_url: "http://127.0.0.1:8188".to_string(),
            description: Some(
                "Connects to a ComfyUI worker exposed from your local Docker container."
                    .to_string(),
            ),
            requires_base_url_input: false,
        },
        ServerPreset {
            id: "runpod".to_string(),
            label: "RunPod Serverless".to_string(),
            base_url: String::new(),
            description: Some(
                "Use this preset when the ComfyUI worker is deployed on RunPod serverless. \
                 Paste the public endpoint URL."
                    .to_string(),
            ),
            requires_base_url_input: true,
        },
        ServerPreset {
            id: "custom".to_string(),
            label: "Custom URL".to_string(),
            base_url: String::new(),
            description: Some("Manually provide a ComfyUI endpoint URL.".to_string()),
            requires_base_url_input: true,
        },
    ]
}
