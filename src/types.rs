use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied parameters for a single generation.
///
/// Only `prompt` is required; every other field falls back to whatever the
/// workflow template carries at that address.
///
/// # Example
/// ```
/// use comfy_gen::GenerationRequest;
///
/// let request = GenerationRequest::new("a cat in space")
///     .negative("lowres, blurry")
///     .size(1024, 1024)
///     .steps(30)
///     .seed(42);
///
/// assert_eq!(request.width, Some(1024));
/// assert_eq!(request.seed, Some(42));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Positive prompt text.
    pub prompt: String,
    /// Negative prompt text.
    pub negative_prompt: Option<String>,
    /// Output width in pixels.
    pub width: Option<u32>,
    /// Output height in pixels.
    pub height: Option<u32>,
    /// Sampler seed.
    pub seed: Option<i64>,
    /// Number of sampling steps.
    pub steps: Option<u32>,
}

impl GenerationRequest {
    /// Create a request with just a positive prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the negative prompt.
    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    /// Set output dimensions.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the sampler seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the number of sampling steps.
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }
}

/// Server acknowledgment of a submitted workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct QueuedJob {
    /// Server-assigned identifier for the queued prompt.
    pub prompt_id: String,
    /// Position in the execution queue.
    pub number: i64,
}

/// A generated output image, resolved to a fetchable URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Fully-qualified `/view` URL for this image.
    pub url: String,
    /// Filename as reported by the server.
    pub filename: String,
    /// Output subfolder, when the server reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
    /// Image type as reported by the server (usually `"output"`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

/// Result of a completed generation.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Server-assigned prompt identifier.
    pub prompt_id: String,
    /// Resolved output images in server-reported order.
    pub images: Vec<GeneratedImage>,
    /// The raw history entry the images were extracted from.
    pub raw_history: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = GenerationRequest::new("test prompt");
        assert_eq!(request.prompt, "test prompt");
        assert!(request.negative_prompt.is_none());
        assert!(request.width.is_none());
        assert!(request.height.is_none());
        assert!(request.seed.is_none());
        assert!(request.steps.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("a cat")
            .negative("blurry")
            .size(512, 768)
            .seed(-1)
            .steps(25);
        assert_eq!(request.negative_prompt.as_deref(), Some("blurry"));
        assert_eq!(request.width, Some(512));
        assert_eq!(request.height, Some(768));
        assert_eq!(request.seed, Some(-1));
        assert_eq!(request.steps, Some(25));
    }

    #[test]
    fn test_queued_job_deserialization() {
        let job: QueuedJob =
            serde_json::from_str(r#"{"prompt_id": "abc-123", "number": 4}"#).unwrap();
        assert_eq!(job.prompt_id, "abc-123");
        assert_eq!(job.number, 4);
    }

    #[test]
    fn test_generated_image_serialization() {
        let image = GeneratedImage {
            url: "http://host:8188/view?filename=a.png&type=output".to_string(),
            filename: "a.png".to_string(),
            subfolder: None,
            image_type: Some("output".to_string()),
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"type\":\"output\""));
        assert!(!json.contains("subfolder"));
    }
}
