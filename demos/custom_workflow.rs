//! Point the client at a custom workflow template and field addresses,
//! with cancellation wired to Ctrl-C.
//!
//! ```sh
//! cargo run --example custom_workflow -- /path/to/workflow.json
//! ```

use comfy_gen::{
    server_presets, CancellationToken, FieldAddress, GenClient, GenerationRequest, WorkflowConfig,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comfy_gen=debug".into()),
        )
        .init();

    let preset = &server_presets()[0];
    println!("Using preset '{}' at {}", preset.label, preset.base_url);

    let workflow_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("workflows/flux-text2img.sample.json"));

    let config = WorkflowConfig {
        workflow_path,
        // SDXL-style template: prompt on node 6, sampler settings on node 3
        positive_prompt: Some(FieldAddress::new("6", "inputs.text")),
        negative_prompt: Some(FieldAddress::new("7", "inputs.text")),
        width: Some(FieldAddress::new("5", "inputs.width")),
        height: Some(FieldAddress::new("5", "inputs.height")),
        seed: Some(FieldAddress::new("3", "inputs.seed")),
        steps: Some(FieldAddress::new("3", "inputs.steps")),
    };

    let client = GenClient::new(&preset.base_url).with_workflow_config(config);

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCancelling...");
            ctrl_c.cancel();
        }
    });

    let request = GenerationRequest::new("masterpiece, best quality, landscape painting")
        .negative("lowres, blurry, watermark")
        .seed(42)
        .steps(25);

    match client.generate_with_signal(&request, token).await {
        Ok(result) => {
            println!("Generated {} image(s):", result.images.len());
            for image in &result.images {
                println!("  {}", image.url);
            }
        }
        Err(err) => eprintln!("Generation failed: {}", err),
    }

    Ok(())
}
