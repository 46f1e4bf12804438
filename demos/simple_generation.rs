//! Generate a single image from a text prompt.
//!
//! Requires a running ComfyUI instance at http://127.0.0.1:8188 with the
//! models referenced by `workflows/flux-text2img.sample.json` installed.
//!
//! ```sh
//! cargo run --example simple_generation
//! ```

use comfy_gen::{GenClient, GenerationRequest};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comfy_gen=debug".into()),
        )
        .init();

    let client = GenClient::new("http://127.0.0.1:8188");

    let request = GenerationRequest::new("a beautiful sunset over mountains")
        .negative("lowres, blurry, bad anatomy")
        .size(1024, 1024)
        .steps(30);

    println!("Submitting workflow...");
    let result = client.generate(&request).await?;

    println!("Prompt {} produced {} image(s)", result.prompt_id, result.images.len());
    for image in &result.images {
        println!("  {}", image.url);
        let bytes = client.fetch_image(image).await?;
        std::fs::write(&image.filename, &bytes)?;
        println!("  Saved: {}", image.filename);
    }

    Ok(())
}
