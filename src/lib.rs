//! # comfy-gen
//!
//! Async Rust client for text-to-image generation against a
//! [ComfyUI](https://github.com/comfyanonymous/ComfyUI) server.
//!
//! Instead of building workflows node by node, `comfy-gen` starts from a
//! workflow template JSON exported from ComfyUI, hydrates it with the
//! caller's parameters at configurable field addresses, queues it via
//! `/prompt`, polls `/history` until outputs appear, and resolves the
//! reported images into fetchable `/view` URLs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use comfy_gen::{GenClient, GenerationRequest};
//!
//! # async fn example() -> comfy_gen::Result<()> {
//! let client = GenClient::new("http://127.0.0.1:8188");
//!
//! let result = client
//!     .generate(
//!         &GenerationRequest::new("a sunset over mountains")
//!             .negative("lowres, blurry")
//!             .size(1024, 1024)
//!             .steps(30),
//!     )
//!     .await?;
//!
//! println!("prompt {} produced {} image(s)", result.prompt_id, result.images.len());
//! for image in &result.images {
//!     let bytes = client.fetch_image(image).await?;
//!     std::fs::write(&image.filename, &bytes).unwrap();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Cancellation
//!
//! Every network operation in a call races a [`CancellationToken`]; pass one
//! to [`GenClient::generate_with_signal`] to abort an in-flight generation
//! (e.g. when the user navigates away):
//!
//! ```no_run
//! use comfy_gen::{CancellationToken, GenClient, GenerationRequest};
//!
//! # async fn example() -> comfy_gen::Result<()> {
//! let client = GenClient::new("http://127.0.0.1:8188");
//! let token = CancellationToken::new();
//!
//! let request = GenerationRequest::new("a cat");
//! let pending = client.generate_with_signal(&request, token.clone());
//! // elsewhere: token.cancel();
//! let result = pending.await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod signal;
pub mod types;
pub mod workflow;

pub use client::GenClient;
pub use config::{server_presets, FieldAddress, ServerPreset, WorkflowConfig};
pub use error::{GenError, Result};
pub use types::{GeneratedImage, GenerationRequest, GenerationResult, QueuedJob};

// The cancellation token type accepted by `generate_with_signal`.
pub use tokio_util::sync::CancellationToken;
