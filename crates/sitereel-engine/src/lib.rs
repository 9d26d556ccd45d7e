//! The SiteReel pipeline engine.
//!
//! This crate provides:
//! - The job orchestrator and in-memory job registry
//! - The summarizer adapter (language-model client)
//! - The video synthesizer with bounded retry and guaranteed fallback
//! - Engine configuration and the fixed-delay retry utility

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod summarize;
pub mod synthesize;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::{HttpRendererProvider, Orchestrator, RendererProvider, SubmitOptions};
pub use summarize::{summarize_or_fallback, GeminiSummarizer, Summarizer};
pub use synthesize::{
    build_video_prompt, ReplicateSynthesizer, SynthesisOutcome, SynthesisOutput, SynthesisParams,
    SynthesisService, VideoSynthesizer,
};
