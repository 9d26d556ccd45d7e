//! Shared data models for the SiteReel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and the job status state machine
//! - Scraped page content bundles
//! - Image candidates, filter criteria and acquired images

pub mod content;
pub mod image;
pub mod job;

// Re-export common types
pub use content::{ContentBundle, Heading};
pub use image::{AcquiredImage, FilterCriteria, ImageCandidate};
pub use job::{Job, JobId, JobStatus};
