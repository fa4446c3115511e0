//! Overlay detection by template matching.
//!
//! A single fixed grayscale template is searched for in every captured
//! frame. Detection is best effort: any matching failure is treated the
//! same as "not found".

mod matcher;
mod template;

pub use matcher::{AdDetector, Detection};
pub use template::{load_template, TemplateError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default maximum normalized squared difference accepted as a match.
pub const DEFAULT_THRESHOLD: f32 = 0.05;

/// Errors raised by the matcher on malformed input.
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("template has no pixels")]
    EmptyTemplate,
    #[error("template {template:?} larger than searched image {image:?}")]
    TemplateTooLarge {
        template: (u32, u32),
        image: (u32, u32),
    },
}

/// Detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Path of the template image; loaded as grayscale.
    pub template_path: PathBuf,
    /// Maximum score accepted as a match.
    pub threshold: f32,
    /// Integer decimation factor applied before matching (1 = full resolution).
    pub search_scale: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("templates/ads_inline_fhd_de.png"),
            threshold: DEFAULT_THRESHOLD,
            search_scale: 1,
        }
    }
}
