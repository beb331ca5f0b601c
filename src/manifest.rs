//! Image manifest loading.
//!
//! The extraction step that stores images writes a JSON manifest next to
//! them. Two shapes are accepted:
//!
//! ```json
//! [{"sequence_index": 1, "source_page": 2, "file_reference": "images/a/image_001.png"}]
//! ```
//!
//! ```json
//! {"total_pages": 12, "images": [{"sequence_index": 1, "file_reference": "image_001.png"}]}
//! ```

use crate::error::Result;
use crate::model::ImageDescriptor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Extracted images plus the page count of the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageManifest {
    /// Page count of the source document, when known
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Extracted images
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestShape {
    List(Vec<ImageDescriptor>),
    Full(ImageManifest),
}

impl ImageManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest = match serde_json::from_str::<ManifestShape>(json)? {
            ManifestShape::List(images) => ImageManifest {
                total_pages: None,
                images,
            },
            ManifestShape::Full(manifest) => manifest,
        };
        Ok(manifest)
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let manifest = Self::from_json(&json)?;
        log::info!("Loaded {} images from {}", manifest.images.len(), path.display());
        Ok(manifest)
    }

    /// Override the page count, keeping the manifest's value when `pages` is `None`.
    pub fn with_total_pages(mut self, pages: Option<u32>) -> Self {
        if pages.is_some() {
            self.total_pages = pages;
        }
        self
    }
}
