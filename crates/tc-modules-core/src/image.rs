//! Image reference configuration
//!
//! Each module ships a default image which can be overridden from the
//! environment, so CI can pin or mirror images without code changes.

use std::fmt;

use testcontainers::GenericImage;
use tracing::debug;

use crate::error::ImageError;

const DEFAULT_TAG: &str = "latest";

/// A Docker image name and tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Parse `name[:tag]`
    ///
    /// A colon before the last `/` belongs to a registry host
    /// (`localhost:5000/vault`), not a tag. Missing tags default to `latest`.
    /// Digest references (`name@sha256:...`) are rejected.
    pub fn parse(reference: &str) -> Result<Self, ImageError> {
        if reference.contains('@') {
            return Err(ImageError::Digest(reference.to_string()));
        }

        let last_segment = reference.rfind('/').map_or(0, |i| i + 1);
        let image = match reference[last_segment..].rsplit_once(':') {
            Some((_, tag)) if !tag.is_empty() => {
                let name_len = reference.len() - tag.len() - 1;
                Self::new(&reference[..name_len], tag)
            }
            _ => Self::new(reference.trim_end_matches(':'), DEFAULT_TAG),
        };

        if image.name.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(image)
    }

    /// Read the image from `var`, falling back to `default`
    ///
    /// An override that does not parse is an error, never a silent fallback.
    pub fn from_env_or(var: &str, default: &str) -> Result<Self, ImageError> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => {
                debug!(var = %var, image = %value, "Using image override from environment");
                Self::parse(value.trim())
            }
            _ => Self::parse(default),
        }
    }

    pub fn to_generic_image(&self) -> GenericImage {
        GenericImage::new(self.name.clone(), self.tag.clone())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}
