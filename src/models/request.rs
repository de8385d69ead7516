use crate::error::{AdaptError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extensions accepted for uploads. Content is never sniffed.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    TikTok,
    Instagram,
    YouTube,
    RedNote,
    AlbumCover,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::TikTok,
        Platform::Instagram,
        Platform::YouTube,
        Platform::RedNote,
        Platform::AlbumCover,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok (9:16)",
            Platform::Instagram => "Instagram (1:1)",
            Platform::YouTube => "YouTube (16:9)",
            Platform::RedNote => "RedNote (3:4)",
            Platform::AlbumCover => "Album Cover (1:1)",
        }
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        match self {
            Platform::TikTok => AspectRatio::Portrait9x16,
            Platform::Instagram | Platform::AlbumCover => AspectRatio::Square1x1,
            Platform::YouTube => AspectRatio::Landscape16x9,
            Platform::RedNote => AspectRatio::Portrait3x4,
        }
    }

    /// Platforms whose output is 1:1 and therefore accept a target resolution.
    pub fn is_square(&self) -> bool {
        self.aspect_ratio() == AspectRatio::Square1x1
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = AdaptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "instagram" => Ok(Platform::Instagram),
            "youtube" => Ok(Platform::YouTube),
            "rednote" | "xiaohongshu" => Ok(Platform::RedNote),
            "album-cover" | "album_cover" | "album" => Ok(Platform::AlbumCover),
            other => Err(AdaptError::InvalidRequest(format!(
                "Unknown platform '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    Portrait9x16,
    Square1x1,
    Landscape16x9,
    Portrait3x4,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Square1x1 => "1:1",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait3x4 => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Square output sizes offered for 1:1 platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetResolution {
    Standard,
    Hd,
    UltraHd,
    Distribution,
}

impl TargetResolution {
    pub fn pixels(&self) -> u32 {
        match self {
            TargetResolution::Standard => 1400,
            TargetResolution::Hd => 1600,
            TargetResolution::UltraHd => 1800,
            TargetResolution::Distribution => 3000,
        }
    }

    pub fn label(&self) -> String {
        let px = self.pixels();
        match self {
            TargetResolution::Distribution => format!("{}x{} (distribution grade)", px, px),
            _ => format!("{}x{}", px, px),
        }
    }
}

impl fmt::Display for TargetResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for TargetResolution {
    type Err = AdaptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "1400" => Ok(TargetResolution::Standard),
            "hd" | "1600" => Ok(TargetResolution::Hd),
            "uhd" | "ultra-hd" | "1800" => Ok(TargetResolution::UltraHd),
            "distribution" | "distro" | "3000" => Ok(TargetResolution::Distribution),
            other => Err(AdaptError::InvalidRequest(format!(
                "Unknown resolution '{}'",
                other
            ))),
        }
    }
}

/// Uploaded artwork, validated by extension only.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AdaptError::InvalidRequest(format!(
                "Unsupported image type '{}', expected one of {}",
                file_name,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let mime_type = if extension == "png" {
            "image/png"
        } else {
            "image/jpeg"
        };

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AdaptError::InvalidRequest(format!("Invalid path: {}", path.display())))?
            .to_string();

        // Reject the extension before touching the disk.
        Self::new(file_name.clone(), Vec::new())?;

        let bytes = std::fs::read(path).map_err(|e| {
            AdaptError::InvalidRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::new(file_name, bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// One user submission. Consumed once by the pipeline.
#[derive(Debug, Clone)]
pub struct AdaptationRequest {
    pub source_image: SourceImage,
    pub target_platform: Platform,
    target_resolution: Option<TargetResolution>,
    pub freeform_instruction: Option<String>,
}

impl AdaptationRequest {
    pub fn new(source_image: SourceImage, target_platform: Platform) -> Self {
        Self {
            source_image,
            target_platform,
            target_resolution: None,
            freeform_instruction: None,
        }
    }

    pub fn with_resolution(mut self, resolution: TargetResolution) -> Result<Self> {
        if !self.target_platform.is_square() {
            return Err(AdaptError::InvalidRequest(format!(
                "{} does not take a target resolution",
                self.target_platform
            )));
        }
        self.target_resolution = Some(resolution);
        Ok(self)
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.freeform_instruction = Some(instruction.into());
        self
    }

    pub fn target_resolution(&self) -> Option<TargetResolution> {
        self.target_resolution
    }
}
