use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Symptom description too short ({chars} characters, minimum {min})")]
    SymptomsTooShort { chars: usize, min: usize },

    #[error("Symptom description too long ({chars} characters, maximum {max})")]
    SymptomsTooLong { chars: usize, max: usize },

    #[error("Unsupported image type: {0}. Only JPEG/PNG allowed")]
    UnsupportedContentType(String),

    #[error("Image data exceeds {limit_mb}MB limit ({size} bytes)")]
    ImageTooLarge { size: usize, limit_mb: usize },

    #[error("Image dimensions {width}x{height} exceed the {max_pixels} pixel limit")]
    ImageDimensionsTooLarge { width: u32, height: u32, max_pixels: u64 },

    #[error("Invalid image file: {0}")]
    ImageDecode(String),

    #[error("Image resolution too low for reliable analysis ({width}x{height}, minimum {min}x{min})")]
    ImageTooSmall { width: u32, height: u32, min: u32 },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl TriageError {
    /// Whether the caller sent something the engine refuses to process.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_))
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SymptomsTooShort { .. } | Self::SymptomsTooLong { .. } => "INVALID_SYMPTOMS",
            Self::UnsupportedContentType(_) => "UNSUPPORTED_MEDIA",
            Self::ImageTooLarge { .. } | Self::ImageDimensionsTooLarge { .. } => {
                "IMAGE_TOO_LARGE"
            }
            Self::ImageDecode(_) => "IMAGE_DECODE",
            Self::ImageTooSmall { .. } => "IMAGE_TOO_SMALL",
            Self::Database(_) => "INTERNAL",
        }
    }
}
