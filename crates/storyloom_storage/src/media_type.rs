//! Media type enumeration.

/// Kind of media stored for a story.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum MediaType {
    /// Cover and page illustrations
    #[display("image")]
    Image,
    /// Page narration
    #[display("audio")]
    Audio,
}

impl MediaType {
    /// Infer the media type from a MIME type, defaulting to image.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyloom_storage::MediaType;
    ///
    /// assert_eq!(MediaType::from_mime("audio/mpeg"), MediaType::Audio);
    /// assert_eq!(MediaType::from_mime("image/webp"), MediaType::Image);
    /// ```
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("audio/") {
            MediaType::Audio
        } else {
            MediaType::Image
        }
    }

    /// File extension for a MIME type.
    ///
    /// Unknown types fall back to the media type's usual format.
    pub fn extension_for(mime_type: &str) -> &'static str {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        match essence {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/ogg" => "ogg",
            _ => match Self::from_mime(essence) {
                MediaType::Audio => "mp3",
                MediaType::Image => "png",
            },
        }
    }
}
