//! The daily content record
//!
//! One [`ContentRecord`] exists per publication date. Records are immutable
//! once built: fields are private and only exposed through accessors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of media attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image
    Image,
    /// Embedded video
    Video,
}

impl MediaType {
    /// Parse the provider's media type label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published content item for one calendar date
///
/// Identity is [`ContentRecord::date`]. Build with [`ContentRecord::new`] and
/// the `with_*` methods; there are no setters after construction.
///
/// # Example
///
/// ```rust
/// use apod_core::{ContentRecord, MediaType};
/// use chrono::NaiveDate;
///
/// let record = ContentRecord::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     "T",
///     "E",
///     MediaType::Image,
///     "https://x/y.jpg",
/// )
/// .with_hd_media_url("https://x/y_hd.jpg");
///
/// assert_eq!(record.preferred_media_url(), "https://x/y_hd.jpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    date: NaiveDate,
    title: String,
    explanation: String,
    media_type: MediaType,
    media_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hd_media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attribution: Option<String>,
}

impl ContentRecord {
    /// Create a record with the required fields
    pub fn new(
        date: NaiveDate,
        title: impl Into<String>,
        explanation: impl Into<String>,
        media_type: MediaType,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            date,
            title: title.into(),
            explanation: explanation.into(),
            media_type,
            media_url: media_url.into(),
            hd_media_url: None,
            thumbnail_url: None,
            attribution: None,
        }
    }

    /// Attach a high resolution media url
    pub fn with_hd_media_url(mut self, url: impl Into<String>) -> Self {
        self.hd_media_url = Some(url.into());
        self
    }

    /// Attach a preview image url (videos)
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Attach an attribution / copyright line
    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    pub fn hd_media_url(&self) -> Option<&str> {
        self.hd_media_url.as_deref()
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    /// Best available media url: high resolution when published, else the standard one
    pub fn preferred_media_url(&self) -> &str {
        self.hd_media_url().unwrap_or(&self.media_url)
    }

    /// Still image suitable for a preview
    ///
    /// Videos use their thumbnail when the provider supplied one; otherwise
    /// `None`, since a video url cannot be shown as an image.
    pub fn preview_url(&self) -> Option<&str> {
        match self.media_type {
            MediaType::Image => Some(&self.media_url),
            MediaType::Video => self.thumbnail_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_media_type_labels() {
        assert_eq!(MediaType::from_label("image"), Some(MediaType::Image));
        assert_eq!(MediaType::from_label("Video"), Some(MediaType::Video));
        assert_eq!(MediaType::from_label("other"), None);
        assert_eq!(MediaType::Video.to_string(), "video");
    }

    #[test]
    fn test_preferred_media_url_falls_back() {
        let record = ContentRecord::new(day(2024, 1, 1), "T", "E", MediaType::Image, "u");
        assert_eq!(record.preferred_media_url(), "u");

        let record = record.with_hd_media_url("hd");
        assert_eq!(record.preferred_media_url(), "hd");
    }

    #[test]
    fn test_preview_url_for_video() {
        let video = ContentRecord::new(
            day(2024, 1, 2),
            "T",
            "E",
            MediaType::Video,
            "https://www.youtube.com/embed/abc",
        );
        assert_eq!(video.preview_url(), None);

        let video = video.with_thumbnail_url("https://img.youtube.com/vi/abc/0.jpg");
        assert_eq!(
            video.preview_url(),
            Some("https://img.youtube.com/vi/abc/0.jpg")
        );
    }

    #[test]
    fn test_serde_shape() {
        let record = ContentRecord::new(day(2024, 1, 1), "T", "E", MediaType::Image, "u")
            .with_attribution("Someone");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-01-01");
        assert_eq!(json["media_type"], "image");
        assert_eq!(json["attribution"], "Someone");
        assert!(json.get("hd_media_url").is_none());

        let back: ContentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
