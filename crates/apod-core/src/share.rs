//! Share payload for a record
//!
//! Builds what an OS share sheet needs from a [`ContentRecord`]. Downloading
//! the media and invoking the share sheet belong to the host application.

use crate::record::ContentRecord;

/// Text and media reference to hand to a share sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    /// Share title
    pub title: String,
    /// Body: title, blank line, explanation
    pub message: String,
    /// Media to download and attach (high resolution when available)
    pub media_url: String,
    /// File name to save the media under
    pub file_name: String,
}

impl SharePayload {
    /// Build the payload for `record`
    pub fn from_record(record: &ContentRecord) -> Self {
        let media_url = record.preferred_media_url().to_string();
        let file_name = file_name_from_url(&media_url)
            .unwrap_or_else(|| format!("{}.jpg", record.date().format("%Y-%m-%d")));

        Self {
            title: record.title().to_string(),
            message: format!("{}\n\n{}", record.title(), record.explanation()),
            media_url,
            file_name,
        }
    }
}

/// Last path segment of `url`, without query string or fragment
fn file_name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    // Host alone is not a file name
    let (_, path) = path.split_once('/')?;
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MediaType;
    use chrono::NaiveDate;

    fn record(url: &str) -> ContentRecord {
        ContentRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "Horsehead",
            "A dark nebula.",
            MediaType::Image,
            url,
        )
    }

    #[test]
    fn test_payload_uses_hd_media() {
        let record = record("https://apod.nasa.gov/apod/image/2401/small.jpg")
            .with_hd_media_url("https://apod.nasa.gov/apod/image/2401/big.jpg");
        let payload = SharePayload::from_record(&record);

        assert_eq!(payload.title, "Horsehead");
        assert_eq!(payload.message, "Horsehead\n\nA dark nebula.");
        assert_eq!(payload.media_url, "https://apod.nasa.gov/apod/image/2401/big.jpg");
        assert_eq!(payload.file_name, "big.jpg");
    }

    #[test]
    fn test_file_name_strips_query() {
        let payload = SharePayload::from_record(&record("https://x/y/pic.png?size=large#top"));
        assert_eq!(payload.file_name, "pic.png");
    }

    #[test]
    fn test_file_name_fallback() {
        assert_eq!(SharePayload::from_record(&record("https://x/dir/")).file_name, "2024-01-01.jpg");
        assert_eq!(SharePayload::from_record(&record("https://x")).file_name, "2024-01-01.jpg");
    }
}
