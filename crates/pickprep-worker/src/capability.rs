//! Default transcode capability check based on MIME types.

use async_trait::async_trait;
use pickprep_core::{MediaItem, MediaKind, TranscodeCapabilities, TranscodeCapabilityChecker};

/// Requires a transcode when a video's MIME type is known and the requesting
/// application did not declare it as supported.
///
/// Items without a MIME type are passed through untouched.
#[derive(Debug, Default, Clone)]
pub struct MimeTypeCapabilityChecker;

#[async_trait]
impl TranscodeCapabilityChecker for MimeTypeCapabilityChecker {
    async fn is_transcode_required(
        &self,
        capabilities: &TranscodeCapabilities,
        item: &MediaItem,
    ) -> bool {
        if item.kind != MediaKind::Video {
            return false;
        }

        match &item.mime_type {
            Some(mime) => !capabilities
                .supported_video_mime_types
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(mime)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickprep_core::Locality;

    fn video(mime: Option<&str>) -> MediaItem {
        let item = MediaItem::new(
            "v",
            MediaKind::Video,
            Locality::Local,
            "content://media/picker/0/local/media/v".parse().unwrap(),
        );
        match mime {
            Some(mime) => item.with_mime_type(mime),
            None => item,
        }
    }

    fn caps(types: &[&str]) -> TranscodeCapabilities {
        TranscodeCapabilities {
            supported_video_mime_types: types.iter().map(|t| t.to_string()).collect(),
            supported_hdr_types: vec![],
        }
    }

    #[tokio::test]
    async fn test_unsupported_video_requires_transcode() {
        let checker = MimeTypeCapabilityChecker;
        assert!(
            checker
                .is_transcode_required(&caps(&["video/avc"]), &video(Some("video/hevc")))
                .await
        );
    }

    #[tokio::test]
    async fn test_supported_video_passes_through() {
        let checker = MimeTypeCapabilityChecker;
        assert!(
            !checker
                .is_transcode_required(&caps(&["video/hevc"]), &video(Some("VIDEO/HEVC")))
                .await
        );
    }

    #[tokio::test]
    async fn test_unknown_mime_and_images_pass_through() {
        let checker = MimeTypeCapabilityChecker;
        assert!(!checker.is_transcode_required(&caps(&[]), &video(None)).await);

        let image = MediaItem::new(
            "i",
            MediaKind::Image,
            Locality::Local,
            "content://media/picker/0/local/media/i".parse().unwrap(),
        )
        .with_mime_type("image/heic");
        assert!(!checker.is_transcode_required(&caps(&[]), &image).await);
    }
}
