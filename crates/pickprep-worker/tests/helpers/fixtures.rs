//! Media item fixtures.

use pickprep_core::{Locality, Locator, MediaItem, MediaKind};

pub fn locator(id: &str) -> Locator {
    format!("content://media/picker/0/cloud/media/{}", id)
        .parse()
        .expect("valid fixture locator")
}

pub fn local_image(id: &str) -> MediaItem {
    MediaItem::new(id, MediaKind::Image, Locality::Local, locator(id)).with_mime_type("image/jpeg")
}

pub fn remote_image(id: &str) -> MediaItem {
    MediaItem::new(id, MediaKind::Image, Locality::Remote, locator(id)).with_mime_type("image/jpeg")
}

pub fn local_video(id: &str) -> MediaItem {
    MediaItem::new(id, MediaKind::Video, Locality::Local, locator(id)).with_mime_type("video/hevc")
}

pub fn remote_video(id: &str) -> MediaItem {
    MediaItem::new(id, MediaKind::Video, Locality::Remote, locator(id)).with_mime_type("video/hevc")
}

/// `count` items alternating local and remote images.
pub fn mixed_images(count: usize) -> Vec<MediaItem> {
    (0..count)
        .map(|i| {
            let id = i.to_string();
            if i % 2 == 0 {
                local_image(&id)
            } else {
                remote_image(&id)
            }
        })
        .collect()
}

/// Local video whose locator has no picker_transcoded counterpart.
pub fn local_video_short_locator(id: &str) -> MediaItem {
    let locator: Locator = format!("content://media/picker/{}", id)
        .parse()
        .expect("valid fixture locator");
    MediaItem::new(id, MediaKind::Video, Locality::Local, locator).with_mime_type("video/hevc")
}
