use serde::{Deserialize, Serialize};

/// How a file can be previewed, decided by its declared mime category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
    Video,
    Audio,
    Unsupported,
}

impl PreviewKind {
    pub fn for_mime(mime_type: &str) -> Self {
        let category = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match category.as_str() {
            "image" => PreviewKind::Image,
            "video" => PreviewKind::Video,
            "audio" => PreviewKind::Audio,
            _ => PreviewKind::Unsupported,
        }
    }

    pub fn is_displayable(self) -> bool {
        self != PreviewKind::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_mime() {
        assert_eq!(PreviewKind::for_mime("image/png"), PreviewKind::Image);
        assert_eq!(PreviewKind::for_mime("VIDEO/mp4"), PreviewKind::Video);
        assert_eq!(PreviewKind::for_mime("audio/mpeg"), PreviewKind::Audio);
        assert_eq!(PreviewKind::for_mime("application/pdf"), PreviewKind::Unsupported);
        assert_eq!(PreviewKind::for_mime(""), PreviewKind::Unsupported);
        assert_eq!(PreviewKind::for_mime("image"), PreviewKind::Image);
    }
}
