//! Image CDN URLs.

/// Base URL of the image CDN.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Rendition requested from the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    /// 500px wide, used for cards and posters.
    #[default]
    W500,
    /// Full size, used for backdrops.
    Original,
}

impl ImageSize {
    const fn as_path(self) -> &'static str {
        match self {
            Self::W500 => "w500",
            Self::Original => "original",
        }
    }
}

/// Builds the CDN URL for an upstream image path such as `"/abc.jpg"`.
///
/// Returns `None` for an absent or blank path.
#[must_use]
pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path?.trim();
    if path.is_empty() {
        return None;
    }
    Some(format!(
        "{IMAGE_BASE_URL}{}/{}",
        size.as_path(),
        path.trim_start_matches('/')
    ))
}
