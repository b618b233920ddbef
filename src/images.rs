//! Delivery URL transforms for images kept in hosted object storage.
//!
//! The storage service renders resized/recompressed images when the "raw
//! object fetch" path segment is swapped for the rendering one:
//!
//! `<base>/storage/v1/object/public/<bucket>/<path>` becomes
//! `<base>/storage/v1/render/image/public/<bucket>/<path>?<options>`.
//!
//! Everything else - data URLs, external image hosts, unparseable
//! references - is returned unchanged; no transformation applies and
//! nothing here ever fails. Path segments are percent-decoded and
//! re-encoded so already-encoded references do not get double-encoded.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::models::is_data_url;

/// Characters that must stay escaped inside a rendered-image path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

const OBJECT_PREFIX: [&str; 4] = ["storage", "v1", "object", "public"];
const RENDER_PREFIX: &str = "/storage/v1/render/image/public";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Recompress to WebP.
    Webp,
    /// Keep the stored format.
    Origin,
}

impl ImageFormat {
    fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Origin => "origin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    Cover,
    Contain,
    Fill,
}

impl ResizeMode {
    fn as_str(&self) -> &'static str {
        match self {
            ResizeMode::Cover => "cover",
            ResizeMode::Contain => "contain",
            ResizeMode::Fill => "fill",
        }
    }
}

/// Resize/format/quality hints appended to the rendered URL. Unset fields
/// are omitted from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// 1-100.
    pub quality: Option<u8>,
    pub format: Option<ImageFormat>,
    pub resize: Option<ResizeMode>,
}

impl TransformOptions {
    pub fn with_width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Default::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.quality.is_none()
            && self.format.is_none()
            && self.resize.is_none()
    }
}

/// Widths and qualities for the canonical delivery variants.
const THUMBNAIL_PRESET: (u32, u8) = (200, 60);
const MOBILE_PRESET: (u32, u8) = (400, 75);
const TABLET_PRESET: (u32, u8) = (800, 80);
const DESKTOP_PRESET: (u32, u8) = (1200, 85);

/// Rewrite a stored image reference into a rendered/transformed delivery
/// URL carrying the given hints. References that are embedded-encoded,
/// unparseable, or outside the storage convention come back unchanged.
pub fn transform_url(reference: &str, opts: &TransformOptions) -> String {
    if is_data_url(reference) {
        return reference.to_string();
    }
    let Ok(mut url) = Url::parse(reference) else {
        return reference.to_string();
    };
    let Some(object_segments) = public_object_segments(&url) else {
        return reference.to_string();
    };

    let mut path = String::from(RENDER_PREFIX);
    for segment in &object_segments {
        path.push('/');
        path.push_str(&reencode_segment(segment));
    }
    url.set_path(&path);
    url.set_query(None);

    if !opts.is_empty() {
        let mut pairs = url.query_pairs_mut();
        if let Some(width) = opts.width {
            pairs.append_pair("width", &width.to_string());
        }
        if let Some(height) = opts.height {
            pairs.append_pair("height", &height.to_string());
        }
        if let Some(quality) = opts.quality {
            pairs.append_pair("quality", &quality.to_string());
        }
        if let Some(format) = opts.format {
            pairs.append_pair("format", format.as_str());
        }
        if let Some(resize) = opts.resize {
            pairs.append_pair("resize", resize.as_str());
        }
    }

    url.to_string()
}

/// Whether the reference belongs to the known storage convention and can
/// be rewritten at all.
pub fn is_transformable(reference: &str) -> bool {
    if is_data_url(reference) {
        return false;
    }
    match Url::parse(reference) {
        Ok(url) => public_object_segments(&url).is_some(),
        Err(_) => false,
    }
}

/// The canonical delivery variants for a stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariants {
    pub thumbnail: String,
    pub mobile: String,
    pub tablet: String,
    pub desktop: String,
}

/// One `srcset`-style candidate: a delivery URL and its pixel width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveCandidate {
    pub url: String,
    pub width: u32,
}

/// Fixed-preset variants (thumbnail/mobile/tablet/desktop, WebP), or
/// `None` when the reference is not transformable.
pub fn variants(reference: &str) -> Option<ImageVariants> {
    if !is_transformable(reference) {
        return None;
    }
    let preset = |(width, quality): (u32, u8)| {
        transform_url(
            reference,
            &TransformOptions {
                width: Some(width),
                quality: Some(quality),
                format: Some(ImageFormat::Webp),
                ..Default::default()
            },
        )
    };
    Some(ImageVariants {
        thumbnail: preset(THUMBNAIL_PRESET),
        mobile: preset(MOBILE_PRESET),
        tablet: preset(TABLET_PRESET),
        desktop: preset(DESKTOP_PRESET),
    })
}

/// Responsive candidates for the mobile/tablet/desktop variants, empty
/// when the reference is not transformable.
pub fn responsive_candidates(reference: &str) -> Vec<ResponsiveCandidate> {
    let Some(variants) = variants(reference) else {
        return Vec::new();
    };
    vec![
        ResponsiveCandidate {
            url: variants.mobile,
            width: MOBILE_PRESET.0,
        },
        ResponsiveCandidate {
            url: variants.tablet,
            width: TABLET_PRESET.0,
        },
        ResponsiveCandidate {
            url: variants.desktop,
            width: DESKTOP_PRESET.0,
        },
    ]
}

/// Extract `[bucket, path...]` when the URL's path matches
/// `/storage/v1/object/public/<bucket>/<path>` with a non-empty path.
fn public_object_segments(url: &Url) -> Option<Vec<String>> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.len() < OBJECT_PREFIX.len() + 2 {
        return None;
    }
    if segments[..OBJECT_PREFIX.len()] != OBJECT_PREFIX {
        return None;
    }
    let object = &segments[OBJECT_PREFIX.len()..];
    if object.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(object.iter().map(|s| s.to_string()).collect())
}

/// Decode-then-encode one path segment so already-escaped input is not
/// escaped twice. Segments that do not decode to UTF-8 are re-encoded
/// from their raw form.
fn reencode_segment(segment: &str) -> String {
    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    utf8_percent_encode(&decoded, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORED: &str = "https://x.supabase.co/storage/v1/object/public/b/p.jpg";

    #[test]
    fn test_transform_rewrites_to_render_path_with_options() {
        let opts = TransformOptions {
            width: Some(640),
            format: Some(ImageFormat::Webp),
            ..Default::default()
        };
        assert_eq!(
            transform_url(STORED, &opts),
            "https://x.supabase.co/storage/v1/render/image/public/b/p.jpg?width=640&format=webp"
        );
    }

    #[test]
    fn test_transform_without_options_has_no_query() {
        assert_eq!(
            transform_url(STORED, &TransformOptions::default()),
            "https://x.supabase.co/storage/v1/render/image/public/b/p.jpg"
        );
    }

    #[test]
    fn test_all_options_appear_in_fixed_order() {
        let opts = TransformOptions {
            width: Some(100),
            height: Some(50),
            quality: Some(70),
            format: Some(ImageFormat::Origin),
            resize: Some(ResizeMode::Contain),
        };
        assert_eq!(
            transform_url(STORED, &opts),
            "https://x.supabase.co/storage/v1/render/image/public/b/p.jpg\
             ?width=100&height=50&quality=70&format=origin&resize=contain"
        );
    }

    #[test]
    fn test_foreign_url_returned_unchanged() {
        let foreign = "https://example.com/foo.jpg";
        assert_eq!(
            transform_url(foreign, &TransformOptions::with_width(100)),
            foreign
        );
    }

    #[test]
    fn test_data_url_returned_unchanged() {
        let data = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(transform_url(data, &TransformOptions::with_width(100)), data);
    }

    #[test]
    fn test_malformed_reference_returned_unchanged() {
        for reference in ["", "not a url", "https://x.supabase.co/storage/v1/object/public/"] {
            assert_eq!(
                transform_url(reference, &TransformOptions::with_width(100)),
                reference
            );
        }
    }

    #[test]
    fn test_missing_object_path_returned_unchanged() {
        // Bucket but no object path: cannot split into base + bucket + path
        let bucket_only = "https://x.supabase.co/storage/v1/object/public/b";
        assert_eq!(
            transform_url(bucket_only, &TransformOptions::with_width(100)),
            bucket_only
        );
    }

    #[test]
    fn test_segments_are_percent_encoded_once() {
        let raw = "https://x.supabase.co/storage/v1/object/public/b/my photo.jpg";
        let already_encoded = "https://x.supabase.co/storage/v1/object/public/b/my%20photo.jpg";
        let expected =
            "https://x.supabase.co/storage/v1/render/image/public/b/my%20photo.jpg?width=10";

        assert_eq!(transform_url(raw, &TransformOptions::with_width(10)), expected);
        assert_eq!(
            transform_url(already_encoded, &TransformOptions::with_width(10)),
            expected
        );
    }

    #[test]
    fn test_nested_object_paths_survive() {
        let nested = "https://x.supabase.co/storage/v1/object/public/gallery/2026/easter/a.jpg";
        assert_eq!(
            transform_url(nested, &TransformOptions::default()),
            "https://x.supabase.co/storage/v1/render/image/public/gallery/2026/easter/a.jpg"
        );
    }

    #[test]
    fn test_variants_use_fixed_presets() {
        let variants = variants(STORED).expect("transformable");
        assert!(variants.thumbnail.contains("width=200"));
        assert!(variants.thumbnail.contains("quality=60"));
        assert!(variants.mobile.contains("width=400"));
        assert!(variants.tablet.contains("width=800"));
        assert!(variants.desktop.contains("width=1200"));
        assert!(variants.desktop.contains("format=webp"));
    }

    #[test]
    fn test_variants_absent_for_untransformable_reference() {
        assert!(variants("https://example.com/foo.jpg").is_none());
        assert!(variants("data:image/png;base64,AAAA").is_none());
    }

    #[test]
    fn test_responsive_candidates_cover_mobile_tablet_desktop() {
        let candidates = responsive_candidates(STORED);
        let widths: Vec<u32> = candidates.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![400, 800, 1200]);
        for candidate in &candidates {
            assert!(candidate.url.contains("/render/image/public/"));
        }
    }

    #[test]
    fn test_responsive_candidates_empty_for_untransformable_reference() {
        assert!(responsive_candidates("https://example.com/foo.jpg").is_empty());
    }
}
