//! Content sniffing and storage extension resolution.
//!
//! Only the first [`SNIFF_LEN`] bytes of an upload are inspected. The sniffed
//! type decides whether an upload is accepted at all; the declared content
//! type sent by the client is never trusted.

/// Number of leading bytes inspected by [`sniff`].
pub const SNIFF_LEN: usize = 512;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
    Icon,
    Pdf,
    Zip,
    Text,
    Binary,
}

impl ContentKind {
    pub fn mime(self) -> &'static str {
        match self {
            ContentKind::Jpeg => "image/jpeg",
            ContentKind::Png => "image/png",
            ContentKind::Webp => "image/webp",
            ContentKind::Gif => "image/gif",
            ContentKind::Bmp => "image/bmp",
            ContentKind::Icon => "image/x-icon",
            ContentKind::Pdf => "application/pdf",
            ContentKind::Zip => "application/zip",
            ContentKind::Text => TEXT_PLAIN,
            ContentKind::Binary => OCTET_STREAM,
        }
    }

    pub fn is_image(self) -> bool {
        self.mime().starts_with("image/")
    }

    /// Extension used when the filename has none. BMP and ICO are images
    /// but have no storage extension.
    pub fn canonical_extension(self) -> Option<&'static str> {
        match self {
            ContentKind::Jpeg => Some(".jpg"),
            ContentKind::Png => Some(".png"),
            ContentKind::Webp => Some(".webp"),
            ContentKind::Gif => Some(".gif"),
            _ => None,
        }
    }
}

/// Detect the content type of an upload from its leading bytes.
pub fn sniff(head: &[u8]) -> ContentKind {
    let head = &head[..head.len().min(SNIFF_LEN)];

    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return ContentKind::Jpeg;
    }
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return ContentKind::Png;
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return ContentKind::Gif;
    }
    // RIFF <4-byte size> WEBPVP
    if head.len() >= 14 && head.starts_with(b"RIFF") && &head[8..14] == b"WEBPVP" {
        return ContentKind::Webp;
    }
    if head.starts_with(b"BM") {
        return ContentKind::Bmp;
    }
    if head.starts_with(&[0x00, 0x00, 0x01, 0x00]) || head.starts_with(&[0x00, 0x00, 0x02, 0x00]) {
        return ContentKind::Icon;
    }
    if head.starts_with(b"%PDF-") {
        return ContentKind::Pdf;
    }
    if head.starts_with(b"PK\x03\x04") {
        return ContentKind::Zip;
    }

    if head.iter().any(|&b| is_binary_byte(b)) {
        ContentKind::Binary
    } else {
        ContentKind::Text
    }
}

// Control bytes that never appear in text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// Outcome of [`resolve_extension`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionResolution {
    /// Extension including its leading dot, e.g. `.png`
    Known(String),
    Unknown,
}

/// Pick the storage extension: the filename's own extension first, then the
/// sniffed type's canonical one.
pub fn resolve_extension(filename: &str, kind: ContentKind) -> ExtensionResolution {
    if let Some(ext) = filename_extension(filename) {
        return ExtensionResolution::Known(ext);
    }
    match kind.canonical_extension() {
        Some(ext) => ExtensionResolution::Known(ext.to_string()),
        None => ExtensionResolution::Unknown,
    }
}

/// Lowercased extension of the final path segment, restricted to `[a-z0-9]`.
fn filename_extension(filename: &str) -> Option<String> {
    let segment = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (_, raw) = segment.rsplit_once('.')?;
    let ext: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    if ext.is_empty() {
        None
    } else {
        Some(format!(".{}", ext))
    }
}
