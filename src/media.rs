use std::path::{Path, PathBuf};

use axum::body::Bytes;

use crate::error::AppResult;

pub const MEDIA_URL: &str = "/media/";
const POSTS_PREFIX: &str = "posts";

pub fn media_url(relative: &str) -> String {
    format!("{MEDIA_URL}{relative}")
}

#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    WebP,
    Bmp,
}

impl ImageKind {
    /// Sniffs the format from the leading bytes, then checks that the header
    /// declares a non-empty picture and that the file is not cut short. The
    /// client's content type and file name are not trusted.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let kind = match bytes {
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => ImageKind::Gif,
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => ImageKind::Png,
            [0xFF, 0xD8, 0xFF, ..] => ImageKind::Jpeg,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => ImageKind::WebP,
            [b'B', b'M', ..] => ImageKind::Bmp,
            _ => return None,
        };

        kind.is_complete(bytes).then_some(kind)
    }

    fn is_complete(self, bytes: &[u8]) -> bool {
        match self {
            // logical screen size, then the trailer byte
            ImageKind::Gif => {
                le_u16(bytes, 6).map_or(false, |width| width > 0)
                    && le_u16(bytes, 8).map_or(false, |height| height > 0)
                    && bytes.last() == Some(&0x3B)
            }
            // IHDR must come first and IEND last
            ImageKind::Png => {
                bytes.get(12..16) == Some(&b"IHDR"[..])
                    && be_u32(bytes, 16).map_or(false, |width| width > 0)
                    && be_u32(bytes, 20).map_or(false, |height| height > 0)
                    && bytes.ends_with(b"IEND\xAE\x42\x60\x82")
            }
            ImageKind::Jpeg => bytes.len() > 4 && bytes.ends_with(&[0xFF, 0xD9]),
            // RIFF size counts everything after the first eight bytes
            ImageKind::WebP => {
                le_u32(bytes, 4).map_or(false, |size| size as usize + 8 == bytes.len())
            }
            ImageKind::Bmp => {
                le_u32(bytes, 2).map_or(false, |size| size as usize <= bytes.len())
                    && le_u32(bytes, 18).map_or(false, |width| width != 0)
                    && le_u32(bytes, 22).map_or(false, |height| height != 0)
            }
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageKind::Gif => "gif",
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::WebP => "webp",
            ImageKind::Bmp => "bmp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a post image and returns its path relative to the media root.
    pub async fn save_post_image(&self, upload: &ImageUpload, kind: ImageKind) -> AppResult<String> {
        let dir = self.root.join(POSTS_PREFIX);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!(
            "{}_{}.{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_stem(&upload.file_name),
            kind.extension()
        );
        tokio::fs::write(dir.join(&name), &upload.bytes).await?;

        tracing::debug!("stored {} bytes as {POSTS_PREFIX}/{name}", upload.bytes.len());
        Ok(format!("{POSTS_PREFIX}/{name}"))
    }
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn sanitize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(64)
        .collect();

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
