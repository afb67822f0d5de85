use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions admitted into the catalog, matched case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "mp4", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Kind implied by an allow-listed file name, `None` for anything else
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();

        match extension.as_str() {
            "jpg" | "jpeg" | "png" => Some(MediaKind::Photo),
            "mp4" | "mov" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Extension given to fresh captures of this kind
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

/// A committed media file in the catalog directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub path: PathBuf,
    pub display_name: String,
    pub kind: MediaKind,
}

impl CatalogEntry {
    /// Build an entry for `path`, or `None` if its name is not allow-listed
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let display_name = path.file_name()?.to_str()?.to_string();
        let kind = MediaKind::from_file_name(&display_name)?;

        Some(Self {
            path,
            display_name,
            kind,
        })
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}
