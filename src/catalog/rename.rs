use super::entry::MediaKind;
use crate::error::{PocketcamError, Result};
use std::path::{Path, PathBuf};

/// Rename command built from user input and validated before it reaches the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub target_path: PathBuf,
    pub proposed_name: String,
}

impl RenameRequest {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(target_path: P, proposed_name: S) -> Self {
        Self {
            target_path: target_path.into(),
            proposed_name: proposed_name.into().trim().to_string(),
        }
    }

    /// Reject names the catalog could not hold, or that would change the media kind
    pub fn validate(&self) -> Result<MediaKind> {
        let new_kind = validate_file_name(&self.proposed_name)?;

        let current_kind = self
            .target_path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(MediaKind::from_file_name)
            .ok_or_else(|| PocketcamError::InvalidName {
                name: self.target_path.display().to_string(),
                reason: "target is not a catalog media file".to_string(),
            })?;

        if current_kind != new_kind {
            return Err(PocketcamError::InvalidName {
                name: self.proposed_name.clone(),
                reason: format!("cannot change a {:?} into a {:?}", current_kind, new_kind),
            });
        }

        Ok(new_kind)
    }

    pub fn destination(&self, catalog_dir: &Path) -> PathBuf {
        catalog_dir.join(&self.proposed_name)
    }
}

/// A flat, allow-listed file name: no separators, no dot segments
pub fn validate_file_name(name: &str) -> Result<MediaKind> {
    let invalid = |reason: &str| PocketcamError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }

    if name.contains(['/', '\\']) {
        return Err(invalid("name cannot contain path separators"));
    }

    if name == "." || name == ".." {
        return Err(invalid("name cannot be a dot segment"));
    }

    MediaKind::from_file_name(name)
        .ok_or_else(|| invalid("extension must be one of jpg, jpeg, png, mp4, mov"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let request = RenameRequest::new("/media/capture_1.jpg", "  beach.jpeg ");
        assert_eq!(request.proposed_name, "beach.jpeg");
        assert_eq!(request.validate().unwrap(), MediaKind::Photo);
        assert_eq!(
            request.destination(Path::new("/media")),
            PathBuf::from("/media/beach.jpeg")
        );
    }

    #[test]
    fn test_rejects_bad_names() {
        for name in ["", "   ", "../escape.jpg", "dir/a.jpg", "noext", "notes.txt"] {
            let request = RenameRequest::new("/media/a.jpg", name);
            assert!(
                matches!(request.validate(), Err(PocketcamError::InvalidName { .. })),
                "expected {:?} to be rejected",
                name
            );
        }
    }

    #[test]
    fn test_rejects_kind_change() {
        let request = RenameRequest::new("/media/a.jpg", "a.mp4");
        assert!(request.validate().is_err());
    }
}
