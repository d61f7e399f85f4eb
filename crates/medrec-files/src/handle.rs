//! File handles supplied by a file picker.

use crate::constants::UNKNOWN_FILENAME;
use std::path::{Path, PathBuf};

/// A file offered for attachment.
///
/// The core never opens the file itself. It only needs a display name and enough location
/// information for a reference to be dereferenced later.
pub trait FileHandle {
    /// File name as shown to the user.
    fn name(&self) -> &str;

    /// Local path the bytes can be read from.
    fn path(&self) -> &Path;
}

/// A file on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    path: PathBuf,
}

impl LocalFile {
    /// Wraps `path`, taking the name from its final component.
    ///
    /// The path is not checked for existence; pickers may pre-filter, the core does not.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_FILENAME)
            .to_string();
        Self { name, path }
    }
}

impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_takes_name_from_path() {
        let file = LocalFile::new("/scans/2024/knee MRI.jpeg");

        assert_eq!(file.name(), "knee MRI.jpeg");
        assert_eq!(file.path(), Path::new("/scans/2024/knee MRI.jpeg"));
    }

    #[test]
    fn test_local_file_without_file_name_is_unknown() {
        let file = LocalFile::new("/");
        assert_eq!(file.name(), "unknown");
    }
}
