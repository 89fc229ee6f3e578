//! Filesystem-backed resources

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use url::Url;

use super::{Resource, ResourceError};

/// A resource backed by a filesystem path
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for FileResource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn description(&self) -> String {
        format!("file [{}]", self.path.display())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_file(&self) -> bool {
        true
    }

    fn url(&self) -> Result<Url, ResourceError> {
        let absolute = std::path::absolute(&self.path).map_err(ResourceError::Io)?;
        Url::from_file_path(&absolute).map_err(|()| ResourceError::InvalidUrl {
            description: self.description(),
            message: format!("path [{}] does not form a file URL", absolute.display()),
        })
    }

    fn to_path(&self) -> Result<PathBuf, ResourceError> {
        Ok(self.path.clone())
    }

    fn content_length(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    fn last_modified(&self) -> Result<SystemTime, ResourceError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.modified()?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ResourceError::Unresolvable {
                    description: self.description(),
                    wanted: "a file with a modification timestamp",
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn create_relative(&self, relative_path: &str) -> Result<Box<dyn Resource>, ResourceError> {
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Box::new(FileResource::new(base.join(relative_path))))
    }

    fn filename(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}
