//! Resolution of location strings to resources

use std::path::PathBuf;

use url::Url;

use super::{FileResource, Resource, ResourceError};

/// Maps location strings (paths or URLs) to resource handles
pub trait ResourceLoader {
    fn get_resource(&self, location: &str) -> Result<Box<dyn Resource>, ResourceError>;
}

/// Default loader: `file:` URLs and plain filesystem paths, the latter
/// optionally resolved against a base directory
#[derive(Debug, Clone, Default)]
pub struct FileSystemResourceLoader {
    base_dir: Option<PathBuf>,
}

impl FileSystemResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn get_resource(&self, location: &str) -> Result<Box<dyn Resource>, ResourceError> {
        if let Ok(url) = Url::parse(location) {
            if url.scheme() == "file" {
                let path = url.to_file_path().map_err(|()| ResourceError::InvalidUrl {
                    description: format!("location [{}]", location),
                    message: "file URL does not name a local path".to_string(),
                })?;
                return Ok(Box::new(FileResource::new(path)));
            }
            return Err(ResourceError::Unresolvable {
                description: format!("location [{}]", location),
                wanted: "a supported URL scheme",
            });
        }
        let path = match &self.base_dir {
            Some(base) => base.join(location),
            None => PathBuf::from(location),
        };
        Ok(Box::new(FileResource::new(path)))
    }
}

/// A location is absolute when it carries a URL scheme. Locations that fail
/// URL syntax are treated as relative, not as errors.
pub fn is_absolute_location(location: &str) -> bool {
    Url::parse(location).is_ok()
}

/// Apply a relative path against a base location string, replacing everything
/// after the base's final `/` segment
pub fn apply_relative_path(base: &str, relative: &str) -> String {
    match base.rfind('/') {
        Some(idx) => {
            let mut result = base[..=idx].to_string();
            result.push_str(relative.strip_prefix('/').unwrap_or(relative));
            result
        }
        None => relative.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_is_a_file_resource() {
        let loader = FileSystemResourceLoader::new();
        let r = loader.get_resource("conf/app.xml").unwrap();
        assert_eq!(r.description(), "file [conf/app.xml]");
    }

    #[test]
    fn test_base_dir_applies_to_plain_paths() {
        let loader = FileSystemResourceLoader::with_base_dir("/etc/wireup");
        let r = loader.get_resource("app.xml").unwrap();
        assert_eq!(r.description(), "file [/etc/wireup/app.xml]");
    }

    #[test]
    fn test_file_url_resolves_to_path() {
        let loader = FileSystemResourceLoader::new();
        let r = loader.get_resource("file:///conf/app.xml").unwrap();
        assert_eq!(r.description(), "file [/conf/app.xml]");
    }

    #[test]
    fn test_unsupported_scheme_is_unresolvable() {
        let loader = FileSystemResourceLoader::new();
        let result = loader.get_resource("classpath:missing.xml");
        assert!(matches!(result, Err(ResourceError::Unresolvable { .. })));
    }

    #[test]
    fn test_absolute_location_classification() {
        assert!(is_absolute_location("file:///conf/app.xml"));
        assert!(is_absolute_location("https://example.com/app.xml"));
        assert!(is_absolute_location("classpath:app.xml"));
        assert!(!is_absolute_location("app.xml"));
        assert!(!is_absolute_location("../shared/app.xml"));
        assert!(!is_absolute_location("/etc/wireup/app.xml"));
    }

    #[test]
    fn test_apply_relative_path() {
        assert_eq!(
            apply_relative_path("file:///conf/app.xml", "extra.xml"),
            "file:///conf/extra.xml"
        );
        assert_eq!(
            apply_relative_path("file:///conf/app.xml", "modules/db.xml"),
            "file:///conf/modules/db.xml"
        );
        assert_eq!(apply_relative_path("app.xml", "extra.xml"), "extra.xml");
    }
}
