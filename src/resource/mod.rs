//! Resource abstraction for byte-bearing configuration artifacts
//!
//! A [`Resource`] is a handle to something a document can be read from: a
//! file, an in-memory buffer, or any caller-supplied kind. Concrete kinds
//! implement only [`Resource::open`] and [`Resource::description`]; probing,
//! length and timestamp checks fall back to shared defaults.

use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::SystemTime;

use thiserror::Error;
use url::Url;

mod file;
mod loader;
mod memory;

pub use file::FileResource;
pub use loader::{
    apply_relative_path, is_absolute_location, FileSystemResourceLoader, ResourceLoader,
};
pub use memory::InMemoryResource;

/// Errors raised by resource operations
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource has no representation in the requested form. Callers
    /// routinely probe for this and fall back, so it is a value, not a panic.
    #[error("{description} cannot be resolved to {wanted}")]
    Unresolvable {
        description: String,
        wanted: &'static str,
    },

    /// A URL form should exist but the underlying location is not expressible
    /// as a valid URL
    #[error("invalid URL for {description}: {message}")]
    InvalidUrl {
        description: String,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Handle to an external byte-bearing artifact
pub trait Resource: fmt::Debug {
    /// Open a fresh stream over the resource content
    fn open(&self) -> io::Result<Box<dyn Read>>;

    /// Human-readable description; also the identity used for equality
    fn description(&self) -> String;

    /// Whether the resource currently exists. Tries a filesystem probe first
    /// and falls back to opening the stream; never errors.
    fn exists(&self) -> bool {
        match self.to_path() {
            Ok(path) => path.exists(),
            Err(_) => self.open().is_ok(),
        }
    }

    fn is_readable(&self) -> bool {
        self.exists()
    }

    /// Whether the resource represents an already-open stream
    fn is_open(&self) -> bool {
        false
    }

    fn is_file(&self) -> bool {
        false
    }

    /// URL form of this resource, when one exists
    fn url(&self) -> Result<Url, ResourceError> {
        Err(ResourceError::Unresolvable {
            description: self.description(),
            wanted: "a URL",
        })
    }

    /// Filesystem path form of this resource, when one exists
    fn to_path(&self) -> Result<PathBuf, ResourceError> {
        Err(ResourceError::Unresolvable {
            description: self.description(),
            wanted: "an absolute file path",
        })
    }

    /// Content length in bytes, by draining a fresh stream in fixed-size
    /// chunks. Kinds that know their length cheaply should override this.
    fn content_length(&self) -> io::Result<u64> {
        let mut stream = self.open()?;
        let mut buf = [0u8; 256];
        let mut size: u64 = 0;
        loop {
            let read = stream.read(&mut buf)?;
            if read == 0 {
                break;
            }
            size += read as u64;
        }
        Ok(size)
    }

    /// Modification timestamp of the underlying path. A path that does not
    /// exist is reported as unresolvable rather than as a raw read failure.
    fn last_modified(&self) -> Result<SystemTime, ResourceError> {
        let path = self.to_path()?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.modified()?),
            Err(_) if !path.exists() => Err(ResourceError::Unresolvable {
                description: self.description(),
                wanted: "a file with a modification timestamp",
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Derive a sibling resource from a relative path. Kinds without a
    /// location hierarchy cannot support this.
    fn create_relative(&self, _relative_path: &str) -> Result<Box<dyn Resource>, ResourceError> {
        Err(ResourceError::Unresolvable {
            description: self.description(),
            wanted: "a relative resource",
        })
    }

    /// Bare filename of the resource, when one exists
    fn filename(&self) -> Option<String> {
        None
    }
}

// Identity of a resource is its description string, regardless of kind.
impl PartialEq for dyn Resource + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.description() == other.description()
    }
}

impl Eq for dyn Resource + '_ {}

impl Hash for dyn Resource + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.description().hash(state);
    }
}

impl fmt::Display for dyn Resource + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
