//! In-memory resources

use std::io::{self, Cursor, Read};

use super::Resource;

/// A resource holding its content in memory. Always exists; has no location,
/// so URL, path and relative derivation stay unresolvable.
#[derive(Debug, Clone)]
pub struct InMemoryResource {
    content: Vec<u8>,
    description: String,
}

impl InMemoryResource {
    pub fn new(content: impl Into<Vec<u8>>, description: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            description: description.into(),
        }
    }
}

impl Resource for InMemoryResource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(self.content.clone())))
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn exists(&self) -> bool {
        true
    }

    fn content_length(&self) -> io::Result<u64> {
        Ok(self.content.len() as u64)
    }
}
