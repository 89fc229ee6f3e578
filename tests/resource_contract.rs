//! Behavior contract of the resource abstraction

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Read;

use wireup::{FileResource, InMemoryResource, Resource, ResourceError};

fn hash_of(resource: &dyn Resource) -> u64 {
    let mut hasher = DefaultHasher::new();
    resource.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_existing_resource_is_openable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, b"payload").unwrap();

    let resource = FileResource::new(&path);
    assert!(resource.exists());
    // exists() implies the stream can be opened at least once
    let mut buf = Vec::new();
    resource.open().unwrap().read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"payload");
}

#[test]
fn test_content_length_matches_full_stream_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    // larger than one 256-byte probe chunk
    fs::write(&path, vec![0xABu8; 777]).unwrap();

    let resource = FileResource::new(&path);
    let mut buf = Vec::new();
    resource.open().unwrap().read_to_end(&mut buf).unwrap();
    assert_eq!(resource.content_length().unwrap(), buf.len() as u64);
}

#[test]
fn test_equal_descriptions_mean_equal_resources() {
    let a = FileResource::new("/conf/app.xml");
    let b = FileResource::new("/conf/app.xml");
    let other = FileResource::new("/conf/other.xml");

    let (a, b, other): (&dyn Resource, &dyn Resource, &dyn Resource) = (&a, &b, &other);
    assert!(a == b);
    assert!(a != other);
    assert_eq!(hash_of(a), hash_of(b));
}

#[test]
fn test_equality_crosses_resource_kinds() {
    // kinds do not matter, only descriptions do
    let file = FileResource::new("/conf/app.xml");
    let fake = InMemoryResource::new("x", "file [/conf/app.xml]");
    let (file, fake): (&dyn Resource, &dyn Resource) = (&file, &fake);
    assert!(file == fake);
    assert_eq!(hash_of(file), hash_of(fake));
}

#[test]
fn test_display_uses_description() {
    let resource = FileResource::new("/conf/app.xml");
    let resource: &dyn Resource = &resource;
    assert_eq!(resource.to_string(), "file [/conf/app.xml]");
}

#[test]
fn test_last_modified_of_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, b"x").unwrap();

    let resource = FileResource::new(&path);
    let modified = resource.last_modified().unwrap();
    assert!(modified <= std::time::SystemTime::now());
}

#[test]
fn test_last_modified_of_missing_file_is_unresolvable() {
    let resource = FileResource::new("/definitely/not/here.bin");
    assert!(matches!(
        resource.last_modified(),
        Err(ResourceError::Unresolvable { .. })
    ));
}

#[test]
fn test_relative_derivation_reaches_sibling_content() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("base.xml"), b"base").unwrap();
    fs::write(dir.path().join("sibling.xml"), b"sibling").unwrap();

    let base = FileResource::new(dir.path().join("base.xml"));
    let sibling = base.create_relative("sibling.xml").unwrap();
    assert!(sibling.exists());
    let mut buf = String::new();
    sibling.open().unwrap().read_to_string(&mut buf).unwrap();
    assert_eq!(buf, "sibling");
}

#[test]
fn test_in_memory_resource_has_no_derivation() {
    let resource = InMemoryResource::new("content", "inline document");
    assert!(matches!(
        resource.create_relative("sibling.xml"),
        Err(ResourceError::Unresolvable { .. })
    ));
    assert!(matches!(
        resource.url(),
        Err(ResourceError::Unresolvable { .. })
    ));
}

#[test]
fn test_file_url_round_trips_through_loader() {
    use wireup::ResourceLoader;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.xml");
    fs::write(&path, b"<components/>").unwrap();

    let resource = FileResource::new(&path);
    let url = resource.url().unwrap();
    assert_eq!(url.scheme(), "file");

    let loader = wireup::FileSystemResourceLoader::new();
    let reloaded = loader.get_resource(url.as_str()).unwrap();
    assert!(reloaded.exists());
    assert_eq!(reloaded.description(), resource.description());
}

#[test]
fn test_readability_tracks_existence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, b"x").unwrap();

    let there = FileResource::new(&path);
    let gone = FileResource::new(dir.path().join("gone.bin"));
    assert!(there.is_readable());
    assert!(!gone.is_readable());
}
