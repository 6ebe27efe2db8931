use std::collections::HashSet;
use std::sync::Arc;

use lexis_blob::{BlobError, BlobStore, Upload};
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.resize(len, 0xAB);
    bytes
}

fn image_names(tmp: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(tmp.path().join("images"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_round_trip_returns_readable_reference() {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::new(tmp.path());
    let bytes = png_bytes(4096);

    let stored = store
        .save("Knife", Upload::from_bytes("knife.PNG", bytes.clone()).with_content_type("image/png"))
        .unwrap();

    assert_eq!(stored.reference, "/files/images/knife.png");
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(stored.size, 4096);
    let path = store.resolve_reference(&stored.reference).unwrap();
    assert_eq!(path, stored.path);
    assert_eq!(std::fs::read(path).unwrap(), bytes);
}

#[test]
fn test_collision_appends_counter() {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::new(tmp.path());

    let first = store.save("cat", Upload::from_bytes("a.png", png_bytes(64))).unwrap();
    let second = store.save("Cat", Upload::from_bytes("b.png", png_bytes(64))).unwrap();
    let third = store.save("CAT ", Upload::from_bytes("c.png", png_bytes(64))).unwrap();

    assert_eq!(first.reference, "/files/images/cat.png");
    assert_eq!(second.reference, "/files/images/cat-1.png");
    assert_eq!(third.reference, "/files/images/cat-2.png");
}

#[test]
fn test_extension_from_content_when_filename_has_none() {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::new(tmp.path());

    let stored = store
        .save("spoon", Upload::from_bytes("blob", b"GIF89a\x01\x00\x01\x00".to_vec()))
        .unwrap();
    assert_eq!(stored.reference, "/files/images/spoon.gif");
}

#[test]
fn test_size_ceiling_is_inclusive() {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::new(tmp.path()).with_max_bytes(2048);

    // No declared size, so the limit is enforced while streaming.
    let exact = Upload::new("exact.png", std::io::Cursor::new(png_bytes(2048)));
    assert_eq!(store.save("exact", exact).unwrap().size, 2048);

    let over = Upload::new("over.png", std::io::Cursor::new(png_bytes(2049)));
    assert!(matches!(
        store.save("over", over),
        Err(BlobError::FileTooLarge { limit: 2048 })
    ));

    assert_eq!(image_names(&tmp), vec!["exact.png"]);
}

#[test]
fn test_non_images_are_rejected_and_leave_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::new(tmp.path());

    let pdf = Upload::from_bytes("doc.png", b"%PDF-1.4\n...".to_vec()).with_content_type("image/png");
    assert!(matches!(
        store.save("doc", pdf),
        Err(BlobError::UnsupportedContentType(mime)) if mime == "application/pdf"
    ));

    let empty = Upload::from_bytes("empty.png", Vec::new());
    assert!(matches!(
        store.save("empty", empty),
        Err(BlobError::UnsupportedContentType(_))
    ));

    let bmp = Upload::from_bytes("noext", b"BM\x00\x00\x00\x00".to_vec());
    assert!(matches!(store.save("bmp", bmp), Err(BlobError::UnknownFileType)));

    assert!(image_names(&tmp).is_empty());
}

#[test]
fn test_concurrent_saves_get_distinct_names() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(BlobStore::new(tmp.path()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store
                    .save("cat", Upload::from_bytes("cat.png", png_bytes(1024 + i)))
                    .unwrap()
            })
        })
        .collect();

    let references: HashSet<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().reference)
        .collect();
    assert_eq!(references.len(), 8);
    assert_eq!(image_names(&tmp).len(), 8);
}
