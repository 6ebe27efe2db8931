//! Durable image storage under an upload root.
//!
//! Files land in `<root>/images/` and are published as
//! `/files/images/<name>`. Every upload is streamed into a temporary file in
//! `<root>/.staging/`, synced, and only then renamed onto a free name in the
//! images directory. Staging sits outside the published tree, so a partial or
//! abandoned upload is never addressable.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::classify::{resolve_extension, sniff, ExtensionResolution, SNIFF_LEN};
use crate::error::{BlobError, Result};
use crate::naming::{next_free, sanitize_basename};

/// Default upload ceiling (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 << 20;

/// URL prefix that maps onto the upload root.
pub const FILES_PREFIX: &str = "/files/";

/// Prefix of every reference returned by [`BlobStore::save`].
pub const PUBLIC_PREFIX: &str = "/files/images/";

const IMAGES_DIR: &str = "images";
const STAGING_DIR: &str = ".staging";
const COPY_BUF_LEN: usize = 64 * 1024;

/// An incoming file as received from a client.
pub struct Upload {
    /// Client-supplied file name; only its extension is used
    pub filename: String,
    /// Client-declared MIME type; informational only
    pub content_type: Option<String>,
    /// Client-declared length, checked before any byte is read
    pub declared_size: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, body: impl Read + Send + 'static) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            declared_size: None,
            body: Box::new(body),
        }
    }

    /// Upload of an in-memory buffer, with its declared size set.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self::new(filename, io::Cursor::new(bytes)).with_declared_size(size)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

/// Result of a successful [`BlobStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Public reference, e.g. `/files/images/cat.png`
    pub reference: String,
    /// Location on disk
    pub path: PathBuf,
    /// Sniffed MIME type
    pub content_type: &'static str,
    pub size: u64,
}

/// Image store rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    max_bytes: u64,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Where uploads are written before being renamed into the images directory.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Check that the root exists, is a directory and accepts new files.
    ///
    /// The root itself is never created.
    pub fn verify_root(&self) -> Result<()> {
        let root = &self.root;
        let meta = std::fs::metadata(root).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BlobError::RootUnavailable(format!("{} does not exist", root.display()))
            } else {
                BlobError::RootUnavailable(format!("cannot access {}: {}", root.display(), e))
            }
        })?;
        if !meta.is_dir() {
            return Err(BlobError::RootUnavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        // Removed again when dropped.
        tempfile::Builder::new()
            .prefix(".probe-")
            .tempfile_in(root)
            .map_err(|e| {
                BlobError::RootUnavailable(format!("{} is not writable: {}", root.display(), e))
            })?;
        Ok(())
    }

    /// Store an image upload under a name derived from `logical_name`.
    ///
    /// Blocking; async callers should run it on a blocking worker.
    pub fn save(&self, logical_name: &str, upload: Upload) -> Result<StoredBlob> {
        let Upload {
            filename,
            content_type: declared_type,
            declared_size,
            mut body,
        } = upload;

        if declared_size.is_some_and(|size| size > self.max_bytes) {
            return Err(BlobError::FileTooLarge {
                limit: self.max_bytes,
            });
        }

        let images = self.images_dir();
        let staging = self.staging_dir();
        for dir in [&images, &staging] {
            std::fs::create_dir_all(dir).map_err(|e| BlobError::write(dir, e))?;
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        body.by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(BlobError::Read)?;

        let kind = sniff(&head);
        if !kind.is_image() {
            return Err(BlobError::UnsupportedContentType(kind.mime().to_string()));
        }
        if let Some(declared) = declared_type.as_deref() {
            if declared != kind.mime() {
                debug!(declared, sniffed = kind.mime(), "Declared content type ignored");
            }
        }
        let ext = match resolve_extension(&filename, kind) {
            ExtensionResolution::Known(ext) => ext,
            ExtensionResolution::Unknown => return Err(BlobError::UnknownFileType),
        };
        let base = sanitize_basename(logical_name);

        let mut tmp = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(".tmp")
            .tempfile_in(&staging)
            .map_err(|e| BlobError::write(&staging, e))?;
        let size = self.copy_bounded(&head, &mut body, &mut tmp)?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| BlobError::write(tmp.path(), e))?;

        let (name, path) = claim_name(tmp, &images, &base, &ext)?;

        info!(path = %path.display(), size, content_type = kind.mime(), "Blob stored");
        Ok(StoredBlob {
            reference: format!("{}{}", PUBLIC_PREFIX, name),
            path,
            content_type: kind.mime(),
            size,
        })
    }

    /// Write `head` then the rest of `body` into `tmp`, failing once more than
    /// `max_bytes` have been seen.
    fn copy_bounded(
        &self,
        head: &[u8],
        body: &mut dyn Read,
        tmp: &mut NamedTempFile,
    ) -> Result<u64> {
        let mut written = head.len() as u64;
        if written > self.max_bytes {
            return Err(BlobError::FileTooLarge {
                limit: self.max_bytes,
            });
        }
        tmp.write_all(head)
            .map_err(|e| BlobError::write(tmp.path(), e))?;

        let mut buf = vec![0u8; COPY_BUF_LEN];
        loop {
            let n = match body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(BlobError::Read(e)),
            };
            written += n as u64;
            if written > self.max_bytes {
                return Err(BlobError::FileTooLarge {
                    limit: self.max_bytes,
                });
            }
            tmp.write_all(&buf[..n])
                .map_err(|e| BlobError::write(tmp.path(), e))?;
        }
        tmp.flush().map_err(|e| BlobError::write(tmp.path(), e))?;
        Ok(written)
    }

    /// Map a public reference back to its location under the root.
    pub fn resolve_reference(&self, reference: &str) -> Result<PathBuf> {
        let relative = reference
            .strip_prefix(FILES_PREFIX)
            .ok_or_else(|| BlobError::InvalidReference(reference.to_string()))?;
        let relative = Path::new(relative);
        let escapes = relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.to_string_lossy().contains('\\') {
            return Err(BlobError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Rename `tmp` onto the first free name of the collision sequence.
///
/// Names taken between the probe and the rename are skipped.
fn claim_name(
    mut tmp: NamedTempFile,
    dir: &Path,
    base: &str,
    ext: &str,
) -> Result<(String, PathBuf)> {
    let (mut n, mut name) = next_free(dir, base, ext, 0)?;
    loop {
        let target = dir.join(&name);
        match tmp.persist_noclobber(&target) {
            Ok(_) => return Ok((name, target)),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(name = %name, "Lost race for file name, trying next candidate");
                tmp = err.file;
                (n, name) = next_free(dir, base, ext, n + 1)?;
            }
            Err(err) => return Err(BlobError::write(target, err.error)),
        }
    }
}
