//! Image ingestion for Lexis vocab entries.
//!
//! Classifies uploads by their leading bytes, picks a storage extension and a
//! collision-free file name, and writes the bytes durably under the upload
//! root.

pub mod classify;
mod error;
pub mod naming;
mod store;

pub use classify::{ContentKind, ExtensionResolution};
pub use error::{BlobError, Result};
pub use store::{BlobStore, StoredBlob, Upload, FILES_PREFIX, MAX_UPLOAD_BYTES, PUBLIC_PREFIX};
