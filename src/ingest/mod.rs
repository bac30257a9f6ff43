//! Raw document ingestion: downloading source `.docx` files and extracting
//! their text into the raw-documents folder of object storage.

pub mod docx;
pub mod download;

pub use download::{DocxImporter, Manifest, ManifestEntry};
