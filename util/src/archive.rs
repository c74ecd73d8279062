//! Timestamped CSV archiving
//!
//! An `Archiver` appends serialisable records to a CSV file inside the
//! session's archive directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    ///
    /// Parent directories are created if they do not exist.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, csv::Error> {
        let session_path = session.arch_root.join(path);

        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(session_path)?;

        Ok(Self::from_writer(file))
    }

    /// Create an archiver writing into an already opened file.
    ///
    /// Records may have differing numbers of fields.
    pub fn from_writer(file: File) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        Self { writer }
    }

    /// Serialise a record into the archive and flush it to disk.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), csv::Error> {
        self.writer.serialize(record)?;
        self.writer.flush()?;

        Ok(())
    }
}
