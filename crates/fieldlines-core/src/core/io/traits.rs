use super::ProjectIoError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Common read/write plumbing for the JSON documents the engine exchanges.
///
/// Implementors only describe their shape through serde; parsing and
/// formatting, as well as the file helpers, are provided.
pub trait JsonDocument: Serialize + DeserializeOwned {
    /// Parses a document from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not a valid
    /// document.
    fn read_from(reader: &mut impl Read) -> Result<Self, ProjectIoError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), ProjectIoError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn from_json_str(json: &str) -> Result<Self, ProjectIoError> {
        Ok(serde_json::from_str(json)?)
    }

    fn to_json_string(&self) -> Result<String, ProjectIoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProjectIoError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a document to a file, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ProjectIoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
