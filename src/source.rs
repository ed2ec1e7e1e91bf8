//! Telemetry source attachment
//!
//! A client reads from exactly one byte region at a time: either the live
//! shared memory mapping or a file standing in for it (recordings, test
//! captures). File sources are loaded whole; the files are bounded by the
//! region's fixed maximum size and whole-file access keeps record reads
//! O(1).

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Result, SdkError};

#[cfg(windows)]
use crate::windows::MappedRegion;

/// An attached byte region.
#[derive(Debug)]
pub(crate) enum Attachment {
    /// A file mapped in place of the live region.
    File { data: Vec<u8>, path: PathBuf },
    /// The live shared memory view.
    #[cfg(windows)]
    Live(MappedRegion),
}

impl Attachment {
    /// Load `path` as a region substitute.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data =
            std::fs::read(&path).map_err(|e| SdkError::file_error(path.clone(), e))?;
        debug!(path = %path.display(), len = data.len(), "Attached file-backed region");
        Ok(Attachment::File { data, path })
    }

    /// Attach to the live shared memory region.
    #[cfg(windows)]
    pub fn live() -> Result<Self> {
        Ok(Attachment::Live(MappedRegion::open()?))
    }

    /// The attached bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Attachment::File { data, .. } => data,
            #[cfg(windows)]
            Attachment::Live(region) => region.bytes(),
        }
    }

    /// Whether this attachment reads from a file rather than live memory.
    pub fn is_file(&self) -> bool {
        match self {
            Attachment::File { .. } => true,
            #[cfg(windows)]
            Attachment::Live(_) => false,
        }
    }

    /// Copy the raw region bytes to `path`.
    pub fn dump_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.bytes())
            .map_err(|e| SdkError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), "Dumped region bytes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_attachment_reads_whole_region() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1u8, 2, 3, 4, 5]).unwrap();

        let attachment = Attachment::from_file(file.path()).unwrap();
        assert!(attachment.is_file());
        assert_eq!(attachment.bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = Attachment::from_file("/nonexistent/region.bin").unwrap_err();
        match err {
            SdkError::File { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/region.bin"))
            }
            other => panic!("Expected File error, got {:?}", other),
        }
    }

    #[test]
    fn dump_round_trips_the_region() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"region-bytes").unwrap();
        let attachment = Attachment::from_file(file.path()).unwrap();

        let dump = tempfile::NamedTempFile::new().unwrap();
        attachment.dump_to(dump.path()).unwrap();
        assert_eq!(std::fs::read(dump.path()).unwrap(), b"region-bytes");
    }
}
