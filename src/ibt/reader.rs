//! Random-access reader over recorded telemetry files

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::layout::{DiskSubHeader, Header};
use crate::session::decode_section_text;
use crate::types::{Catalog, Value};
use crate::{Result, SdkError, binary};

/// Session metadata from the recording's disk sub-header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskInfo {
    /// Session start date as a unix timestamp.
    pub session_start_date: u64,
    /// Session time at the first record, in seconds.
    pub session_start_time: f64,
    /// Session time at the last record, in seconds.
    pub session_end_time: f64,
    /// Laps completed over the recording.
    pub session_lap_count: i32,
    /// Number of telemetry records in the file.
    pub session_record_count: i32,
}

/// Reader for a recorded telemetry session file.
///
/// The file is loaded whole at open time; record reads are then O(1)
/// offset arithmetic over the in-memory bytes.
pub struct IbtReader {
    data: Vec<u8>,
    path: PathBuf,
    catalog: Catalog,
    buf_len: usize,
    records_offset: usize,
    record_count: usize,
    tick_rate: i32,
    first_buffer_tick: i32,
    session_info_offset: usize,
    session_info_len: usize,
    disk: DiskInfo,
}

impl IbtReader {
    /// Open a recording file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|e| SdkError::file_error(path.clone(), e))?;
        Self::from_bytes_with_path(data, path)
    }

    /// Read a recording from bytes (used by tests).
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_path(data, PathBuf::from("<memory>"))
    }

    fn from_bytes_with_path(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        let header = Header::new(&data)?;
        if header.version() < 1 {
            return Err(SdkError::parse_error(
                "Recording header validation",
                format!("Unsupported protocol version: {}", header.version()),
            ));
        }
        if header.buf_len() < 0 || header.num_buf() < 1 {
            return Err(SdkError::parse_error(
                "Recording header validation",
                format!(
                    "Implausible buffer layout: num_buf={}, buf_len={}",
                    header.num_buf(),
                    header.buf_len()
                ),
            ));
        }

        let disk_view = DiskSubHeader::new(&data)?;
        let disk = DiskInfo {
            session_start_date: disk_view.session_start_date()?,
            session_start_time: disk_view.session_start_time()?,
            session_end_time: disk_view.session_end_time()?,
            session_lap_count: disk_view.session_lap_count()?,
            session_record_count: disk_view.session_record_count()?,
        };

        let catalog = Catalog::build(&data, &header)?;
        let buf_len = usize::try_from(header.buf_len().max(0)).unwrap_or(0);
        catalog.validate(buf_len)?;

        let first_buf = header.var_buf(0)?;
        let records_offset = usize::try_from(first_buf.buf_offset.max(0)).unwrap_or(0);
        let record_count = usize::try_from(disk.session_record_count.max(0)).unwrap_or(0);

        // Cross-check the declared record count against the file size.
        if buf_len > 0 {
            let available = data.len().saturating_sub(records_offset) / buf_len;
            if available < record_count {
                warn!(
                    declared = record_count,
                    available,
                    "Recording declares more records than the file holds"
                );
            }
        }

        debug!(
            path = %path.display(),
            vars = catalog.len(),
            records = record_count,
            buf_len,
            "Opened telemetry recording"
        );

        Ok(Self {
            records_offset,
            record_count,
            buf_len,
            tick_rate: header.tick_rate(),
            first_buffer_tick: first_buf.tick_count,
            session_info_offset: usize::try_from(header.session_info_offset().max(0)).unwrap_or(0),
            session_info_len: usize::try_from(header.session_info_len().max(0)).unwrap_or(0),
            catalog,
            data,
            path,
            disk,
        })
    }

    /// Explicitly release the recording. Equivalent to dropping the reader.
    pub fn close(self) {}

    /// One variable from one record.
    pub fn get(&self, index: usize, name: &str) -> Result<Value> {
        if index >= self.record_count {
            return Err(SdkError::OutOfBounds { index, record_count: self.record_count });
        }
        let var = self
            .catalog
            .get(name)
            .ok_or_else(|| SdkError::unknown_variable(name))?;
        let base = self.records_offset + index * self.buf_len + var.offset;
        binary::read_values(&self.data, base, var.var_type, var.count)
    }

    /// One variable across every record, in record order.
    pub fn get_all(&self, name: &str) -> Result<Vec<Value>> {
        let var = self
            .catalog
            .get(name)
            .ok_or_else(|| SdkError::unknown_variable(name))?;
        let mut values = Vec::with_capacity(self.record_count);
        for index in 0..self.record_count {
            let base = self.records_offset + index * self.buf_len + var.offset;
            values.push(binary::read_values(&self.data, base, var.var_type, var.count)?);
        }
        Ok(values)
    }

    /// One variable from the final record of the session.
    pub fn latest(&self, name: &str) -> Result<Value> {
        if self.record_count == 0 {
            return Err(SdkError::OutOfBounds { index: 0, record_count: 0 });
        }
        self.get(self.record_count - 1, name)
    }

    /// The variable catalog declared by the recording.
    pub fn variables(&self) -> &Catalog {
        &self.catalog
    }

    /// Variable names in descriptor-table order.
    pub fn var_names(&self) -> Vec<String> {
        self.catalog.names().map(str::to_string).collect()
    }

    /// Number of telemetry records.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Recording frequency in ticks per second.
    pub fn tick_rate(&self) -> i32 {
        self.tick_rate
    }

    /// Tick count stored in the first buffer descriptor.
    pub fn first_buffer_tick(&self) -> i32 {
        self.first_buffer_tick
    }

    /// Path the recording was opened from.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Session timing metadata.
    pub fn disk_info(&self) -> &DiskInfo {
        &self.disk
    }

    /// The decoded session document embedded in the recording, if any.
    pub fn session_yaml(&self) -> Option<String> {
        if self.session_info_len == 0 {
            return None;
        }
        let window = self
            .data
            .get(self.session_info_offset..self.session_info_offset + self.session_info_len)?;
        let text = decode_section_text(window);
        if text.trim().is_empty() { None } else { Some(text) }
    }
}
