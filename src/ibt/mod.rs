//! Recorded-session telemetry files
//!
//! A recording starts with the same header and variable-descriptor table
//! as the live region, adds a sub-header with session timing metadata at
//! byte 112, and then carries `session_record_count` contiguous records
//! of `buf_len` bytes each starting at the first rotating buffer's
//! offset. There is no event, no broadcast channel, and no session-info
//! refresh logic; the file never changes under the reader.

mod reader;

pub use reader::{DiskInfo, IbtReader};
