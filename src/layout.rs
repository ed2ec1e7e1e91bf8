//! Shared-memory layout descriptors
//!
//! The simulator publishes a self-describing region:
//!
//! ```c
//! struct irsdk_header
//! {
//!     int ver;                 // offset 0,  protocol version (>= 1)
//!     int status;              // offset 4,  bit 0 set while connected
//!     int tickRate;            // offset 8,  nominal ticks per second
//!     int sessionInfoUpdate;   // offset 12, bumped on metadata change
//!     int sessionInfoLen;      // offset 16
//!     int sessionInfoOffset;   // offset 20
//!     int numVars;             // offset 24
//!     int varHeaderOffset;     // offset 28
//!     int numBuf;              // offset 32
//!     int bufLen;              // offset 36
//!     int pad1[2];             // offset 40
//!     irsdk_varBuf varBuf[];   // offset 48, numBuf entries of 16 bytes
//! };
//! ```
//!
//! Each variable descriptor is a 144-byte record (type/offset/count plus
//! NUL-padded name, description, and unit strings), and recorded session
//! files carry an extra sub-header at byte 112.
//!
//! The types here are *views*: they hold a reference to the region plus a
//! base offset, and every field is a computed little-endian read. Nothing
//! is copied at attach time, and a view stays in sync if the region's
//! bytes are legitimately re-read after a rebind.

use crate::binary::{parse_f64_le, parse_i32_le, parse_u64_le, parse_u8};
use crate::{Result, SdkError, binary};

/// Minimum region length for a header view (fixed fields plus padding).
pub const HEADER_FIXED_LEN: usize = 48;
/// Size of one rotating-buffer descriptor entry.
pub const VAR_BUF_ENTRY_SIZE: usize = 16;
/// Byte offset of the first rotating-buffer descriptor.
pub const VAR_BUF_TABLE_OFFSET: usize = 48;
/// Size of one variable descriptor record.
pub const VAR_HEADER_SIZE: usize = 144;
/// Fixed-width name and unit field size inside a variable descriptor.
pub const VAR_STRING_LEN: usize = 32;
/// Fixed-width description field size inside a variable descriptor.
pub const VAR_DESC_LEN: usize = 64;
/// Byte offset of the disk sub-header in recorded session files.
pub const DISK_SUB_HEADER_OFFSET: usize = 112;
/// Size of the disk sub-header.
pub const DISK_SUB_HEADER_SIZE: usize = 32;

/// Header status bit: the simulator is actively publishing telemetry.
pub const STATUS_CONNECTED: i32 = 0x1;

/// View of the region header at offset 0.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    region: &'a [u8],
}

impl<'a> Header<'a> {
    /// Overlay a header view on `region`.
    ///
    /// Only the fixed fields are range-checked here; the rotating-buffer
    /// table is validated per access since its length depends on `num_buf`.
    pub fn new(region: &'a [u8]) -> Result<Self> {
        if region.len() < HEADER_FIXED_LEN {
            return Err(SdkError::Memory { offset: region.len() });
        }
        Ok(Self { region })
    }

    pub fn version(&self) -> i32 {
        self.read_field(0)
    }

    pub fn status(&self) -> i32 {
        self.read_field(4)
    }

    pub fn tick_rate(&self) -> i32 {
        self.read_field(8)
    }

    pub fn session_info_update(&self) -> i32 {
        self.read_field(12)
    }

    pub fn session_info_len(&self) -> i32 {
        self.read_field(16)
    }

    pub fn session_info_offset(&self) -> i32 {
        self.read_field(20)
    }

    pub fn num_vars(&self) -> i32 {
        self.read_field(24)
    }

    pub fn var_header_offset(&self) -> i32 {
        self.read_field(28)
    }

    pub fn num_buf(&self) -> i32 {
        self.read_field(32)
    }

    pub fn buf_len(&self) -> i32 {
        self.read_field(36)
    }

    /// Returns true while the simulator reports the region as live.
    pub fn is_connected(&self) -> bool {
        self.status() & STATUS_CONNECTED != 0
    }

    /// Rotating-buffer descriptor for `slot`.
    pub fn var_buf(&self, slot: usize) -> Result<VarBufDesc> {
        let base = VAR_BUF_TABLE_OFFSET + slot * VAR_BUF_ENTRY_SIZE;
        Ok(VarBufDesc {
            slot,
            tick_count: parse_i32_le(self.region, base)?,
            buf_offset: parse_i32_le(self.region, base + 4)?,
        })
    }

    /// All `num_buf` rotating-buffer descriptors, in slot order.
    pub fn var_bufs(&self) -> Result<Vec<VarBufDesc>> {
        let num_buf = usize::try_from(self.num_buf().max(0)).unwrap_or(0);
        (0..num_buf).map(|slot| self.var_buf(slot)).collect()
    }

    fn read_field(&self, offset: usize) -> i32 {
        // Header::new guarantees the fixed fields are in range.
        i32::from_le_bytes([
            self.region[offset],
            self.region[offset + 1],
            self.region[offset + 2],
            self.region[offset + 3],
        ])
    }
}

/// One rotating telemetry buffer: which tick it holds and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarBufDesc {
    /// Slot index in the descriptor table.
    pub slot: usize,
    /// Tick count last written into this buffer.
    pub tick_count: i32,
    /// Byte offset of the buffer from the start of the region.
    pub buf_offset: i32,
}

/// View of one 144-byte variable descriptor record.
#[derive(Debug, Clone, Copy)]
pub struct VarHeaderView<'a> {
    region: &'a [u8],
    base: usize,
}

impl<'a> VarHeaderView<'a> {
    /// Overlay a descriptor view at `base`.
    pub fn new(region: &'a [u8], base: usize) -> Result<Self> {
        if base + VAR_HEADER_SIZE > region.len() {
            return Err(SdkError::Memory { offset: base });
        }
        Ok(Self { region, base })
    }

    /// Raw wire type code (see [`crate::VarType::from_code`]).
    pub fn type_code(&self) -> Result<i32> {
        parse_i32_le(self.region, self.base)
    }

    /// Byte offset of the variable inside any telemetry buffer.
    pub fn offset(&self) -> Result<i32> {
        parse_i32_le(self.region, self.base + 4)
    }

    /// Element count; 1 for scalars.
    pub fn count(&self) -> Result<i32> {
        parse_i32_le(self.region, self.base + 8)
    }

    /// Advisory flag: the element count represents a time series.
    pub fn count_as_time(&self) -> Result<bool> {
        Ok(parse_u8(self.region, self.base + 12)? != 0)
    }

    pub fn name(&self) -> Result<String> {
        binary::read_fixed_string(self.region, self.base + 16, VAR_STRING_LEN)
    }

    pub fn desc(&self) -> Result<String> {
        binary::read_fixed_string(self.region, self.base + 48, VAR_DESC_LEN)
    }

    pub fn unit(&self) -> Result<String> {
        binary::read_fixed_string(self.region, self.base + 112, VAR_STRING_LEN)
    }
}

/// View of the recorded-session sub-header at byte 112.
#[derive(Debug, Clone, Copy)]
pub struct DiskSubHeader<'a> {
    region: &'a [u8],
    base: usize,
}

impl<'a> DiskSubHeader<'a> {
    /// Overlay the sub-header view at its fixed file offset.
    pub fn new(region: &'a [u8]) -> Result<Self> {
        let base = DISK_SUB_HEADER_OFFSET;
        if base + DISK_SUB_HEADER_SIZE > region.len() {
            return Err(SdkError::Memory { offset: base });
        }
        Ok(Self { region, base })
    }

    /// Session start date as a unix timestamp.
    pub fn session_start_date(&self) -> Result<u64> {
        parse_u64_le(self.region, self.base)
    }

    /// Session time at the first record, in seconds.
    pub fn session_start_time(&self) -> Result<f64> {
        parse_f64_le(self.region, self.base + 8)
    }

    /// Session time at the last record, in seconds.
    pub fn session_end_time(&self) -> Result<f64> {
        parse_f64_le(self.region, self.base + 16)
    }

    /// Laps completed over the recording.
    pub fn session_lap_count(&self) -> Result<i32> {
        parse_i32_le(self.region, self.base + 24)
    }

    /// Number of telemetry records in the file.
    pub fn session_record_count(&self) -> Result<i32> {
        parse_i32_le(self.region, self.base + 28)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RegionBuilder, TestVar};
    use crate::types::VarType;

    #[test]
    fn header_fields_read_at_documented_offsets() {
        let mut region = vec![0u8; 128];
        let fields: [(usize, i32); 10] = [
            (0, 2),       // version
            (4, 1),       // status
            (8, 60),      // tick rate
            (12, 42),     // session info update
            (16, 512),    // session info len
            (20, 4096),   // session info offset
            (24, 5),      // num vars
            (28, 256),    // var header offset
            (32, 3),      // num buf
            (36, 1024),   // buf len
        ];
        for (offset, value) in fields {
            region[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        let header = Header::new(&region).unwrap();
        assert_eq!(header.version(), 2);
        assert_eq!(header.status(), 1);
        assert!(header.is_connected());
        assert_eq!(header.tick_rate(), 60);
        assert_eq!(header.session_info_update(), 42);
        assert_eq!(header.session_info_len(), 512);
        assert_eq!(header.session_info_offset(), 4096);
        assert_eq!(header.num_vars(), 5);
        assert_eq!(header.var_header_offset(), 256);
        assert_eq!(header.num_buf(), 3);
        assert_eq!(header.buf_len(), 1024);
    }

    #[test]
    fn var_buf_entries_start_at_offset_48_with_16_byte_stride() {
        let mut region = vec![0u8; 128];
        region[32..36].copy_from_slice(&2i32.to_le_bytes()); // num_buf
        region[48..52].copy_from_slice(&100i32.to_le_bytes());
        region[52..56].copy_from_slice(&7000i32.to_le_bytes());
        region[64..68].copy_from_slice(&101i32.to_le_bytes());
        region[68..72].copy_from_slice(&8000i32.to_le_bytes());

        let header = Header::new(&region).unwrap();
        let bufs = header.var_bufs().unwrap();
        assert_eq!(bufs.len(), 2);
        assert_eq!(bufs[0], VarBufDesc { slot: 0, tick_count: 100, buf_offset: 7000 });
        assert_eq!(bufs[1], VarBufDesc { slot: 1, tick_count: 101, buf_offset: 8000 });
    }

    #[test]
    fn short_region_is_rejected() {
        assert!(Header::new(&[0u8; 47]).is_err());
        assert!(Header::new(&[0u8; 48]).is_ok());
        assert!(VarHeaderView::new(&[0u8; 100], 0).is_err());
        assert!(DiskSubHeader::new(&[0u8; 120]).is_err());
    }

    #[test]
    fn var_header_view_decodes_strings_and_fields() {
        let region = RegionBuilder::new()
            .var(TestVar::scalar("Speed", VarType::Float32).desc("GPS vehicle speed").unit("m/s"))
            .build();

        let header = Header::new(&region).unwrap();
        let base = header.var_header_offset() as usize;
        let view = VarHeaderView::new(&region, base).unwrap();
        assert_eq!(view.type_code().unwrap(), VarType::Float32.code());
        assert_eq!(view.count().unwrap(), 1);
        assert!(!view.count_as_time().unwrap());
        assert_eq!(view.name().unwrap(), "Speed");
        assert_eq!(view.desc().unwrap(), "GPS vehicle speed");
        assert_eq!(view.unit().unwrap(), "m/s");
    }

    #[test]
    fn disk_sub_header_reads_fixed_offsets() {
        let mut region = vec![0u8; 160];
        region[112..120].copy_from_slice(&1_700_000_000u64.to_le_bytes());
        region[120..128].copy_from_slice(&12.5f64.to_le_bytes());
        region[128..136].copy_from_slice(&812.5f64.to_le_bytes());
        region[136..140].copy_from_slice(&14i32.to_le_bytes());
        region[140..144].copy_from_slice(&48000i32.to_le_bytes());

        let disk = DiskSubHeader::new(&region).unwrap();
        assert_eq!(disk.session_start_date().unwrap(), 1_700_000_000);
        assert_eq!(disk.session_start_time().unwrap(), 12.5);
        assert_eq!(disk.session_end_time().unwrap(), 812.5);
        assert_eq!(disk.session_lap_count().unwrap(), 14);
        assert_eq!(disk.session_record_count().unwrap(), 48000);
    }
}
