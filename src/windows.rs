//! Windows shared-memory and messaging plumbing
//!
//! The simulator publishes telemetry through a named read-only file
//! mapping, signals each completed tick on a named kernel event, and
//! accepts control commands through a registered broadcast window
//! message. This module owns every Win32 call the client needs; all
//! decoding happens on plain byte slices elsewhere.

use std::ptr::NonNull;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, HANDLE, LPARAM, WAIT_OBJECT_0, WAIT_TIMEOUT, WPARAM};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
};
use windows::Win32::System::Threading::{
    OpenEventW, SYNCHRONIZATION_ACCESS_RIGHTS, WaitForSingleObject,
};
use windows::Win32::UI::WindowsAndMessaging::{
    HWND_BROADCAST, RegisterWindowMessageW, SendNotifyMessageW,
};
use windows::core::PCWSTR;

use crate::{Result, SdkError};

/// Shared memory file name
pub const MEM_MAP_FILE_NAME: &str = "Local\\IRSDKMemMapFileName";
/// Maximum size of the shared region
pub const MEM_MAP_FILE_SIZE: usize = 1164 * 1024;
/// Data valid event name
pub const DATA_VALID_EVENT_NAME: &str = "Local\\IRSDKDataValidEvent";
/// Registered window message name for outbound commands
pub const BROADCAST_MSG_NAME: &str = "IRSDK_BROADCASTMSG";

/// SYNCHRONIZE access right, the only right the event wait needs.
const SYNCHRONIZE: SYNCHRONIZATION_ACCESS_RIGHTS = SYNCHRONIZATION_ACCESS_RIGHTS(0x0010_0000);

/// Result of waiting on the data-valid event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    Signaled,
    Timeout,
}

/// Read-only view of the simulator's shared memory region.
pub struct MappedRegion {
    mapping: HANDLE,
    base: NonNull<u8>,
    len: usize,
}

impl MappedRegion {
    /// Open the named mapping and map a read-only view of it.
    pub fn open() -> Result<Self> {
        trace!("Opening simulator shared memory mapping");

        let mapping = unsafe {
            let wide_name = wide_string(MEM_MAP_FILE_NAME);
            OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(wide_name.as_ptr()))
                .map_err(|e| SdkError::windows_api_error("OpenFileMappingW", e))?
        };

        let base = unsafe {
            let ptr = MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, MEM_MAP_FILE_SIZE);
            NonNull::new(ptr.Value as *mut u8).ok_or_else(|| {
                let win_err = windows::core::Error::from_thread();
                let _ = CloseHandle(mapping);
                SdkError::windows_api_error("MapViewOfFile", win_err)
            })?
        };

        debug!(len = MEM_MAP_FILE_SIZE, "Mapped simulator shared memory");
        Ok(Self { mapping, base, len: MEM_MAP_FILE_SIZE })
    }

    /// The mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        // Safety: the view stays mapped for the lifetime of self and is
        // MEM_MAP_FILE_SIZE bytes long by construction.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
        }
    }
}

// Safety: the region is a read-only view of a kernel object; the pointer
// is valid for the struct's lifetime on any thread.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

/// The kernel event the simulator signals after each completed tick.
pub struct DataValidEvent {
    handle: HANDLE,
}

impl DataValidEvent {
    /// Open the named event for synchronize access only.
    pub fn open() -> Result<Self> {
        let handle = unsafe {
            let wide_name = wide_string(DATA_VALID_EVENT_NAME);
            OpenEventW(SYNCHRONIZE, false, PCWSTR::from_raw(wide_name.as_ptr()))
                .map_err(|e| SdkError::windows_api_error("OpenEventW", e))?
        };
        debug!("Opened data valid event");
        Ok(Self { handle })
    }

    /// Wait for the next tick boundary (async, cooperative).
    ///
    /// The synchronous kernel wait runs on the blocking pool so the
    /// calling task suspends instead of pinning a worker thread. The
    /// event is level-triggered; a cancelled wait does not consume a
    /// tick.
    pub async fn wait(&self, timeout: Duration) -> Result<WaitResult> {
        // HANDLE is a raw pointer and not Send; kernel handles are
        // thread-safe, so carry it across as its integer value.
        let handle_raw = self.handle.0 as usize;
        let timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;

        tokio::task::spawn_blocking(move || {
            trace!(timeout_ms, "Waiting on data valid event");
            let handle = HANDLE(handle_raw as *mut std::ffi::c_void);
            let result = unsafe { WaitForSingleObject(handle, timeout_ms) };
            match result {
                WAIT_OBJECT_0 => Ok(WaitResult::Signaled),
                WAIT_TIMEOUT => Ok(WaitResult::Timeout),
                _ => {
                    let win_err = windows::core::Error::from_thread();
                    Err(SdkError::windows_api_error("WaitForSingleObject", win_err))
                }
            }
        })
        .await
        .map_err(|e| SdkError::sim_unavailable(format!("Event wait task panicked: {}", e)))?
    }
}

impl Drop for DataValidEvent {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

// Safety: kernel event handles are thread-safe objects.
unsafe impl Send for DataValidEvent {}
unsafe impl Sync for DataValidEvent {}

/// The registered broadcast message id, registered once per process.
static BROADCAST_MSG_ID: OnceLock<u32> = OnceLock::new();

/// Register (or fetch) the numeric id of the broadcast window message.
pub fn broadcast_msg_id() -> Result<u32> {
    if let Some(&id) = BROADCAST_MSG_ID.get() {
        return Ok(id);
    }
    let id = unsafe {
        let wide_name = wide_string(BROADCAST_MSG_NAME);
        RegisterWindowMessageW(PCWSTR::from_raw(wide_name.as_ptr()))
    };
    if id == 0 {
        let win_err = windows::core::Error::from_thread();
        return Err(SdkError::windows_api_error("RegisterWindowMessageW", win_err));
    }
    Ok(*BROADCAST_MSG_ID.get_or_init(|| id))
}

/// Post an encoded command word pair to the broadcast window.
///
/// The message is posted without waiting for acknowledgement; a refused
/// post surfaces as a non-fatal broadcast error.
pub fn send_broadcast(operation: &str, wparam: u32, lparam: u32) -> Result<()> {
    let msg_id = broadcast_msg_id()?;
    let result = unsafe {
        SendNotifyMessageW(
            HWND_BROADCAST,
            msg_id,
            WPARAM(wparam as usize),
            LPARAM(lparam as isize),
        )
    };
    result.map_err(|e| {
        debug!(operation, error = %e, "Broadcast post failed");
        SdkError::broadcast_failed(operation)
    })
}

/// Convert string to null-terminated wide string for Windows APIs
fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_match_simulator_contract() {
        assert_eq!(MEM_MAP_FILE_NAME, "Local\\IRSDKMemMapFileName");
        assert_eq!(DATA_VALID_EVENT_NAME, "Local\\IRSDKDataValidEvent");
        assert_eq!(BROADCAST_MSG_NAME, "IRSDK_BROADCASTMSG");
        assert_eq!(MEM_MAP_FILE_SIZE, 1_191_936);
    }

    #[test]
    #[ignore = "simulator_required"]
    fn opens_live_region_and_event() {
        let region = MappedRegion::open().expect("Failed to open shared memory");
        assert_eq!(region.bytes().len(), MEM_MAP_FILE_SIZE);
        let _event = DataValidEvent::open().expect("Failed to open data valid event");
    }

    #[test]
    fn broadcast_message_registers_once() {
        let first = broadcast_msg_id().expect("RegisterWindowMessageW failed");
        let second = broadcast_msg_id().expect("RegisterWindowMessageW failed");
        assert_eq!(first, second);
        // Registered window messages live in 0xC000..=0xFFFF
        assert!((0xC000..=0xFFFF).contains(&first));
    }
}
