//! The telemetry client
//!
//! [`Client`] attaches to the simulator's shared region (or a file
//! standing in for it), decodes the self-describing layout, and serves
//! per-tick telemetry variables, session metadata, and outbound control
//! commands. It owns the only mutable state in the crate: the variable
//! catalog, the frozen snapshot, and the session-info cache. None of it
//! is safe for concurrent use from multiple threads; drive one client
//! from one task.
//!
//! The async surface has exactly four suspension points: [`Client::startup`]
//! (liveness probe plus event wait), [`Client::get`] when it touches
//! session info, [`Client::freeze_var_buffer_latest`] (event wait), and
//! [`Client::is_connected`].

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::broadcast::{encode_command, ffb_fixed_point, pad_car_num, split_payload};
use crate::layout::{Header, VarBufDesc};
use crate::probe::{HttpSimStatus, SimStatus};
use crate::session::{SessionInfoCache, SessionValue};
use crate::source::Attachment;
use crate::types::{
    BroadcastMsg, CameraState, Catalog, ChatCommandMode, FfbCommandMode, PitCommandMode,
    ReloadTexturesMode, ReplayPositionMode, ReplaySearchMode, ReplayStateMode, TelemCommandMode,
    Value, VideoCaptureMode,
};
use crate::{Result, SdkError, binary};

#[cfg(windows)]
use crate::windows::{DataValidEvent, WaitResult};

/// Bound on a single data-valid event wait.
pub const DATA_VALID_TIMEOUT: Duration = Duration::from_millis(32);

/// A value resolved by [`Client::get`]: either a telemetry sample or a
/// session-info document fragment. The two never mix.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientValue {
    Var(Value),
    Session(SessionValue),
}

impl ClientValue {
    pub fn as_var(&self) -> Option<&Value> {
        match self {
            ClientValue::Var(v) => Some(v),
            ClientValue::Session(_) => None,
        }
    }

    pub fn as_session(&self) -> Option<&SessionValue> {
        match self {
            ClientValue::Session(v) => Some(v),
            ClientValue::Var(_) => None,
        }
    }
}

/// A private byte-for-byte copy of one telemetry buffer, decoupling
/// consumer reads from the simulator's writer.
struct FrozenSnapshot {
    tick_count: i32,
    data: Vec<u8>,
}

/// Client for the simulator's shared-memory telemetry interface.
pub struct Client {
    attachment: Option<Attachment>,
    #[cfg(windows)]
    event: Option<DataValidEvent>,
    catalog: Option<Catalog>,
    frozen: Option<FrozenSnapshot>,
    session: SessionInfoCache,
    probe: Box<dyn SimStatus>,
    initialized: bool,
    /// Reconnect bootstrap progress; see [`Client::is_connected`].
    reconnect_state: u8,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a detached client using the HTTP liveness probe.
    pub fn new() -> Self {
        Self::with_probe(HttpSimStatus::new())
    }

    /// Create a detached client with a custom liveness probe.
    pub fn with_probe(probe: impl SimStatus + 'static) -> Self {
        Self {
            attachment: None,
            #[cfg(windows)]
            event: None,
            catalog: None,
            frozen: None,
            session: SessionInfoCache::new(),
            probe: Box::new(probe),
            initialized: false,
            reconnect_state: 0,
        }
    }

    /// Whether a previous [`Client::startup`] succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Attach to the simulator and initialize the client.
    ///
    /// With no `test_file`, the liveness probe runs first, then the
    /// data-valid event is opened and waited on (bounded at
    /// [`DATA_VALID_TIMEOUT`]) so the region is mapped just after a tick
    /// boundary. A `test_file` replaces the live region and skips both.
    /// `dump_to` copies the raw region bytes to a file after mapping.
    ///
    /// Returns `Ok(false)` for the transient failures (probe negative,
    /// event unavailable, wait timeout, header not yet valid); platform
    /// and I/O failures propagate as errors. Calling again after success
    /// is a no-op.
    pub async fn startup(
        &mut self,
        test_file: Option<&Path>,
        dump_to: Option<&Path>,
    ) -> Result<bool> {
        if self.initialized {
            return Ok(true);
        }

        if test_file.is_none() {
            if !self.probe.is_running().await {
                debug!("Liveness probe reports simulator not running");
                return Ok(false);
            }
            #[cfg(windows)]
            {
                let event = match DataValidEvent::open() {
                    Ok(event) => event,
                    Err(e) => {
                        debug!(error = %e, "Data valid event unavailable");
                        return Ok(false);
                    }
                };
                match event.wait(DATA_VALID_TIMEOUT).await? {
                    WaitResult::Signaled => self.event = Some(event),
                    WaitResult::Timeout => {
                        debug!("Data valid event did not signal during startup");
                        return Ok(false);
                    }
                }
            }
            #[cfg(not(windows))]
            {
                return Err(SdkError::unsupported_platform("Live telemetry", "Windows"));
            }
        }

        if self.attachment.is_none() {
            let attachment = match test_file {
                Some(path) => Attachment::from_file(path)?,
                #[cfg(windows)]
                None => Attachment::live()?,
                #[cfg(not(windows))]
                None => return Err(SdkError::unsupported_platform("Live telemetry", "Windows")),
            };
            self.attachment = Some(attachment);
        }

        if let Some(attachment) = self.attachment.as_ref() {
            if let Some(path) = dump_to {
                attachment.dump_to(path)?;
            }
            let header = Header::new(attachment.bytes())?;
            self.initialized = header.version() >= 1 && header.num_buf() > 0;
            info!(
                version = header.version(),
                tick_rate = header.tick_rate(),
                num_vars = header.num_vars(),
                num_buf = header.num_buf(),
                initialized = self.initialized,
                "Telemetry source attached"
            );
        }

        Ok(self.initialized)
    }

    /// Release the region, event, and every cache. Safe from any state.
    pub fn shutdown(&mut self) {
        debug!("Shutting down telemetry client");
        self.initialized = false;
        self.attachment = None;
        #[cfg(windows)]
        {
            self.event = None;
        }
        self.catalog = None;
        self.frozen = None;
        self.session.clear();
        self.reconnect_state = 0;
    }

    /// The header's session-info update counter.
    pub fn session_info_update(&self) -> Result<i32> {
        Ok(self.header_view()?.session_info_update())
    }

    /// The counter value at which `key`'s cached session value was parsed.
    pub fn get_session_info_update_by_key(&self, key: &str) -> Option<i32> {
        self.session.update_for_key(key)
    }

    /// Telemetry variable names in descriptor-table order.
    pub fn var_names(&mut self) -> Result<Vec<String>> {
        self.ensure_catalog()?;
        let catalog = self.catalog.as_ref().ok_or(SdkError::Detached)?;
        Ok(catalog.names().map(str::to_string).collect())
    }

    /// Descriptor lookup for a telemetry variable.
    pub fn var_descriptor(&mut self, name: &str) -> Result<Option<crate::VarDescriptor>> {
        self.ensure_catalog()?;
        let catalog = self.catalog.as_ref().ok_or(SdkError::Detached)?;
        Ok(catalog.get(name).cloned())
    }

    /// Resolve `name` to a telemetry sample or a session-info fragment.
    ///
    /// Telemetry reads come from the frozen snapshot when one exists,
    /// otherwise from the most recently completed buffer. Unknown names
    /// resolve to `Ok(None)`.
    pub async fn get(&mut self, name: &str) -> Result<Option<ClientValue>> {
        self.ensure_catalog()?;

        let telemetry = {
            let catalog = self.catalog.as_ref().ok_or(SdkError::Detached)?;
            match catalog.get(name) {
                Some(var) => {
                    let (bytes, base) = match &self.frozen {
                        // the snapshot copy starts at its buffer's base
                        Some(snapshot) => (snapshot.data.as_slice(), 0usize),
                        None => {
                            let attachment =
                                self.attachment.as_ref().ok_or(SdkError::Detached)?;
                            let region = attachment.bytes();
                            let latest = Self::select_published(&Header::new(region)?)?;
                            (region, usize::try_from(latest.buf_offset.max(0)).unwrap_or(0))
                        }
                    };
                    Some(binary::read_values(bytes, base + var.offset, var.var_type, var.count)?)
                }
                None => None,
            }
        };
        if let Some(value) = telemetry {
            return Ok(Some(ClientValue::Var(value)));
        }

        let attachment = self.attachment.as_ref().ok_or(SdkError::Detached)?;
        let region = attachment.bytes();
        Ok(self.session.get(region, name).await.map(ClientValue::Session))
    }

    /// The most recently *completed* rotating buffer.
    ///
    /// The buffer with the strictly largest tick count is the one the
    /// simulator is likely mid-write; the next-to-largest is the newest
    /// stable one. Equal ticks break toward the higher slot index.
    pub fn latest_published(&self) -> Result<VarBufDesc> {
        Self::select_published(&self.header_view()?)
    }

    fn select_published(header: &Header<'_>) -> Result<VarBufDesc> {
        let mut bufs = header.var_bufs()?;
        if bufs.is_empty() {
            return Err(SdkError::parse_error("Buffer selection", "Header declares no buffers"));
        }
        bufs.sort_by(|a, b| (b.tick_count, b.slot).cmp(&(a.tick_count, a.slot)));
        Ok(if bufs.len() > 1 { bufs[1] } else { bufs[0] })
    }

    /// Freeze a torn-free snapshot of the newest buffer.
    ///
    /// Any existing snapshot is dropped first, then the data-valid event
    /// is awaited (bounded) so a tick boundary has just passed, and the
    /// largest-tick buffer is copied into a private array. Subsequent
    /// decodes read the copy until [`Client::unfreeze_var_buffer_latest`].
    pub async fn freeze_var_buffer_latest(&mut self) -> Result<()> {
        self.unfreeze_var_buffer_latest();
        self.wait_for_tick().await?;

        let attachment = self.attachment.as_ref().ok_or(SdkError::Detached)?;
        let region = attachment.bytes();
        let header = Header::new(region)?;
        let mut bufs = header.var_bufs()?;
        bufs.sort_by(|a, b| (b.tick_count, b.slot).cmp(&(a.tick_count, a.slot)));
        let newest = *bufs.first().ok_or_else(|| {
            SdkError::parse_error("Snapshot freeze", "Header declares no buffers")
        })?;

        let start = usize::try_from(newest.buf_offset.max(0)).unwrap_or(0);
        let len = usize::try_from(header.buf_len().max(0)).unwrap_or(0);
        let data = region
            .get(start..start + len)
            .ok_or(SdkError::Memory { offset: start })?
            .to_vec();

        trace!(tick = newest.tick_count, slot = newest.slot, "Froze telemetry snapshot");
        self.frozen = Some(FrozenSnapshot { tick_count: newest.tick_count, data });
        Ok(())
    }

    /// Drop the private snapshot; reads fall back to live buffers.
    pub fn unfreeze_var_buffer_latest(&mut self) {
        if self.frozen.take().is_some() {
            trace!("Dropped telemetry snapshot");
        }
    }

    /// Tick count of the current frozen snapshot, if any.
    pub fn frozen_tick_count(&self) -> Option<i32> {
        self.frozen.as_ref().map(|s| s.tick_count)
    }

    /// Whether the simulator is publishing live data.
    ///
    /// Normally this is the header's connected bit. After a status drop
    /// the bit alone is not trustworthy while the simulator renegotiates,
    /// so a bootstrap sequence requires a `SessionNum` round-trip to
    /// resolve again before reporting connected; until it resolves, the
    /// client reports not connected.
    pub async fn is_connected(&mut self) -> Result<bool> {
        if self.attachment.is_none() {
            return Ok(false);
        }
        let status_connected = self.header_view()?.is_connected();

        if status_connected {
            self.reconnect_state = 0;
        }
        if self.reconnect_state == 0 && !status_connected {
            self.reconnect_state = 1;
        }
        if self.reconnect_state == 1
            && (self.get("SessionNum").await?.is_none() || self.is_file_attachment())
        {
            self.reconnect_state = 2;
        }
        if self.reconnect_state == 2 && self.get("SessionNum").await?.is_some() {
            self.reconnect_state = 3;
        }

        let has_wait_source = self.is_file_attachment() || self.has_event();
        Ok(has_wait_source && (status_connected || self.reconnect_state == 3))
    }

    /// Write the decoded session document and all telemetry values to a
    /// file: the document first, then one `name  value` line per
    /// variable, sorted case-insensitively by name.
    pub async fn parse_to(&mut self, path: &Path) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }

        let document = {
            let attachment = self.attachment.as_ref().ok_or(SdkError::Detached)?;
            let region = attachment.bytes();
            let header = Header::new(region)?;
            let start = usize::try_from(header.session_info_offset().max(0)).unwrap_or(0);
            let len = usize::try_from(header.session_info_len().max(0)).unwrap_or(0);
            let window = region.get(start..start + len).unwrap_or(&[]);
            crate::session::decode_section_text(window)
        };

        let mut names = self.var_names()?;
        names.sort_by_key(|name| name.to_lowercase());
        names.dedup();

        let mut out = document;
        let mut first = true;
        for name in names {
            if let Some(ClientValue::Var(value)) = self.get(&name).await? {
                if !first {
                    out.push('\n');
                }
                first = false;
                out.push_str(&format!("{:<32}{}", name, value));
            }
        }

        std::fs::write(path, out).map_err(|e| SdkError::file_error(path.to_path_buf(), e))?;
        Ok(())
    }

    // ---- broadcast commands ----------------------------------------------

    /// Switch the camera to a car by position (negative values address the
    /// special targets in [`crate::CameraSwitchMode`]).
    pub fn cam_switch_pos(&self, position: i32, group: u16, camera: u16) -> Result<()> {
        let target = position as u16;
        self.send_command("cam_switch_pos", BroadcastMsg::CamSwitchPos, target, group, camera)
    }

    /// Switch the camera to a car by its number string ("07" and "7" are
    /// different cars; leading zeros are encoded by padding).
    pub fn cam_switch_num(&self, car_number: &str, group: u16, camera: u16) -> Result<()> {
        let padded = pad_car_num(car_number)? as u16;
        self.send_command("cam_switch_num", BroadcastMsg::CamSwitchNum, padded, group, camera)
    }

    /// Set the camera tool state.
    pub fn cam_set_state(&self, state: CameraState) -> Result<()> {
        self.send_command("cam_set_state", BroadcastMsg::CamSetState, state.bits() as u16, 0, 0)
    }

    /// Set replay playback speed; `slow_motion` divides instead of multiplies.
    pub fn replay_set_play_speed(&self, speed: i16, slow_motion: bool) -> Result<()> {
        self.send_command(
            "replay_set_play_speed",
            BroadcastMsg::ReplaySetPlaySpeed,
            speed as u16,
            u16::from(slow_motion),
            0,
        )
    }

    /// Seek the replay tape to a frame relative to `mode`.
    pub fn replay_set_play_position(&self, mode: ReplayPositionMode, frame_num: i32) -> Result<()> {
        let (b, c) = split_payload(frame_num as u32);
        self.send_command(
            "replay_set_play_position",
            BroadcastMsg::ReplaySetPlayPosition,
            mode as u16,
            b,
            c,
        )
    }

    /// Run a replay search (next lap, previous incident, ...).
    pub fn replay_search(&self, mode: ReplaySearchMode) -> Result<()> {
        self.send_command("replay_search", BroadcastMsg::ReplaySearch, mode as u16, 0, 0)
    }

    /// Change replay tape state.
    pub fn replay_set_state(&self, mode: ReplayStateMode) -> Result<()> {
        self.send_command("replay_set_state", BroadcastMsg::ReplaySetState, mode as u16, 0, 0)
    }

    /// Reload every car texture.
    pub fn reload_all_textures(&self) -> Result<()> {
        self.send_command(
            "reload_all_textures",
            BroadcastMsg::ReloadTextures,
            ReloadTexturesMode::All as u16,
            0,
            0,
        )
    }

    /// Reload the texture for one car.
    pub fn reload_texture(&self, car_idx: i32) -> Result<()> {
        let (b, c) = split_payload(car_idx as u32);
        self.send_command(
            "reload_texture",
            BroadcastMsg::ReloadTextures,
            ReloadTexturesMode::CarIdx as u16,
            b,
            c,
        )
    }

    /// Drive the in-sim chat window.
    pub fn chat_command(&self, mode: ChatCommandMode) -> Result<()> {
        self.send_command("chat_command", BroadcastMsg::ChatCommand, mode as u16, 0, 0)
    }

    /// Fire a numbered chat macro.
    pub fn chat_command_macro(&self, macro_num: i32) -> Result<()> {
        let (b, c) = split_payload(macro_num as u32);
        self.send_command(
            "chat_command_macro",
            BroadcastMsg::ChatCommand,
            ChatCommandMode::Macro as u16,
            b,
            c,
        )
    }

    /// Queue a pit-stop service change (`var` carries the amount for
    /// commands that take one, e.g. liters of fuel).
    pub fn pit_command(&self, mode: PitCommandMode, var: i32) -> Result<()> {
        let (b, c) = split_payload(var as u32);
        self.send_command("pit_command", BroadcastMsg::PitCommand, mode as u16, b, c)
    }

    /// Start, stop, or restart disk telemetry recording.
    pub fn telem_command(&self, mode: TelemCommandMode) -> Result<()> {
        self.send_command("telem_command", BroadcastMsg::TelemCommand, mode as u16, 0, 0)
    }

    /// Adjust force feedback; `value` is fixed-point encoded as
    /// `round(value * 65536)`.
    pub fn ffb_command(&self, mode: FfbCommandMode, value: f32) -> Result<()> {
        self.send_command(
            "ffb_command",
            BroadcastMsg::FfbCommand,
            ffb_fixed_point(value),
            mode as u16,
            0,
        )
    }

    /// Seek the replay to a session time in milliseconds.
    pub fn replay_search_session_time(&self, session_num: i32, session_time_ms: i32) -> Result<()> {
        let (b, c) = split_payload(session_time_ms as u32);
        self.send_command(
            "replay_search_session_time",
            BroadcastMsg::ReplaySearchSessionTime,
            session_num as u16,
            b,
            c,
        )
    }

    /// Trigger screenshots or video capture.
    pub fn video_capture(&self, mode: VideoCaptureMode) -> Result<()> {
        self.send_command("video_capture", BroadcastMsg::VideoCapture, mode as u16, 0, 0)
    }

    #[cfg(windows)]
    fn send_command(
        &self,
        operation: &str,
        kind: BroadcastMsg,
        a: u16,
        b: u16,
        c: u16,
    ) -> Result<()> {
        let (wparam, lparam) = encode_command(kind.code(), a, b, c);
        crate::windows::send_broadcast(operation, wparam, lparam)
    }

    #[cfg(not(windows))]
    fn send_command(
        &self,
        _operation: &str,
        kind: BroadcastMsg,
        a: u16,
        b: u16,
        c: u16,
    ) -> Result<()> {
        let _ = encode_command(kind.code(), a, b, c);
        Err(SdkError::unsupported_platform("Broadcast commands", "Windows"))
    }

    // ---- internals -------------------------------------------------------

    fn header_view(&self) -> Result<Header<'_>> {
        let attachment = self.attachment.as_ref().ok_or(SdkError::Detached)?;
        Header::new(attachment.bytes())
    }

    fn ensure_catalog(&mut self) -> Result<()> {
        if self.catalog.is_some() {
            return Ok(());
        }
        let attachment = self.attachment.as_ref().ok_or(SdkError::Detached)?;
        let region = attachment.bytes();
        let header = Header::new(region)?;
        self.catalog = Some(Catalog::build(region, &header)?);
        Ok(())
    }

    fn is_file_attachment(&self) -> bool {
        self.attachment.as_ref().is_some_and(Attachment::is_file)
    }

    #[cfg(windows)]
    fn has_event(&self) -> bool {
        self.event.is_some()
    }

    #[cfg(not(windows))]
    fn has_event(&self) -> bool {
        false
    }

    /// Await the next tick boundary. File sources have no event and
    /// report an immediate (synthetic) tick, like the live path does when
    /// the event is already signaled.
    async fn wait_for_tick(&self) -> Result<bool> {
        #[cfg(windows)]
        {
            if let Some(event) = &self.event {
                return Ok(matches!(event.wait(DATA_VALID_TIMEOUT).await?, WaitResult::Signaled));
            }
        }
        Ok(true)
    }
}
