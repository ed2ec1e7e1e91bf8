//! Simulator ABI enumerations
//!
//! Every discriminant here is fixed by the simulator and must be
//! reproduced bit-exactly; the broadcast command sets feed directly into
//! the wire words built by [`crate::broadcast`].

use serde::{Deserialize, Serialize};

/// Header status field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusField {
    Connected = 1,
}

/// Broadcast command kinds (the low word of WPARAM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum BroadcastMsg {
    CamSwitchPos = 0,
    CamSwitchNum = 1,
    CamSetState = 2,
    ReplaySetPlaySpeed = 3,
    ReplaySetPlayPosition = 4,
    ReplaySearch = 5,
    ReplaySetState = 6,
    ReloadTextures = 7,
    ChatCommand = 8,
    PitCommand = 9,
    TelemCommand = 10,
    FfbCommand = 11,
    ReplaySearchSessionTime = 12,
    VideoCapture = 13,
}

impl BroadcastMsg {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ChatCommandMode {
    Macro = 0,
    BeginChat = 1,
    Reply = 2,
    Cancel = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum PitCommandMode {
    Clear = 0,
    Ws = 1,
    Fuel = 2,
    Lf = 3,
    Rf = 4,
    Lr = 5,
    Rr = 6,
    ClearTires = 7,
    Fr = 8,
    ClearWs = 9,
    ClearFr = 10,
    ClearFuel = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum TelemCommandMode {
    Stop = 0,
    Start = 1,
    Restart = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum FfbCommandMode {
    MaxForce = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReplayStateMode {
    EraseTape = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReloadTexturesMode {
    All = 0,
    CarIdx = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReplaySearchMode {
    ToStart = 0,
    ToEnd = 1,
    PrevSession = 2,
    NextSession = 3,
    PrevLap = 4,
    NextLap = 5,
    PrevFrame = 6,
    NextFrame = 7,
    PrevIncident = 8,
    NextIncident = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReplayPositionMode {
    Begin = 0,
    Current = 1,
    End = 2,
}

/// Special camera targets for position-based switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum CameraSwitchMode {
    AtIncident = -3,
    AtLeader = -2,
    AtExciting = -1,
}

impl CameraSwitchMode {
    /// Two's-complement low word, as packed into the command.
    pub const fn code(self) -> u16 {
        self as i16 as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum VideoCaptureMode {
    TriggerScreenShot = 0,
    StartVideoCapture = 1,
    EndVideoCapture = 2,
    ToggleVideoCapture = 3,
    ShowVideoTimer = 4,
    HideVideoTimer = 5,
}

/// Car position relative to track, from the `PlayerTrackSurface` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TrackLocation {
    NotInWorld = -1,
    OffTrack = 0,
    InPitStall = 1,
    ApproachingPits = 2,
    OnTrack = 3,
}

impl TrackLocation {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Self::NotInWorld),
            0 => Some(Self::OffTrack),
            1 => Some(Self::InPitStall),
            2 => Some(Self::ApproachingPits),
            3 => Some(Self::OnTrack),
            _ => None,
        }
    }
}

/// Surface material under a tire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TrackSurface {
    NotInWorld = -1,
    Undefined = 0,
    Asphalt1 = 1,
    Asphalt2 = 2,
    Asphalt3 = 3,
    Asphalt4 = 4,
    Concrete1 = 5,
    Concrete2 = 6,
    RacingDirt1 = 7,
    RacingDirt2 = 8,
    Paint1 = 9,
    Paint2 = 10,
    Rumble1 = 11,
    Rumble2 = 12,
    Rumble3 = 13,
    Rumble4 = 14,
    Grass1 = 15,
    Grass2 = 16,
    Grass3 = 17,
    Grass4 = 18,
    Dirt1 = 19,
    Dirt2 = 20,
    Dirt3 = 21,
    Dirt4 = 22,
    Sand = 23,
    Gravel1 = 24,
    Gravel2 = 25,
    Grasscrete = 26,
    Astroturf = 27,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum SessionState {
    Invalid = 0,
    GetInCar = 1,
    Warmup = 2,
    ParadeLaps = 3,
    Racing = 4,
    Checkered = 5,
    CoolDown = 6,
}

impl SessionState {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Invalid),
            1 => Some(Self::GetInCar),
            2 => Some(Self::Warmup),
            3 => Some(Self::ParadeLaps),
            4 => Some(Self::Racing),
            5 => Some(Self::Checkered),
            6 => Some(Self::CoolDown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PitSvStatus {
    None = 0,
    InProgress = 1,
    Complete = 2,
    TooFarLeft = 100,
    TooFarRight = 101,
    TooFarForward = 102,
    TooFarBack = 103,
    BadAngle = 104,
    CantFixThat = 105,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PaceMode {
    SingleFileStart = 0,
    DoubleFileStart = 1,
    SingleFileRestart = 2,
    DoubleFileRestart = 3,
    NotPacing = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum CarLeftRight {
    Off = 0,
    Clear = 1,
    CarLeft = 2,
    CarRight = 3,
    CarLeftRight = 4,
    TwoCarsLeft = 5,
    TwoCarsRight = 6,
}

impl CarLeftRight {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Clear),
            2 => Some(Self::CarLeft),
            3 => Some(Self::CarRight),
            4 => Some(Self::CarLeftRight),
            5 => Some(Self::TwoCarsLeft),
            6 => Some(Self::TwoCarsRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TrackWetness {
    Unknown = 0,
    Dry = 1,
    MostlyDry = 2,
    VeryLightlyWet = 3,
    LightlyWet = 4,
    ModeratelyWet = 5,
    VeryWet = 6,
    ExtremelyWet = 7,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_kinds_match_sdk_values() {
        assert_eq!(BroadcastMsg::CamSwitchPos.code(), 0);
        assert_eq!(BroadcastMsg::CamSwitchNum.code(), 1);
        assert_eq!(BroadcastMsg::CamSetState.code(), 2);
        assert_eq!(BroadcastMsg::ReplaySetPlaySpeed.code(), 3);
        assert_eq!(BroadcastMsg::ReplaySetPlayPosition.code(), 4);
        assert_eq!(BroadcastMsg::ReplaySearch.code(), 5);
        assert_eq!(BroadcastMsg::ReplaySetState.code(), 6);
        assert_eq!(BroadcastMsg::ReloadTextures.code(), 7);
        assert_eq!(BroadcastMsg::ChatCommand.code(), 8);
        assert_eq!(BroadcastMsg::PitCommand.code(), 9);
        assert_eq!(BroadcastMsg::TelemCommand.code(), 10);
        assert_eq!(BroadcastMsg::FfbCommand.code(), 11);
        assert_eq!(BroadcastMsg::ReplaySearchSessionTime.code(), 12);
        assert_eq!(BroadcastMsg::VideoCapture.code(), 13);
    }

    #[test]
    fn command_modes_match_sdk_values() {
        assert_eq!(PitCommandMode::Clear as u16, 0);
        assert_eq!(PitCommandMode::Fuel as u16, 2);
        assert_eq!(PitCommandMode::ClearFuel as u16, 11);
        assert_eq!(ChatCommandMode::Macro as u16, 0);
        assert_eq!(ChatCommandMode::Cancel as u16, 3);
        assert_eq!(TelemCommandMode::Restart as u16, 2);
        assert_eq!(FfbCommandMode::MaxForce as u16, 0);
        assert_eq!(ReplaySearchMode::NextIncident as u16, 9);
        assert_eq!(ReplayPositionMode::End as u16, 2);
        assert_eq!(ReloadTexturesMode::CarIdx as u16, 1);
        assert_eq!(VideoCaptureMode::HideVideoTimer as u16, 5);
        assert_eq!(ReplayStateMode::EraseTape as u16, 0);
    }

    #[test]
    fn camera_switch_targets_pack_as_twos_complement() {
        assert_eq!(CameraSwitchMode::AtIncident.code(), 0xFFFD);
        assert_eq!(CameraSwitchMode::AtLeader.code(), 0xFFFE);
        assert_eq!(CameraSwitchMode::AtExciting.code(), 0xFFFF);
    }

    #[test]
    fn observational_enums_match_sdk_values() {
        assert_eq!(StatusField::Connected as i32, 1);
        assert_eq!(TrackLocation::NotInWorld as i32, -1);
        assert_eq!(TrackLocation::OnTrack as i32, 3);
        assert_eq!(TrackSurface::Astroturf as i32, 27);
        assert_eq!(SessionState::CoolDown as i32, 6);
        assert_eq!(PitSvStatus::TooFarLeft as i32, 100);
        assert_eq!(PitSvStatus::CantFixThat as i32, 105);
        assert_eq!(PaceMode::NotPacing as i32, 4);
        assert_eq!(CarLeftRight::TwoCarsRight as i32, 6);
        assert_eq!(TrackWetness::ExtremelyWet as i32, 7);
    }

    #[test]
    fn from_i32_round_trips() {
        assert_eq!(TrackLocation::from_i32(-1), Some(TrackLocation::NotInWorld));
        assert_eq!(TrackLocation::from_i32(4), None);
        assert_eq!(SessionState::from_i32(4), Some(SessionState::Racing));
        assert_eq!(CarLeftRight::from_i32(7), None);
    }
}
