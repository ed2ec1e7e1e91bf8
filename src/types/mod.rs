//! Core types for telemetry data representation.
//!
//! - [`VarType`] maps the SDK's six wire type codes with size information
//! - [`Value`] is the tagged runtime type for telemetry samples
//! - [`VarDescriptor`] and [`Catalog`] describe the variable table with
//!   O(1) name lookup
//! - The ABI enumerations and bit fields reproduce the simulator's value
//!   sets bit-exactly
//!
//! Session-info values are deliberately a different type
//! ([`crate::SessionValue`], a parsed document tree); telemetry samples
//! and metadata documents never mix in one value.

mod descriptor;
mod enums;
mod flags;
mod var_type;

pub use descriptor::{Catalog, VarDescriptor};
pub use enums::{
    BroadcastMsg, CameraSwitchMode, CarLeftRight, ChatCommandMode, FfbCommandMode, PaceMode,
    PitCommandMode, PitSvStatus, ReloadTexturesMode, ReplayPositionMode, ReplaySearchMode,
    ReplayStateMode, SessionState, StatusField, TelemCommandMode, TrackLocation, TrackSurface,
    TrackWetness, VideoCaptureMode,
};
pub use flags::{CameraState, EngineWarnings, Flags, PaceFlags, PitSvFlags};
pub use var_type::{Value, VarType};
