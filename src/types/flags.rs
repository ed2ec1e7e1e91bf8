//! Simulator ABI bit fields
//!
//! These mirror the SDK's flag sets bit-for-bit. They decode from
//! [`crate::Value::UInt32`] samples such as `SessionFlags`,
//! `EngineWarnings`, `CamCameraState`, `PitSvFlags`, and `PaceFlags`.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EngineWarnings: u32 {
        const WATER_TEMP_WARNING    = 0x01;
        const FUEL_PRESSURE_WARNING = 0x02;
        const OIL_PRESSURE_WARNING  = 0x04;
        const ENGINE_STALLED        = 0x08;
        const PIT_SPEED_LIMITER     = 0x10;
        const REV_LIMITER_ACTIVE    = 0x20;
        const OIL_TEMP_WARNING      = 0x40;
    }
}

bitflags! {
    /// Global session flags plus per-driver black flags and start lights.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        // global flags
        const CHECKERED        = 0x0001;
        const WHITE            = 0x0002;
        const GREEN            = 0x0004;
        const YELLOW           = 0x0008;
        const RED              = 0x0010;
        const BLUE             = 0x0020;
        const DEBRIS           = 0x0040;
        const CROSSED          = 0x0080;
        const YELLOW_WAVING    = 0x0100;
        const ONE_LAP_TO_GREEN = 0x0200;
        const GREEN_HELD       = 0x0400;
        const TEN_TO_GO        = 0x0800;
        const FIVE_TO_GO       = 0x1000;
        const RANDOM_WAVING    = 0x2000;
        const CAUTION          = 0x4000;
        const CAUTION_WAVING   = 0x8000;

        // drivers black flags
        const BLACK      = 0x010000;
        const DISQUALIFY = 0x020000;
        const SERVICIBLE = 0x040000; // car is allowed service (not a flag)
        const FURLED     = 0x080000;
        const REPAIR     = 0x100000;

        // start lights
        const START_HIDDEN = 0x10000000;
        const START_READY  = 0x20000000;
        const START_SET    = 0x40000000;
        const START_GO     = 0x80000000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CameraState: u32 {
        const IS_SESSION_SCREEN       = 0x0001;
        const IS_SCENIC_ACTIVE        = 0x0002;
        const CAM_TOOL_ACTIVE         = 0x0004;
        const UI_HIDDEN               = 0x0008;
        const USE_AUTO_SHOT_SELECTION = 0x0010;
        const USE_TEMPORARY_EDITS     = 0x0020;
        const USE_KEY_ACCELERATION    = 0x0040;
        const USE_KEY10X_ACCELERATION = 0x0080;
        const USE_MOUSE_AIM_MODE      = 0x0100;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PitSvFlags: u32 {
        const LF_TIRE_CHANGE     = 0x01;
        const RF_TIRE_CHANGE     = 0x02;
        const LR_TIRE_CHANGE     = 0x04;
        const RR_TIRE_CHANGE     = 0x08;
        const FUEL_FILL          = 0x10;
        const WINDSHIELD_TEAROFF = 0x20;
        const FAST_REPAIR        = 0x40;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PaceFlags: u32 {
        const END_OF_LINE  = 0x0001;
        const FREE_PASS    = 0x0002;
        const WAVED_AROUND = 0x0004;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_warning_bits_match_sdk() {
        assert_eq!(EngineWarnings::WATER_TEMP_WARNING.bits(), 0x01);
        assert_eq!(EngineWarnings::REV_LIMITER_ACTIVE.bits(), 0x20);
        assert_eq!(EngineWarnings::OIL_TEMP_WARNING.bits(), 0x40);
    }

    #[test]
    fn session_flag_bits_match_sdk() {
        assert_eq!(Flags::CHECKERED.bits(), 0x0001);
        assert_eq!(Flags::CAUTION_WAVING.bits(), 0x8000);
        assert_eq!(Flags::BLACK.bits(), 0x010000);
        assert_eq!(Flags::REPAIR.bits(), 0x100000);
        assert_eq!(Flags::START_HIDDEN.bits(), 0x10000000);
        assert_eq!(Flags::START_GO.bits(), 0x80000000);
    }

    #[test]
    fn camera_and_pit_service_bits_match_sdk() {
        assert_eq!(CameraState::CAM_TOOL_ACTIVE.bits(), 0x0004);
        assert_eq!(CameraState::USE_MOUSE_AIM_MODE.bits(), 0x0100);
        assert_eq!(PitSvFlags::FUEL_FILL.bits(), 0x10);
        assert_eq!(PitSvFlags::FAST_REPAIR.bits(), 0x40);
        assert_eq!(PaceFlags::WAVED_AROUND.bits(), 0x0004);
    }

    #[test]
    fn flags_decode_from_raw_samples() {
        let raw = 0x0004u32 | 0x8000;
        let flags = Flags::from_bits_truncate(raw);
        assert!(flags.contains(Flags::GREEN));
        assert!(flags.contains(Flags::CAUTION_WAVING));
        assert!(!flags.contains(Flags::CHECKERED));
    }
}
