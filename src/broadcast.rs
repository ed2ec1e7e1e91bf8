//! Broadcast command word encoding
//!
//! Control commands travel to the simulator as a registered window message
//! posted to `HWND_BROADCAST`. A command is four 16-bit fields packed into
//! the two message words:
//!
//! ```text
//! WPARAM = kind | (a << 16)
//! LPARAM = b    | (c << 16)
//! ```
//!
//! Everything here is pure; the posting syscall lives in the platform
//! module and is the only side effect.

use crate::{Result, SdkError};

/// Pack a command into the `(WPARAM, LPARAM)` pair.
pub const fn encode_command(kind: u16, a: u16, b: u16, c: u16) -> (u32, u32) {
    ((kind as u32) | ((a as u32) << 16), (b as u32) | ((c as u32) << 16))
}

/// Recover the four command fields from the message words.
pub const fn decode_command(wparam: u32, lparam: u32) -> (u16, u16, u16, u16) {
    (wparam as u16, (wparam >> 16) as u16, lparam as u16, (lparam >> 16) as u16)
}

/// Split a 32-bit payload into the `(b, c)` halves of the LPARAM word.
///
/// Commands that carry one full-width argument (replay frame numbers,
/// session times in milliseconds) spread it across both low-word fields so
/// the receiver sees the value intact in LPARAM.
pub const fn split_payload(value: u32) -> (u16, u16) {
    (value as u16, (value >> 16) as u16)
}

/// Fixed-point conversion for the force-feedback max-force command.
///
/// The simulator expects `round(value * 65536)`; the result saturates at
/// the field width.
pub fn ffb_fixed_point(value: f32) -> u16 {
    (value * 65536.0).round() as u16
}

/// Encode a car-number string for camera switching.
///
/// Leading zeros are significant to the simulator ("07" and "7" are
/// different cars), so they are folded into the integer as
/// `1000 * (digit_places + leading_zero_count)`. A number that is all
/// zeros counts one zero fewer, leaving plain "0" unpadded.
pub fn pad_car_num(num: &str) -> Result<i32> {
    let len = num.len();
    let mut zeros = len - num.trim_start_matches('0').len();
    if zeros > 0 && zeros == len {
        zeros -= 1;
    }
    let value: i32 = num.parse().map_err(|_| {
        SdkError::parse_error("Car number encoding", format!("Not a car number: {:?}", num))
    })?;
    if zeros > 0 {
        let places = if value > 99 {
            3
        } else if value > 9 {
            2
        } else {
            1
        };
        Ok(value + 1000 * (places + zeros as i32))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pit_command_word_layout() {
        // pit_command(fuel = 2, var = 100)
        let (wparam, lparam) = encode_command(9, 2, 100, 0);
        assert_eq!(wparam, 0x0002_0009);
        assert_eq!(lparam, 0x0000_0064);
    }

    #[test]
    fn ffb_command_word_layout() {
        let fixed = ffb_fixed_point(0.75);
        assert_eq!(fixed, 49152);
        let (wparam, lparam) = encode_command(11, fixed, 0, 0);
        assert_eq!(wparam, 0xC000_000B);
        assert_eq!(lparam, 0x0);
    }

    #[test]
    fn ffb_fixed_point_rounds_and_saturates() {
        assert_eq!(ffb_fixed_point(0.0), 0);
        assert_eq!(ffb_fixed_point(0.5), 32768);
        assert_eq!(ffb_fixed_point(0.999992), 65535);
        // past the field width the value clamps
        assert_eq!(ffb_fixed_point(2.0), u16::MAX);
    }

    #[test]
    fn split_payload_preserves_lparam() {
        let (b, c) = split_payload(0x0012_3456);
        assert_eq!(encode_command(4, 0, b, c).1, 0x0012_3456);
    }

    #[test]
    fn car_number_padding_rules() {
        assert_eq!(pad_car_num("007").unwrap(), 3007);
        assert_eq!(pad_car_num("07").unwrap(), 2007);
        assert_eq!(pad_car_num("7").unwrap(), 7);
        assert_eq!(pad_car_num("0").unwrap(), 0);
        assert_eq!(pad_car_num("00").unwrap(), 2000);
        assert_eq!(pad_car_num("011").unwrap(), 3011);
        assert_eq!(pad_car_num("1").unwrap(), 1);
        assert_eq!(pad_car_num("100").unwrap(), 100);
        assert_eq!(pad_car_num("010").unwrap(), 3010);
        assert!(pad_car_num("x7").is_err());
        assert!(pad_car_num("").is_err());
    }

    proptest! {
        #[test]
        fn command_words_round_trip(
            kind in any::<u16>(),
            a in any::<u16>(),
            b in any::<u16>(),
            c in any::<u16>()
        ) {
            let (wparam, lparam) = encode_command(kind, a, b, c);
            prop_assert_eq!(decode_command(wparam, lparam), (kind, a, b, c));
        }

        #[test]
        fn unpadded_numbers_encode_as_themselves(value in 1i32..999) {
            let text = value.to_string();
            prop_assert_eq!(pad_car_num(&text).unwrap(), value);
        }

        #[test]
        fn padded_numbers_stay_distinguishable(value in 1i32..99, zeros in 1usize..3) {
            // "07" vs "7" must encode differently
            let padded = format!("{}{}", "0".repeat(zeros), value);
            prop_assert_ne!(pad_car_num(&padded).unwrap(), pad_car_num(&value.to_string()).unwrap());
        }
    }
}
