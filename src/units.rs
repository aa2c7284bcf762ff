//! Unit and multiplier identifiers carried by FMTU records.
//!
//! Both tables follow `log_Units` and `log_Multipliers` in ArduPilot's `AP_Logger/LogStructure.h`.

/// Human readable unit name for a unit identifier. Unknown identifiers have an empty name.
pub fn unit_name(unit: u8) -> &'static str {
    match unit {
        b'-' => "", // no units e.g. Pi, or a string
        b'?' => "UNKNOWN",
        b'A' => "A",
        b'a' => "Ah",
        b'd' => "deg",
        b'b' => "B",
        b'B' => "B/s",
        b'k' => "deg/s",
        b'D' => "deglatitude",
        b'e' => "deg/s/s",
        b'E' => "rad/s",
        b'G' => "Gauss",
        b'h' => "degheading",
        b'i' => "A.s",
        b'J' => "W.s",
        b'l' => "l",
        b'L' => "rad/s/s",
        b'm' => "m",
        b'n' => "m/s",
        b'o' => "m/s/s",
        b'O' => "degC",
        b'%' => "%",
        b'S' => "satellites",
        b's' => "s",
        b't' => "N.m",
        b'q' => "rpm",
        b'r' => "rad",
        b'U' => "deglongitude",
        b'u' => "ppm",
        b'v' => "V",
        b'P' => "Pa",
        b'w' => "Ohm",
        b'W' => "Watt",
        b'X' => "W.h",
        b'y' => "l/s",
        b'Y' => "us",
        b'z' => "Hz",
        b'#' => "instance",
        _ => "",
    }
}

/// Scale factor for a multiplier identifier.
///
/// `'-'` means "do not scale" and has no factor. Unknown identifiers scale by 1.
pub fn multiplier(mult: u8) -> Option<f64> {
    Some(match mult {
        b'-' => return None,
        b'?' => 1.0,
        b'2' => 1e2,
        b'1' => 1e1,
        b'0' => 1e0,
        b'A' => 1e-1,
        b'B' => 1e-2,
        b'C' => 1e-3,
        b'D' => 1e-4,
        b'E' => 1e-5,
        b'F' => 1e-6,
        b'G' => 1e-7,
        b'H' => 1e-8,
        b'I' => 1e-9,
        b'!' => 3.6,  // ampere*second => milliampere*hour, km/h => m/s
        b'/' => 3600.0, // ampere*second => ampere*hour
        _ => 1.0,
    })
}

/// Multiplier identifiers that leave a value untouched.
pub(crate) fn is_identity_multiplier(mult: u8) -> bool {
    matches!(mult, b'-' | b'?' | b'0')
}
