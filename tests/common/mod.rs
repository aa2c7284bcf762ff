#![allow(dead_code)]

use dataflash::formats::format_width;
use dataflash::model::{FMT_TYPE, HEAD1, HEAD2};

pub const FMTU_TYPE: u8 = 129;
pub const GPS_TYPE: u8 = 130;
pub const ATT_TYPE: u8 = 131;

/// Assembles a DataFlash log in memory, record by record.
#[derive(Default)]
pub struct LogBuilder {
    bytes: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// FMT record with the record length derived from the format string.
    pub fn fmt(self, type_id: u8, name: &str, format: &str, columns: &str) -> Self {
        let length = 3 + format.bytes().map(format_width).sum::<usize>();
        let length = u8::try_from(length).unwrap();
        self.fmt_with_len(type_id, length, name, format, columns)
    }

    pub fn fmt_with_len(self, type_id: u8, length: u8, name: &str, format: &str, columns: &str) -> Self {
        let mut body = vec![type_id, length];
        body.extend(padded(name, 4));
        body.extend(padded(format, 16));
        body.extend(padded(columns, 64));
        self.record(FMT_TYPE, &body)
    }

    /// The FMT record describing FMT itself, as real logs start with.
    pub fn fmt_self(self) -> Self {
        self.fmt(FMT_TYPE, "FMT", "BBnNZ", "Type,Length,Name,Format,Columns")
    }

    pub fn fmtu_definition(self) -> Self {
        self.fmt(FMTU_TYPE, "FMTU", "QBNN", "TimeUS,FmtType,UnitIds,MultIds")
    }

    pub fn fmtu(self, time_us: u64, target: u8, units: &str, mults: &str) -> Self {
        let body = Body::new().u64(time_us).u8(target).str(units, 16).str(mults, 16).build();
        self.record(FMTU_TYPE, &body)
    }

    pub fn record(mut self, type_id: u8, body: &[u8]) -> Self {
        self.bytes.extend([HEAD1, HEAD2, type_id]);
        self.bytes.extend_from_slice(body);
        self
    }

    /// Raw bytes outside any record.
    pub fn garbage(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Little endian record body.
#[derive(Default)]
pub struct Body {
    bytes: Vec<u8>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.bytes.push(v);
        self
    }

    pub fn i16(mut self, v: i16) -> Self {
        self.bytes.extend(v.to_le_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.bytes.extend(v.to_le_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.bytes.extend(v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.bytes.extend(v.to_le_bytes());
        self
    }

    pub fn str(mut self, s: &str, width: usize) -> Self {
        self.bytes.extend(padded(s, width));
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

fn padded(s: &str, width: usize) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.resize(width, 0);
    bytes
}

pub fn gps_body(time_us: u64, status: u8, alt_cm: i32, lat: i32) -> Vec<u8> {
    Body::new().u64(time_us).u8(status).i32(alt_cm).i32(lat).build()
}

pub fn att_body(time_us: u64, roll_cd: i16, pitch_cd: i16) -> Vec<u8> {
    Body::new().u64(time_us).i16(roll_cd).i16(pitch_cd).build()
}

/// Definitions for FMT, FMTU, GPS and ATT, plus the GPS unit overlay.
///
/// Five records, so the first data record has sequence number 6.
pub fn preamble() -> LogBuilder {
    LogBuilder::new()
        .fmt_self()
        .fmtu_definition()
        .fmt(GPS_TYPE, "GPS", "QBiL", "TimeUS,Status,Alt,Lat")
        .fmt(ATT_TYPE, "ATT", "Qcc", "TimeUS,Roll,Pitch")
        .fmtu(500_000, GPS_TYPE, "s-mD", "F-BG")
}

/// `preamble()` followed by GPS, ATT, GPS, ATT, GPS at 1.0, 1.1, 2.0, 2.1 and 3.0 seconds.
pub fn flight_log() -> Vec<u8> {
    preamble()
        .record(GPS_TYPE, &gps_body(1_000_000, 3, 1234, 377_487_360))
        .record(ATT_TYPE, &att_body(1_100_000, -1000, 250))
        .record(GPS_TYPE, &gps_body(2_000_000, 3, 1300, 377_487_400))
        .record(ATT_TYPE, &att_body(2_100_000, -900, 300))
        .record(GPS_TYPE, &gps_body(3_000_000, 4, 1420, 377_487_450))
        .build()
}
