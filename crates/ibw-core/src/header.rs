//! Igor Binary Wave version 5 header layout.
//!
//! Layout follows Igor Technical Note #3: a 64-byte `BinHeader5` followed by
//! a 320-byte `WaveHeader5`, then the numeric data and the optional trailing
//! blocks (note text, extended units). All fields are little-endian.

use chrono::{DateTime, NaiveDateTime};

/// File format version written into `BinHeader5.version`.
pub const IBW_VERSION: i16 = 5;
/// Version written into `WaveHeader5.whVersion`.
pub const WAVE_HEADER_VERSION: i16 = 1;

/// Size of `BinHeader5` in bytes.
pub const BIN_HEADER_SIZE: usize = 64;
/// Size of `WaveHeader5` in bytes.
pub const WAVE_HEADER_SIZE: usize = 320;
/// The checksum covers `BinHeader5` + `WaveHeader5`.
pub const CHECKSUM_SPAN: usize = BIN_HEADER_SIZE + WAVE_HEADER_SIZE;

/// Maximum number of wave dimensions.
pub const MAX_DIMS: usize = 4;
/// Maximum wave name length in bytes (excluding the terminating NUL).
pub const MAX_WAVE_NAME: usize = 31;
/// Longest unit string that fits inline in the wave header; longer units go
/// into the extended dimension-unit blocks after the data.
pub const MAX_UNIT_CHARS: usize = 3;

// ─── Numeric type codes (WaveHeader5.type) ──────────────────────────────────

pub const NT_FP32: i16 = 2;
pub const NT_FP64: i16 = 4;

// ─── Field offsets within BinHeader5 ────────────────────────────────────────

pub const BH_VERSION: usize = 0;
pub const BH_CHECKSUM: usize = 2;
pub const BH_WFM_SIZE: usize = 4;
pub const BH_FORMULA_SIZE: usize = 8;
pub const BH_NOTE_SIZE: usize = 12;
pub const BH_DATA_EUNITS_SIZE: usize = 16;
pub const BH_DIM_EUNITS_SIZE: usize = 20; // [i32; 4]
pub const BH_DIM_LABELS_SIZE: usize = 36; // [i32; 4]
pub const BH_SINDICES_SIZE: usize = 52;

// ─── Field offsets within WaveHeader5 (relative to its start) ───────────────

pub const WH_CREATION_DATE: usize = 4;
pub const WH_MOD_DATE: usize = 8;
pub const WH_NPNTS: usize = 12;
pub const WH_TYPE: usize = 16;
pub const WH_VERSION: usize = 26;
pub const WH_BNAME: usize = 28; // [u8; 32], NUL-terminated
pub const WH_NDIM: usize = 68; // [i32; 4]
pub const WH_SFA: usize = 84; // [f64; 4], per-dimension step
pub const WH_SFB: usize = 116; // [f64; 4], per-dimension start
pub const WH_DATA_UNITS: usize = 148; // [u8; 4]
pub const WH_DIM_UNITS: usize = 152; // [[u8; 4]; 4]

/// Seconds from the Igor epoch (1904-01-01 00:00:00) to the Unix epoch.
pub const IGOR_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Convert a datetime to seconds since the Igor epoch.
///
/// Dates before 1904 clamp to zero; Igor stores the timestamp unsigned.
pub fn to_igor_seconds(dt: NaiveDateTime) -> u32 {
    let secs = dt.and_utc().timestamp() + IGOR_EPOCH_OFFSET;
    secs.clamp(0, u32::MAX as i64) as u32
}

/// Convert seconds since the Igor epoch back to a datetime.
pub fn from_igor_seconds(secs: u32) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs as i64 - IGOR_EPOCH_OFFSET, 0).map(|dt| dt.naive_utc())
}

/// Sum a buffer as consecutive little-endian i16 words, wrapping on overflow.
///
/// A valid IBW file has a zero checksum over the first `CHECKSUM_SPAN` bytes;
/// the writer stores the negated sum in `BinHeader5.checksum` to achieve this.
pub fn checksum(buf: &[u8]) -> i16 {
    let mut sum: i16 = 0;
    for pair in buf.chunks_exact(2) {
        sum = sum.wrapping_add(i16::from_le_bytes([pair[0], pair[1]]));
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_igor_epoch_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2022, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        let secs = to_igor_seconds(dt);
        assert_eq!(from_igor_seconds(secs), Some(dt));
    }

    #[test]
    fn test_igor_epoch_origin() {
        // 1904-01-01 00:00:00 is second zero
        let dt = from_igor_seconds(0).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(1904, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(to_igor_seconds(dt), 0);
    }

    #[test]
    fn test_checksum_wraps_to_zero() {
        let mut buf = vec![0u8; 8];
        buf[0..2].copy_from_slice(&1234i16.to_le_bytes());
        buf[2..4].copy_from_slice(&(-1234i16).to_le_bytes());
        assert_eq!(checksum(&buf), 0);

        buf[4..6].copy_from_slice(&7i16.to_le_bytes());
        assert_eq!(checksum(&buf), 7);
    }
}
