//! IBW reader: decode a version-5 Igor binary wave back into a
//! `BinaryWave5`. Only the numeric types the writer produces (NT_FP32 and
//! NT_FP64) are supported.

use byteorder::{ByteOrder, LittleEndian};
use ibw_core::header::*;
use ibw_core::wave::{BinaryWave5, WaveError};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("file truncated: need {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("unsupported IBW version {0} (only version 5 is supported)")]
    BadVersion(i16),
    #[error("header checksum failed (residual {0})")]
    BadChecksum(i16),
    #[error("unsupported numeric type {0} (only 32/64-bit float waves)")]
    UnsupportedType(i16),
    #[error("malformed wave: {0}")]
    Malformed(String),
    #[error(transparent)]
    Wave(#[from] WaveError),
}

/// Decode a complete IBW byte buffer.
pub fn decode_wave(buf: &[u8]) -> Result<BinaryWave5, ReadError> {
    if buf.len() < CHECKSUM_SPAN {
        return Err(ReadError::Truncated {
            expected: CHECKSUM_SPAN,
            got: buf.len(),
        });
    }

    let version = LittleEndian::read_i16(&buf[BH_VERSION..]);
    if version != IBW_VERSION {
        return Err(ReadError::BadVersion(version));
    }
    let residual = checksum(&buf[..CHECKSUM_SPAN]);
    if residual != 0 {
        return Err(ReadError::BadChecksum(residual));
    }

    let note_size = block_size(&buf[BH_NOTE_SIZE..], "noteSize")?;
    let data_eunits_size = block_size(&buf[BH_DATA_EUNITS_SIZE..], "dataEUnitsSize")?;
    let mut dim_eunits_size = [0usize; MAX_DIMS];
    for (d, size) in dim_eunits_size.iter_mut().enumerate() {
        *size = block_size(&buf[BH_DIM_EUNITS_SIZE + d * 4..], "dimEUnitsSize")?;
    }

    let wh = &buf[BIN_HEADER_SIZE..CHECKSUM_SPAN];
    let npnts = LittleEndian::read_i32(&wh[WH_NPNTS..]) as usize;
    let numeric_type = LittleEndian::read_i16(&wh[WH_TYPE..]);

    let name = read_cstring(&wh[WH_BNAME..WH_BNAME + MAX_WAVE_NAME + 1]);

    let mut shape = Vec::new();
    for d in 0..MAX_DIMS {
        let n = LittleEndian::read_i32(&wh[WH_NDIM + d * 4..]);
        if n <= 0 {
            break;
        }
        shape.push(n as usize);
    }
    if shape.is_empty() || shape.iter().product::<usize>() != npnts {
        return Err(ReadError::Malformed(format!(
            "dimension sizes {:?} do not account for {} points",
            shape, npnts
        )));
    }

    let esize = match numeric_type {
        NT_FP32 => 4,
        NT_FP64 => 8,
        other => return Err(ReadError::UnsupportedType(other)),
    };
    let data_end = CHECKSUM_SPAN + npnts * esize;
    if buf.len() < data_end {
        return Err(ReadError::Truncated {
            expected: data_end,
            got: buf.len(),
        });
    }
    let data = &buf[CHECKSUM_SPAN..data_end];

    // column-major strides, for mapping back to row-major
    let mut cstride = vec![1usize; shape.len()];
    for d in 1..shape.len() {
        cstride[d] = cstride[d - 1] * shape[d - 1];
    }

    let mut wave = match numeric_type {
        NT_FP32 => {
            let mut values = vec![0f32; npnts];
            for (j, slot) in values.iter_mut().enumerate() {
                let k = crate::writer::row_to_column_major(j, &shape, &cstride);
                *slot = f32::from_le_bytes([
                    data[k * 4],
                    data[k * 4 + 1],
                    data[k * 4 + 2],
                    data[k * 4 + 3],
                ]);
            }
            BinaryWave5::from_f32(&name, &shape, values)?
        }
        _ => {
            let mut values = vec![0f64; npnts];
            for (j, slot) in values.iter_mut().enumerate() {
                let k = crate::writer::row_to_column_major(j, &shape, &cstride);
                *slot = LittleEndian::read_f64(&data[k * 8..]);
            }
            BinaryWave5::from_f64(&name, &shape, values)?
        }
    };

    let stamp = LittleEndian::read_u32(&wh[WH_CREATION_DATE..]);
    if stamp != 0 {
        if let Some(dt) = from_igor_seconds(stamp) {
            wave.set_creation_time(dt);
        }
    }

    for d in 0..shape.len() {
        let step = LittleEndian::read_f64(&wh[WH_SFA + d * 8..]);
        let start = LittleEndian::read_f64(&wh[WH_SFB + d * 8..]);
        wave.set_axis_scale(d, start, step)?;
    }

    // trailing blocks: note, extended data unit, extended dimension units
    let mut cursor = data_end;
    let note = take_block(buf, &mut cursor, note_size)?;
    if !note.is_empty() {
        wave.set_note(&String::from_utf8_lossy(note));
    }

    let data_eunit = take_block(buf, &mut cursor, data_eunits_size)?;
    if !data_eunit.is_empty() {
        wave.set_data_unit(&String::from_utf8_lossy(data_eunit));
    } else {
        let inline = read_cstring(&wh[WH_DATA_UNITS..WH_DATA_UNITS + MAX_UNIT_CHARS + 1]);
        if !inline.is_empty() {
            wave.set_data_unit(&inline);
        }
    }

    for d in 0..shape.len() {
        let eunit = take_block(buf, &mut cursor, dim_eunits_size[d])?;
        if !eunit.is_empty() {
            wave.set_axis_unit(d, &String::from_utf8_lossy(eunit))?;
        } else {
            let off = WH_DIM_UNITS + d * 4;
            let inline = read_cstring(&wh[off..off + MAX_UNIT_CHARS + 1]);
            if !inline.is_empty() {
                wave.set_axis_unit(d, &inline)?;
            }
        }
    }

    Ok(wave)
}

/// Read a wave from a stream.
pub fn read_ibw<R: Read>(reader: &mut R) -> Result<BinaryWave5, ReadError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    decode_wave(&buf)
}

/// Read a wave from a file.
pub fn read_ibw_file<P: AsRef<Path>>(path: P) -> Result<BinaryWave5, ReadError> {
    let mut file = File::open(path)?;
    read_ibw(&mut file)
}

/// Read a trailing-block size field, rejecting negative values.
fn block_size(buf: &[u8], field: &str) -> Result<usize, ReadError> {
    let size = LittleEndian::read_i32(buf);
    usize::try_from(size).map_err(|_| ReadError::Malformed(format!("negative {field} ({size})")))
}

fn read_cstring(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn take_block<'a>(buf: &'a [u8], cursor: &mut usize, size: usize) -> Result<&'a [u8], ReadError> {
    let end = *cursor + size;
    if buf.len() < end {
        return Err(ReadError::Truncated {
            expected: end,
            got: buf.len(),
        });
    }
    let block = &buf[*cursor..end];
    *cursor = end;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::encode_wave;
    use chrono::NaiveDate;

    #[test]
    fn test_round_trip_f32() {
        let mut wave = BinaryWave5::from_f32(
            "map1",
            &[4, 3, 2, 5],
            (0..120).map(|i| i as f32 * 0.5).collect(),
        )
        .unwrap();
        wave.set_axis_unit(0, "um").unwrap();
        wave.set_axis_unit(3, "cm-1").unwrap();
        wave.set_axis_scale(0, -2.0, 0.1).unwrap();
        wave.set_creation_time(
            NaiveDate::from_ymd_opt(2022, 1, 2)
                .unwrap()
                .and_hms_opt(12, 34, 56)
                .unwrap(),
        );
        wave.set_note("<Channel informations>\n  Exposure Time: 1 s");

        let decoded = decode_wave(&encode_wave(&wave)).unwrap();
        assert_eq!(decoded, wave);
    }

    #[test]
    fn test_round_trip_f64_1d() {
        let wave = BinaryWave5::from_f64("axis", &[7], (0..7).map(f64::from).collect()).unwrap();
        let decoded = decode_wave(&encode_wave(&wave)).unwrap();
        assert_eq!(decoded, wave);
    }

    #[test]
    fn test_rejects_corrupted_checksum() {
        let wave = BinaryWave5::from_f32("w", &[2], vec![1.0, 2.0]).unwrap();
        let mut buf = encode_wave(&wave);
        buf[BIN_HEADER_SIZE + WH_NPNTS] ^= 0xFF;
        assert!(matches!(
            decode_wave(&buf),
            Err(ReadError::BadChecksum(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_version() {
        let wave = BinaryWave5::from_f32("w", &[2], vec![1.0, 2.0]).unwrap();
        let mut buf = encode_wave(&wave);
        buf[BH_VERSION] = 2;
        assert!(matches!(decode_wave(&buf), Err(ReadError::BadVersion(_))));
    }

    #[test]
    fn test_rejects_negative_block_size() {
        let wave = BinaryWave5::from_f32("w", &[2], vec![1.0, 2.0]).unwrap();
        let mut buf = encode_wave(&wave);
        LittleEndian::write_i32(&mut buf[BH_NOTE_SIZE..], -1);
        // rebalance so the header still sums to zero
        let residual = checksum(&buf[..CHECKSUM_SPAN]);
        let stored = LittleEndian::read_i16(&buf[BH_CHECKSUM..]);
        LittleEndian::write_i16(&mut buf[BH_CHECKSUM..], stored.wrapping_sub(residual));

        assert!(matches!(decode_wave(&buf), Err(ReadError::Malformed(_))));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let wave = BinaryWave5::from_f32("w", &[8], vec![0.0; 8]).unwrap();
        let buf = encode_wave(&wave);
        assert!(matches!(
            decode_wave(&buf[..buf.len() - 4]),
            Err(ReadError::Truncated { .. })
        ));
    }
}
