//! IBW writer: serialize a `BinaryWave5` to the version-5 on-disk layout.
//!
//! Layout per Igor Technical Note #3:
//! `BinHeader5` (64 B) + `WaveHeader5` (320 B) + numeric data in column-major
//! order + note text + extended data/dimension unit strings. The checksum in
//! `BinHeader5` makes the first 384 bytes sum to zero as i16 words.

use byteorder::{ByteOrder, LittleEndian};
use ibw_core::header::*;
use ibw_core::wave::{BinaryWave5, WaveData};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Serialize a wave to a complete IBW byte buffer.
pub fn encode_wave(wave: &BinaryWave5) -> Vec<u8> {
    let data = encode_data(wave);
    let note = wave.note().as_bytes();

    // Units longer than the inline field are appended after the note.
    let data_eunit = extended_unit(wave.data_unit());
    let mut dim_eunits: [&[u8]; MAX_DIMS] = [&[]; MAX_DIMS];
    for d in 0..wave.ndim() {
        dim_eunits[d] = extended_unit(wave.axis_unit(d));
    }

    let total = CHECKSUM_SPAN
        + data.len()
        + note.len()
        + data_eunit.len()
        + dim_eunits.iter().map(|u| u.len()).sum::<usize>();
    let mut buf = vec![0u8; CHECKSUM_SPAN];
    buf.reserve(total - CHECKSUM_SPAN);

    write_bin_header(&mut buf, data.len(), note.len(), data_eunit, &dim_eunits);
    write_wave_header(&mut buf, wave);

    let sum = checksum(&buf[..CHECKSUM_SPAN]);
    LittleEndian::write_i16(&mut buf[BH_CHECKSUM..BH_CHECKSUM + 2], sum.wrapping_neg());

    buf.extend_from_slice(&data);
    buf.extend_from_slice(note);
    buf.extend_from_slice(data_eunit);
    for unit in &dim_eunits {
        buf.extend_from_slice(unit);
    }
    buf
}

/// Write a wave to a stream.
pub fn write_ibw<W: Write>(writer: &mut W, wave: &BinaryWave5) -> Result<(), WriteError> {
    writer.write_all(&encode_wave(wave))?;
    Ok(())
}

/// Write a wave to a file.
pub fn write_ibw_file<P: AsRef<Path>>(path: P, wave: &BinaryWave5) -> Result<(), WriteError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_ibw(&mut out, wave)?;
    out.flush()?;
    Ok(())
}

fn extended_unit(unit: &str) -> &[u8] {
    if unit.len() > MAX_UNIT_CHARS {
        unit.as_bytes()
    } else {
        &[]
    }
}

fn write_bin_header(
    buf: &mut [u8],
    data_len: usize,
    note_len: usize,
    data_eunit: &[u8],
    dim_eunits: &[&[u8]; MAX_DIMS],
) {
    LittleEndian::write_i16(&mut buf[BH_VERSION..], IBW_VERSION);
    // checksum filled in after both headers are complete
    LittleEndian::write_i32(&mut buf[BH_WFM_SIZE..], (WAVE_HEADER_SIZE + data_len) as i32);
    LittleEndian::write_i32(&mut buf[BH_NOTE_SIZE..], note_len as i32);
    LittleEndian::write_i32(&mut buf[BH_DATA_EUNITS_SIZE..], data_eunit.len() as i32);
    for d in 0..MAX_DIMS {
        LittleEndian::write_i32(
            &mut buf[BH_DIM_EUNITS_SIZE + d * 4..],
            dim_eunits[d].len() as i32,
        );
    }
}

fn write_wave_header(buf: &mut [u8], wave: &BinaryWave5) {
    let wh = &mut buf[BIN_HEADER_SIZE..CHECKSUM_SPAN];

    let stamp = wave.creation_time().map_or(0, to_igor_seconds);
    LittleEndian::write_u32(&mut wh[WH_CREATION_DATE..], stamp);
    LittleEndian::write_u32(&mut wh[WH_MOD_DATE..], stamp);
    LittleEndian::write_i32(&mut wh[WH_NPNTS..], wave.npnts() as i32);

    let numeric_type = match wave.data() {
        WaveData::Float32(_) => NT_FP32,
        WaveData::Float64(_) => NT_FP64,
    };
    LittleEndian::write_i16(&mut wh[WH_TYPE..], numeric_type);
    LittleEndian::write_i16(&mut wh[WH_VERSION..], WAVE_HEADER_VERSION);

    let name = wave.name().as_bytes();
    wh[WH_BNAME..WH_BNAME + name.len()].copy_from_slice(name);

    for d in 0..wave.ndim() {
        LittleEndian::write_i32(&mut wh[WH_NDIM + d * 4..], wave.shape()[d] as i32);

        let (start, step) = wave.axis_scale(d);
        LittleEndian::write_f64(&mut wh[WH_SFA + d * 8..], step);
        LittleEndian::write_f64(&mut wh[WH_SFB + d * 8..], start);

        let unit = wave.axis_unit(d).as_bytes();
        if !unit.is_empty() && unit.len() <= MAX_UNIT_CHARS {
            wh[WH_DIM_UNITS + d * 4..WH_DIM_UNITS + d * 4 + unit.len()].copy_from_slice(unit);
        }
    }
    // Igor defaults: unit scaling for unused dimensions
    for d in wave.ndim()..MAX_DIMS {
        LittleEndian::write_f64(&mut wh[WH_SFA + d * 8..], 1.0);
    }

    let data_unit = wave.data_unit().as_bytes();
    if !data_unit.is_empty() && data_unit.len() <= MAX_UNIT_CHARS {
        wh[WH_DATA_UNITS..WH_DATA_UNITS + data_unit.len()].copy_from_slice(data_unit);
    }
}

/// Flatten the wave's row-major data into Igor's column-major byte order
/// (first dimension varies fastest).
fn encode_data(wave: &BinaryWave5) -> Vec<u8> {
    let shape = wave.shape();
    let esize = wave.data().element_size();
    let mut buf = vec![0u8; wave.npnts() * esize];

    // strides of each dimension in the column-major output
    let mut cstride = vec![1usize; shape.len()];
    for d in 1..shape.len() {
        cstride[d] = cstride[d - 1] * shape[d - 1];
    }

    match wave.data() {
        WaveData::Float32(values) => {
            for (j, &val) in values.iter().enumerate() {
                let k = row_to_column_major(j, shape, &cstride);
                buf[k * 4..k * 4 + 4].copy_from_slice(&val.to_le_bytes());
            }
        }
        WaveData::Float64(values) => {
            for (j, &val) in values.iter().enumerate() {
                let k = row_to_column_major(j, shape, &cstride);
                buf[k * 8..k * 8 + 8].copy_from_slice(&val.to_le_bytes());
            }
        }
    }
    buf
}

/// Map a row-major flat index to its column-major position.
pub(crate) fn row_to_column_major(j: usize, shape: &[usize], cstride: &[usize]) -> usize {
    let mut rem = j;
    let mut k = 0;
    for d in (0..shape.len()).rev() {
        k += (rem % shape[d]) * cstride[d];
        rem /= shape[d];
    }
    k
}
