//! Output format encoders.
//!
//! Each encoder turns one output file's worth of address-sorted,
//! non-overlapping units into the final byte stream. Encoding is done
//! entirely in memory, so the range checks inside the checksummed formats
//! run before any file is created.

use anyhow::{bail, Result};

use crate::config::Format;
use crate::plan::Unit;

/// Data bytes per Intel HEX / S-record line.
const RECORD_BYTES: usize = 16;

impl Format {
    /// Encode one output file. `units` must be sorted by address for the
    /// combining formats; `entry` is the input file's entry point and
    /// `base` the explicit `--base` address, if any.
    pub fn encode(
        self,
        input_name: &str,
        units: &[Unit],
        entry: u64,
        base: Option<u64>,
    ) -> Result<Vec<u8>> {
        match self {
            Format::Bin => Ok(encode_bin(units)),
            Format::BinCombined => encode_bin_combined(input_name, units, base),
            Format::Vhx => Ok(to_vhx(&encode_bin(units))),
            Format::VhxCombined => Ok(to_vhx(&encode_bin_combined(input_name, units, base)?)),
            Format::Ihex => encode_ihex(input_name, units, entry),
            Format::Srec => encode_srec(input_name, units, entry),
        }
    }
}

/// Raw bytes with no address framing. Non-combining formats route one
/// unit per file, so this is that unit's bytes unmodified.
fn encode_bin(units: &[Unit]) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in units {
        out.extend_from_slice(&unit.bytes);
    }
    out
}

/// One contiguous stream from the base address, with gaps zero-filled.
fn encode_bin_combined(input_name: &str, units: &[Unit], base: Option<u64>) -> Result<Vec<u8>> {
    let Some(first) = units.first() else {
        return Ok(Vec::new());
    };
    let base = base.unwrap_or(first.address);
    if base > first.address {
        bail!(
            "{}: first segment is at address {:#x}, below the specified base address {:#x}",
            input_name,
            first.address,
            base
        );
    }

    let mut out = Vec::new();
    let mut cursor = base;
    for unit in units {
        out.resize(out.len() + (unit.address - cursor) as usize, 0);
        out.extend_from_slice(&unit.bytes);
        cursor = unit.address + unit.bytes.len() as u64;
    }
    Ok(out)
}

/// Render a byte stream as VHX: two uppercase hex digits per line.
fn to_vhx(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 3);
    for byte in data {
        out.extend_from_slice(format!("{byte:02X}\n").as_bytes());
    }
    out
}

/// Intel HEX. Data records carry up to 16 bytes, chunked from each unit's
/// start; an extended-linear-address record precedes any chunk whose high
/// 16 address bits differ from the last value emitted (initially 0). A
/// start-linear-address record carries the entry point before EOF.
fn encode_ihex(input_name: &str, units: &[Unit], entry: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut high = 0u16;
    for unit in units {
        let mut offset = 0;
        while offset < unit.bytes.len() {
            let end = (offset + RECORD_BYTES).min(unit.bytes.len());
            let chunk = &unit.bytes[offset..end];
            let address = unit.address + offset as u64;
            if address > u32::MAX as u64 {
                bail!("{input_name}: data address does not fit in 32 bits");
            }
            let chunk_high = (address >> 16) as u16;
            if chunk_high != high {
                push_ihex_record(&mut out, 0, 0x04, &chunk_high.to_be_bytes());
                high = chunk_high;
            }
            push_ihex_record(&mut out, address as u16, 0x00, chunk);
            offset = end;
        }
    }

    if entry > u32::MAX as u64 {
        bail!("{input_name}: entry point does not fit in 32 bits");
    }
    push_ihex_record(&mut out, 0, 0x05, &(entry as u32).to_be_bytes());
    push_ihex_record(&mut out, 0, 0x01, &[]);
    Ok(out)
}

/// Append one `:LLAAAATT...CC` record. The checksum is the two's
/// complement of the sum of every byte after the colon.
fn push_ihex_record(out: &mut Vec<u8>, address: u16, kind: u8, data: &[u8]) {
    let mut line = format!(":{:02X}{address:04X}{kind:02X}", data.len());
    let mut sum = (data.len() as u8)
        .wrapping_add((address >> 8) as u8)
        .wrapping_add(address as u8)
        .wrapping_add(kind);
    for &byte in data {
        line.push_str(&format!("{byte:02X}"));
        sum = sum.wrapping_add(byte);
    }
    line.push_str(&format!("{:02X}\n", sum.wrapping_neg()));
    out.extend_from_slice(line.as_bytes());
}

/// Motorola S-records: S3 data records with 4-byte addresses, terminated
/// by an S7 record carrying the entry point.
fn encode_srec(input_name: &str, units: &[Unit], entry: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for unit in units {
        let mut offset = 0;
        while offset < unit.bytes.len() {
            let end = (offset + RECORD_BYTES).min(unit.bytes.len());
            let address = unit.address + offset as u64;
            if address > u32::MAX as u64 {
                bail!("{input_name}: data address does not fit in 32 bits");
            }
            push_srec_record(&mut out, '3', address as u32, &unit.bytes[offset..end]);
            offset = end;
        }
    }

    if entry > u32::MAX as u64 {
        bail!("{input_name}: entry point does not fit in 32 bits");
    }
    push_srec_record(&mut out, '7', entry as u32, &[]);
    Ok(out)
}

/// Append one S-record. The checksum is the one's complement of the sum
/// of the count, address and data bytes.
fn push_srec_record(out: &mut Vec<u8>, kind: char, address: u32, data: &[u8]) {
    let count = (4 + data.len() + 1) as u8;
    let mut line = format!("S{kind}{count:02X}{address:08X}");
    let mut sum = count;
    for byte in address.to_be_bytes() {
        sum = sum.wrapping_add(byte);
    }
    for &byte in data {
        line.push_str(&format!("{byte:02X}"));
        sum = sum.wrapping_add(byte);
    }
    line.push_str(&format!("{:02X}\n", !sum));
    out.extend_from_slice(line.as_bytes());
}
