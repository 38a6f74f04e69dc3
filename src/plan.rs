//! Per-invocation planning.
//!
//! This module turns the loadable segments of one input image into the
//! output files the run will produce: it applies `--segments` selection and
//! `--physical`/`--virtual` address resolution, materializes `--zi`
//! padding, splits units across interleave banks, routes every unit to a
//! destination path, and validates that the units sharing one output file
//! occupy disjoint address ranges.

use std::borrow::Cow;

use anyhow::{bail, Result};

use crate::config::{Banks, Config, OutputSpec};
use crate::elf::Image;
use crate::template::{self, Substitutions};

/// One address-tagged byte range bound for an output file: a segment, or
/// one interleave bank of a segment.
pub struct Unit<'data> {
    pub address: u64,
    pub bytes: Cow<'data, [u8]>,
    /// Zero-init tail length not materialized into `bytes`. Nonzero only
    /// when `--zi` is off; it still occupies address space, so overlap
    /// checking counts it.
    pub reserve: u64,
}

impl Unit<'_> {
    /// End of the half-open address range this unit occupies in memory.
    pub fn end(&self) -> u64 {
        self.address + self.bytes.len() as u64 + self.reserve
    }
}

/// A single destination file and the units routed into it, sorted by
/// address when the format combines several units into one stream.
pub struct OutputFile<'data> {
    pub path: String,
    pub units: Vec<Unit<'data>>,
}

/// Compute the output files for one input image.
pub fn plan_input<'data>(
    config: &Config,
    input_name: &str,
    image: &Image<'data>,
) -> Result<Vec<OutputFile<'data>>> {
    let (stem, file_name) = template::file_name_parts(input_name);
    let resolved = resolve_units(config, image);

    // One list of units per bank; without --banks there is a single bank.
    let banked: Vec<Vec<Unit>> = match config.banks {
        Some(banks) => {
            let mut per_bank: Vec<Vec<Unit>> = (0..banks.count).map(|_| Vec::new()).collect();
            for unit in resolved {
                for (bank, split) in split_unit(unit, banks).into_iter().enumerate() {
                    per_bank[bank].push(split);
                }
            }
            per_bank
        }
        None => vec![resolved],
    };

    let format = config.format();
    let mut outputs = Vec::new();
    for (bank, mut units) in banked.into_iter().enumerate() {
        if units.is_empty() {
            continue;
        }
        if format.combines() {
            units.sort_by_key(|unit| unit.address);
            let subst = Substitutions {
                address: units[0].address,
                bank,
                stem,
                file_name,
            };
            outputs.push(OutputFile {
                path: route(config, &subst)?,
                units,
            });
        } else {
            for unit in units {
                let subst = Substitutions {
                    address: unit.address,
                    bank,
                    stem,
                    file_name,
                };
                outputs.push(OutputFile {
                    path: route(config, &subst)?,
                    units: vec![unit],
                });
            }
        }
    }
    Ok(outputs)
}

/// Check that the units of one output file occupy pairwise disjoint
/// address ranges. Units must already be sorted by address; abutting
/// ranges are fine.
pub fn check_overlaps(input_name: &str, out: &OutputFile) -> Result<()> {
    for pair in out.units.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if second.address < first.end() {
            bail!(
                "{}: segments at address ranges [{:#x},{:#x}) and [{:#x},{:#x}) overlap",
                input_name,
                first.address,
                first.end(),
                second.address,
                second.end()
            );
        }
    }
    Ok(())
}

/// Apply segment selection, address resolution and `--zi` padding.
fn resolve_units<'data>(config: &Config, image: &Image<'data>) -> Vec<Unit<'data>> {
    let mut units = Vec::new();
    for seg in &image.segments {
        let address = if config.virt {
            seg.virtual_address
        } else {
            seg.physical_address
        };
        if let Some(wanted) = &config.segments {
            if !wanted.contains(&address) {
                tracing::debug!(address, "segment not selected, skipping");
                continue;
            }
        }
        let (bytes, reserve) = if config.zi {
            let mut bytes = seg.data.to_vec();
            bytes.resize(seg.data.len() + seg.pad as usize, 0);
            (Cow::Owned(bytes), 0)
        } else {
            (Cow::Borrowed(seg.data), seg.pad)
        };
        units.push(Unit {
            address,
            bytes,
            reserve,
        });
    }
    units
}

/// Partition one unit into interleave banks: the byte at offset `i` goes
/// to bank `(i mod W*N) / W`. Every bank keeps the parent's address.
fn split_unit<'data>(unit: Unit<'data>, banks: Banks) -> Vec<Unit<'data>> {
    let cycle = banks.width * banks.count;
    let mut streams: Vec<Vec<u8>> = vec![Vec::new(); banks.count];
    for (i, &byte) in unit.bytes.iter().enumerate() {
        streams[(i % cycle) / banks.width].push(byte);
    }

    let data_len = unit.bytes.len() as u64;
    let total_len = data_len + unit.reserve;
    streams
        .into_iter()
        .enumerate()
        .map(|(bank, bytes)| Unit {
            address: unit.address,
            reserve: bank_share(total_len, banks, bank) - bank_share(data_len, banks, bank),
            bytes: Cow::Owned(bytes),
        })
        .collect()
}

/// How many of the first `len` bytes of a stream land in `bank`.
fn bank_share(len: u64, banks: Banks, bank: usize) -> u64 {
    let width = banks.width as u64;
    let cycle = width * banks.count as u64;
    let lo = bank as u64 * width;
    len / cycle * width + (len % cycle).clamp(lo, lo + width) - lo
}

fn route(config: &Config, subst: &Substitutions) -> Result<String> {
    match config.output_spec() {
        OutputSpec::Explicit(path) => Ok(path.to_string()),
        OutputSpec::Template(template) => template::expand(template, subst),
    }
}
