//! Per-invocation conversion driver.
//!
//! Ties the stages together for one run: map every input file into memory,
//! decode its loadable segments, plan and validate every output file, and
//! encode them all. Only when the whole batch has been planned, validated
//! and encoded does anything get written, so a fatal error anywhere leaves
//! no partial output behind.

use std::collections::HashSet;
use std::fs::{self, File};

use anyhow::{bail, Context, Result};
use memmap2::Mmap;

use crate::config::Config;
use crate::{elf, plan};

/// Execute one invocation.
pub fn run(config: &Config) -> Result<()> {
    let mut mapped = Vec::new();
    for input in &config.inputs {
        let file = File::open(input).with_context(|| format!("{input}: cannot open"))?;
        let mmap =
            unsafe { Mmap::map(&file) }.with_context(|| format!("{input}: cannot read"))?;
        mapped.push(mmap);
    }
    let inputs: Vec<(&str, &[u8])> = config
        .inputs
        .iter()
        .map(String::as_str)
        .zip(mapped.iter().map(|mmap| &mmap[..]))
        .collect();

    for (path, bytes) in convert(config, &inputs)? {
        fs::write(&path, bytes).with_context(|| format!("cannot write output file '{path}'"))?;
    }
    Ok(())
}

/// Plan, validate and encode every output file of the run.
///
/// Nothing here touches the filesystem; the returned list pairs each
/// destination path with its fully encoded contents.
pub fn convert(config: &Config, inputs: &[(&str, &[u8])]) -> Result<Vec<(String, Vec<u8>)>> {
    let format = config.format();
    let mut written = HashSet::new();
    let mut outputs = Vec::new();

    for &(name, data) in inputs {
        let image = elf::parse(data).with_context(|| format!("{name}: invalid ELF file"))?;
        tracing::debug!(
            input = name,
            segments = image.segments.len(),
            entry = image.entry,
            "loaded ELF image"
        );

        for out in plan::plan_input(config, name, &image)? {
            if !written.insert(out.path.clone()) {
                bail!(
                    "output file '{}' would be written more than once by this command",
                    out.path
                );
            }
            plan::check_overlaps(name, &out)?;
            let bytes = format.encode(name, &out.units, image.entry, config.base)?;
            tracing::debug!(path = %out.path, bytes = bytes.len(), "encoded output file");
            outputs.push((out.path, bytes));
        }
    }
    Ok(outputs)
}
