//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for the converter
//! using `clap`, together with the small value parsers it needs: numeric
//! addresses, the `--segments` address list and the `WxN` bank interleaving
//! specification.

use clap::{ArgGroup, Parser};

/// Convert the loadable segments of an ELF executable into flashable
/// firmware images.
///
/// Reads the program header table of one or more ELF32/ELF64 files (either
/// endianness) and writes the PT_LOAD segments as raw binary, Intel HEX,
/// Motorola S-record or VHX output.
#[derive(Parser, Debug)]
#[command(name = "elf2bin", version, about, long_about = None)]
#[command(group(ArgGroup::new("fmt").required(true)))]
#[command(group(ArgGroup::new("dest").required(true)))]
pub struct Config {
    /// Address segments by their physical address (the default)
    #[arg(long)]
    pub physical: bool,

    /// Address segments by their virtual address instead
    #[arg(long = "virtual", conflicts_with = "physical")]
    pub virt: bool,

    /// Materialize each segment's zero-initialized padding as literal zero bytes
    #[arg(long)]
    pub zi: bool,

    /// Base address for combined binary output (defaults to the lowest segment address)
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    pub base: Option<u64>,

    /// Convert only the segments at these addresses
    #[arg(
        long,
        value_name = "ADDR[,ADDR...]",
        value_delimiter = ',',
        value_parser = parse_address
    )]
    pub segments: Option<Vec<u64>>,

    /// Interleave each segment across N banks of W bytes, given as WxN
    #[arg(long, value_name = "WxN", value_parser = parse_banks)]
    pub banks: Option<Banks>,

    /// Write each segment to its own raw binary file
    #[arg(long, group = "fmt")]
    pub bin: bool,

    /// Combine all segments into one raw binary file, zero-filling gaps
    #[arg(long, group = "fmt")]
    pub bincombined: bool,

    /// Write one Intel HEX file per input file
    #[arg(long, group = "fmt")]
    pub ihex: bool,

    /// Write one Motorola S-record file per input file
    #[arg(long, group = "fmt")]
    pub srec: bool,

    /// Write each segment as one byte per line of uppercase hex
    #[arg(long, group = "fmt")]
    pub vhx: bool,

    /// Combine all segments into one VHX file, zero-filling gaps
    #[arg(long, group = "fmt")]
    pub vhxcombined: bool,

    /// Explicit output file name, valid when exactly one file is written
    #[arg(short = 'o', group = "dest", value_name = "PATH")]
    pub output: Option<String>,

    /// Output file name template with %a/%A/%f/%F/%b/%% placeholders
    #[arg(short = 'O', group = "dest", value_name = "TEMPLATE")]
    pub output_template: Option<String>,

    /// Input ELF executables
    #[arg(required = true, value_name = "INPUT.elf")]
    pub inputs: Vec<String>,
}

/// The output format, selected once per run by the format flag group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bin,
    BinCombined,
    Ihex,
    Srec,
    Vhx,
    VhxCombined,
}

impl Format {
    /// Whether this format merges all of an input file's segments into one
    /// output stream, rather than writing one file per segment.
    pub fn combines(self) -> bool {
        !matches!(self, Format::Bin | Format::Vhx)
    }
}

/// How output file paths are chosen.
pub enum OutputSpec<'a> {
    Explicit(&'a str),
    Template(&'a str),
}

impl Config {
    pub fn format(&self) -> Format {
        if self.bin {
            Format::Bin
        } else if self.bincombined {
            Format::BinCombined
        } else if self.ihex {
            Format::Ihex
        } else if self.srec {
            Format::Srec
        } else if self.vhx {
            Format::Vhx
        } else {
            Format::VhxCombined
        }
    }

    pub fn output_spec(&self) -> OutputSpec<'_> {
        match (&self.output, &self.output_template) {
            (Some(path), _) => OutputSpec::Explicit(path),
            (_, Some(template)) => OutputSpec::Template(template),
            (None, None) => unreachable!("clap requires one of -o/-O"),
        }
    }
}

/// A `--banks` specification: N banks of W bytes each, filled cyclically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banks {
    pub width: usize,
    pub count: usize,
}

/// Parse an address as `0x` hexadecimal or decimal.
pub fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid address '{s}'"))
}

/// Parse a bank interleaving spec of the form `WxN`, e.g. `4x2`.
pub fn parse_banks(s: &str) -> Result<Banks, String> {
    let err = || format!("invalid bank specification '{s}' (expected WxN, e.g. 4x2)");
    let (width, count) = s.split_once('x').ok_or_else(err)?;
    let width = width.parse().map_err(|_| err())?;
    let count = count.parse().map_err(|_| err())?;
    if width == 0 || count == 0 {
        return Err(err());
    }
    Ok(Banks { width, count })
}
