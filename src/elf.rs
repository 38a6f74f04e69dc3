//! Loadable-segment reader for ELF images.
//!
//! Decodes the ELF header and program header table of an ELF32 or ELF64
//! file of either endianness, using the `object` crate's typed ELF views.
//! Only PT_LOAD entries are of interest; section headers, symbols and
//! relocations are never touched.

use anyhow::{bail, Result};
use object::elf::{FileHeader32, FileHeader64, PT_LOAD};
use object::read::elf::{FileHeader, ProgramHeader};
use object::read::FileKind;
use object::Endianness;

/// One loadable segment of an input image.
///
/// `data` borrows the file-resident bytes (`p_filesz` of them) straight
/// from the mapped input; `pad` is the zero-initialized tail the segment
/// occupies in memory beyond that (`p_memsz - p_filesz`).
#[derive(Debug)]
pub struct Segment<'data> {
    pub physical_address: u64,
    pub virtual_address: u64,
    pub data: &'data [u8],
    pub pad: u64,
}

/// The decoded image: its loadable segments, in program header table
/// order, and the entry point (0 if unused).
#[derive(Debug)]
pub struct Image<'data> {
    pub segments: Vec<Segment<'data>>,
    pub entry: u64,
}

/// Decode the loadable segments of an ELF file.
pub fn parse(data: &[u8]) -> Result<Image<'_>> {
    match FileKind::parse(data)? {
        FileKind::Elf32 => parse_file::<FileHeader32<Endianness>>(data),
        FileKind::Elf64 => parse_file::<FileHeader64<Endianness>>(data),
        _ => bail!("not an ELF file"),
    }
}

fn parse_file<Elf: FileHeader>(data: &[u8]) -> Result<Image<'_>> {
    let header = Elf::parse(data)?;
    let endian = header.endian()?;
    let phdrs = header.program_headers(endian, data)?;
    if phdrs.is_empty() {
        bail!(
            "no program header table found (elf2bin only works on ELF \
             executables or shared libraries, not relocatable object files)"
        );
    }

    let mut segments = Vec::new();
    for phdr in phdrs {
        if phdr.p_type(endian) != PT_LOAD {
            continue;
        }
        let Ok(file_bytes) = phdr.data(endian, data) else {
            bail!("segment data extends outside the file");
        };
        let filesz: u64 = phdr.p_filesz(endian).into();
        let memsz: u64 = phdr.p_memsz(endian).into();
        segments.push(Segment {
            physical_address: phdr.p_paddr(endian).into(),
            virtual_address: phdr.p_vaddr(endian).into(),
            data: file_bytes,
            pad: memsz.saturating_sub(filesz),
        });
    }

    Ok(Image {
        segments,
        entry: header.e_entry(endian).into(),
    })
}
