//! Construction of minimal ELF images for tests.
//!
//! Builds just enough of an ELF file for the converter to consume: the
//! identification bytes, a header, a program header table and the raw
//! segment contents, with no section headers at all. All four
//! width/endianness combinations are supported so tests can cover every
//! decode path.

/// Description of one program header table entry to synthesize.
pub struct SegmentDesc {
    pub segtype: u32,
    pub paddr: u64,
    pub vaddr: u64,
    pub data: Vec<u8>,
    pub pad: u64,
}

impl SegmentDesc {
    /// A PT_LOAD segment whose virtual address equals `paddr`.
    pub fn new(paddr: u64, data: &[u8]) -> Self {
        Self {
            segtype: 1,
            paddr,
            vaddr: paddr,
            data: data.to_vec(),
            pad: 0,
        }
    }

    /// Set the zero-init padding (makes `p_memsz` exceed `p_filesz`).
    pub fn pad(mut self, pad: u64) -> Self {
        self.pad = pad;
        self
    }

    /// Give the segment a virtual address distinct from its physical one.
    pub fn vaddr(mut self, vaddr: u64) -> Self {
        self.vaddr = vaddr;
        self
    }

    /// Override the segment type (1 = PT_LOAD).
    pub fn segtype(mut self, segtype: u32) -> Self {
        self.segtype = segtype;
        self
    }
}

struct Emit {
    out: Vec<u8>,
    big_endian: bool,
    sixty_four: bool,
}

impl Emit {
    fn bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    fn u16(&mut self, v: u16) {
        let b = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        self.bytes(&b);
    }

    fn u32(&mut self, v: u32) {
        let b = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        self.bytes(&b);
    }

    fn u64(&mut self, v: u64) {
        let b = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        self.bytes(&b);
    }

    /// One natural-width (Elf32_Addr / Elf64_Addr style) field.
    fn word(&mut self, v: u64) {
        if self.sixty_four {
            self.u64(v);
        } else {
            self.u32(v as u32);
        }
    }
}

/// Build an ELF image in memory with the given segments and entry point.
pub fn make_elf(
    big_endian: bool,
    sixty_four: bool,
    segments: &[SegmentDesc],
    entry: u64,
) -> Vec<u8> {
    let (ehsize, phentsize) = if sixty_four { (64u64, 56u64) } else { (52u64, 32u64) };
    let mut e = Emit {
        out: Vec::new(),
        big_endian,
        sixty_four,
    };

    // e_ident
    e.bytes(&[0x7F, b'E', b'L', b'F']);
    e.bytes(&[
        if sixty_four { 2 } else { 1 },
        if big_endian { 2 } else { 1 },
        1, // EV_CURRENT
    ]);
    e.bytes(&[0; 9]);

    e.u16(2); // e_type: ET_EXEC
    e.u16(if sixty_four { 183 } else { 40 }); // EM_AARCH64 / EM_ARM
    e.u32(1); // e_version
    e.word(entry);
    e.word(ehsize); // e_phoff: table follows the header directly
    e.word(0); // e_shoff
    e.u32(0); // e_flags
    e.u16(ehsize as u16);
    e.u16(phentsize as u16);
    e.u16(segments.len() as u16);
    e.u16(0); // e_shentsize
    e.u16(0); // e_shnum
    e.u16(0); // e_shstrndx

    let mut offset = ehsize + segments.len() as u64 * phentsize;
    for seg in segments {
        e.u32(seg.segtype);
        if sixty_four {
            e.u32(0); // p_flags sits here in ELF64
            e.word(offset);
            e.word(seg.vaddr);
            e.word(seg.paddr);
            e.word(seg.data.len() as u64);
            e.word(seg.data.len() as u64 + seg.pad);
            e.word(0); // p_align
        } else {
            e.word(offset);
            e.word(seg.vaddr);
            e.word(seg.paddr);
            e.word(seg.data.len() as u64);
            e.word(seg.data.len() as u64 + seg.pad);
            e.u32(0); // p_flags
            e.word(0); // p_align
        }
        offset += seg.data.len() as u64;
    }

    for seg in segments {
        e.bytes(&seg.data);
    }
    e.out
}
