//! Output file name templates.
//!
//! The `-O` option takes a template that is expanded once per output file.
//! The scanner recognizes a closed set of `%` escapes and rejects anything
//! else:
//!
//! - `%a` / `%A` - the unit address in lowercase / uppercase hex
//! - `%f` / `%F` - the input file's base name without / with its extension
//! - `%b` - the bank index in decimal
//! - `%%` - a literal `%`

use anyhow::{bail, Result};

/// Values substituted into a template for one output file.
pub struct Substitutions<'a> {
    pub address: u64,
    pub bank: usize,
    /// Input file base name without directory or extension (`%f`).
    pub stem: &'a str,
    /// Input file base name without directory (`%F`).
    pub file_name: &'a str,
}

/// Expand a template for one output file.
pub fn expand(template: &str, subst: &Substitutions) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => out.push_str(&format!("{:x}", subst.address)),
            Some('A') => out.push_str(&format!("{:X}", subst.address)),
            Some('f') => out.push_str(subst.stem),
            Some('F') => out.push_str(subst.file_name),
            Some('b') => out.push_str(&format!("{}", subst.bank)),
            Some('%') => out.push('%'),
            Some(c) => bail!("unknown escape '%{c}' in output file template"),
            None => bail!("output file template ends with an unfinished '%' escape"),
        }
    }
    Ok(out)
}

/// Split an input path into the `%f` and `%F` expansions.
///
/// Directory components are stripped according to the host convention:
/// on Windows both `/` and `\` separate, and a bare drive-letter prefix is
/// removed; elsewhere `\` and `:` are ordinary file name characters.
pub fn file_name_parts(input: &str) -> (&str, &str) {
    let file_name = base_name(input);
    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    (stem, file_name)
}

#[cfg(windows)]
fn base_name(input: &str) -> &str {
    let mut rest = input;
    if rest.len() >= 2 && rest.as_bytes()[0].is_ascii_alphabetic() && rest.as_bytes()[1] == b':' {
        rest = &rest[2..];
    }
    match rest.rfind(['/', '\\']) {
        Some(sep) => &rest[sep + 1..],
        None => rest,
    }
}

#[cfg(not(windows))]
fn base_name(input: &str) -> &str {
    match input.rfind('/') {
        Some(sep) => &input[sep + 1..],
        None => input,
    }
}
