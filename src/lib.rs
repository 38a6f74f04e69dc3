//! ELF to firmware image converter library.
//!
//! This library provides the core components for the `elf2bin` tool.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `elf`: Loadable-segment reader for ELF32/64 images.
//! - `plan`: Segment selection, bank interleaving, output routing and
//!   overlap validation.
//! - `template`: The `-O` output file name template language.
//! - `encode`: The four output format encoders.
//! - `convert`: The per-invocation conversion driver.

pub mod config;
pub mod convert;
pub mod elf;
pub mod encode;
pub mod plan;
pub mod template;

#[cfg(test)]
pub mod testelf;
