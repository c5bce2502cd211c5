//! md2doc core — layered settings resolution and external-tool discovery.
//!
//! The md2doc editor exports markdown through two external binaries
//! (pandoc and wkhtmltopdf). This crate is the non-GUI core the editor
//! calls into: a settings store that resolves keys through typed, dynamic,
//! environment and bundled-resource tiers, and a discovery pipeline that
//! locates and validates those binaries.

pub mod detect;
pub mod error;
pub mod logging;
pub mod settings;
