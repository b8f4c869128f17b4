//! WISL Language Server Protocol (LSP) library
//!
//! Bridges editors to the external WISL analyzer: documents are tracked in
//! memory, handed to the analyzer on every change, and the analyzer's JSON
//! answer is published as diagnostics and served as code lenses.

pub mod analyzer;
pub mod capabilities;
pub mod client;
pub mod code_lens;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod logging;
pub mod server;
pub mod settings;
pub mod transport;
