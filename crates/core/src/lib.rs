//! Core library for pdfoutline
//!
//! This crate is the **Functional Core** of pdfoutline: it turns the flat
//! stream of positioned text fragments decoded from a PDF into a document
//! title and a leveled outline. It performs no I/O; the `pdf` crate supplies
//! fragments and the `pdfoutline` binary handles files and output.
//!
//! # Module Organization
//!
//! - [`fragment`]: The fragment model shared with the decoder
//! - [`config`]: Heuristic thresholds with documented defaults
//! - [`text`]: Whitespace and numbering cleanup
//! - [`heading`]: Heading classification, leveling, multiline merge and noise filtering
//! - [`title`]: Page-1 title candidate scoring
//! - [`outline`]: Assembly of the per-document result record
//!
//! # Example Usage
//!
//! ```rust
//! use pdfoutline_core::config::HeuristicConfig;
//! use pdfoutline_core::fragment::{BoundingBox, Fragment};
//! use pdfoutline_core::outline::build_outline;
//!
//! let fragments = vec![Fragment::new(
//!     "Caching in Practice",
//!     24.0,
//!     "Helvetica-Bold",
//!     BoundingBox::new(72.0, 40.0, 320.0, 64.0),
//!     1,
//! )];
//!
//! let outline = build_outline(&fragments, &HeuristicConfig::default());
//! assert_eq!(outline.title, "Caching in Practice");
//! ```

pub mod config;
pub mod fragment;
pub mod heading;
pub mod outline;
pub mod text;
pub mod title;
