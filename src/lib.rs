//! Vectorize pairs of WKT geometries into fixed-length tensors.
//!
//! Every geometry becomes a sequence of five-value vectors: a coordinate followed by the
//! render, stop and full-stop flags. A [`dataset::DatasetBuilder`] encodes rows of geometry
//! pairs with their intersection, distances and centroids, all sharing one sequence length,
//! and [`io::npz`] writes the result as a NumPy `.npz` archive.
//!
//! ```
//! use geovectorize::datatypes::GeoVector;
//! use geovectorize::vectorize::vectorize_two_wkts;
//!
//! let seq = vectorize_two_wkts("POINT (1 2)", "POINT (3 4)", 3).unwrap();
//! assert_eq!(seq.as_slice()[0], GeoVector::RingEnd { x: 1.0, y: 2.0 });
//! assert_eq!(seq.as_slice()[1], GeoVector::SequenceEnd { x: 3.0, y: 4.0 });
//! assert_eq!(seq.as_slice()[2], GeoVector::EndMarker);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use pipeline::{run, RunSummary};

pub mod config;
pub mod dataset;
pub mod datatypes;
pub mod error;
pub mod fetch;
pub mod io;
pub mod notify;
pub mod pipeline;
pub mod record;
pub mod sweep;
pub mod vectorize;
