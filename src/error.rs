//! Defines [`GeoVectorizeError`], representing all errors returned by this crate.

use std::path::PathBuf;

use arrow_schema::ArrowError;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GeoVectorizeError {
    /// [wkt] parser error
    #[error("WKT error: {0}")]
    WktStrError(&'static str),

    /// Geometry type without a vector encoding.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(&'static str),

    /// More coordinates than slots in the fixed-length sequence.
    #[error("Geometry with {num_points} points does not fit in a sequence of length {sequence_length}")]
    SequenceTooLong {
        num_points: usize,
        sequence_length: usize,
    },

    /// A required column is absent from the input table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column exists but holds an unexpected Arrow type.
    #[error("Incorrect type for column {0}: expected {1}")]
    IncorrectColumnType(String, &'static str),

    /// The input file does not exist and could not be fetched.
    #[error("Input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Returned when functionality is not yet available.
    #[error("Not yet implemented: {0}")]
    NotYetImplemented(String),

    /// A remote server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// [ArrowError]
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// [reqwest::Error]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// [zip::result::ZipError]
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),

    /// [ndarray_npy::WriteNpyError]
    #[error(transparent)]
    WriteNpyError(#[from] ndarray_npy::WriteNpyError),

    /// [ndarray_npy::ReadNpyError]
    #[error(transparent)]
    ReadNpyError(#[from] ndarray_npy::ReadNpyError),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, GeoVectorizeError>;
