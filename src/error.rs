use std::path::PathBuf;

use thiserror::Error;

/// Error type shared by every stage of the conversion pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no resolvable stylesheet reference in {}", .0.display())]
    StylesheetNotFound(PathBuf),
    #[error("xml parse error: {0}")]
    Parse(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for ConvertError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
