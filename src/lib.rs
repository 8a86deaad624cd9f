//! XML→HTML conversion by way of the XSLT stylesheet each document
//! references, with a markup fixup pass for the notice block the
//! stylesheets emit. Inputs are single XML files or ZIP archives.

pub mod archive;
pub mod convert;
pub mod error;
pub mod fixup;
pub mod picker;
pub mod stylesheet;
pub mod xml;
pub mod xslt;

pub use convert::{convert_to_dir, transform_file, view_in_browser};
pub use error::ConvertError;
