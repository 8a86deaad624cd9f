use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ConvertError, Result};
use crate::fixup::fix_markup;
use crate::stylesheet::locate_stylesheet;
use crate::xml;
use crate::xslt::Stylesheet;

/// Run one XML file through the whole pipeline and return the fixed HTML.
///
/// Locates the referenced stylesheet, parses both documents, applies the
/// transform, and post-processes the markup. Pure given fixed inputs:
/// repeated runs produce byte-identical output.
pub fn transform_file(xml_path: &Path) -> Result<String> {
    let xsl_path = locate_stylesheet(xml_path)
        .ok_or_else(|| ConvertError::StylesheetNotFound(xml_path.to_path_buf()))?;

    let xml_text = fs::read_to_string(xml_path)?;
    let xsl_text = fs::read_to_string(&xsl_path)?;
    let source = xml::parse_str(&xml_text)?;
    let stylesheet = Stylesheet::parse(&xml::parse_str(&xsl_text)?)?;

    let html = stylesheet.apply(&source)?;
    Ok(fix_markup(&html))
}

/// Convert one XML file and write `<stem>.html` into `out_dir`, overwriting
/// any existing file of that name.
pub fn convert_to_dir(xml_path: &Path, out_dir: &Path) -> Result<PathBuf> {
    info!("converting {}", xml_path.display());
    let html = transform_file(xml_path)?;
    let out_path = out_dir.join(format!("{}.html", stem_of(xml_path)));
    fs::write(&out_path, html)?;
    info!("wrote {}", out_path.display());
    Ok(out_path)
}

/// Convert one XML file into `<stem>_view.html` in the OS temp directory and
/// open it with the default browser handler. The file must outlive this
/// process for the browser to load it, so it is never deleted here.
pub fn view_in_browser(xml_path: &Path) -> Result<PathBuf> {
    let html = transform_file(xml_path)?;
    let out_path = env::temp_dir().join(format!("{}_view.html", stem_of(xml_path)));
    fs::write(&out_path, html)?;
    open::that(&out_path)?;
    Ok(out_path)
}

fn stem_of(path: &Path) -> String {
    path.file_stem().unwrap_or_default().to_string_lossy().into_owned()
}
