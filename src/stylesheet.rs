use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

/// Find the XSLT stylesheet referenced by an XML file.
///
/// The reference is discovered with a plain text scan for `href="….xsl"`, a
/// deliberate heuristic that avoids parsing just to read one attribute. It
/// will also match a commented-out occurrence of the pattern. The file is
/// decoded lossily; an unreadable file yields no result.
pub fn locate_stylesheet(xml_path: &Path) -> Option<PathBuf> {
    let bytes = fs::read(xml_path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    let href = Regex::new(r#"href="([^"]+\.xsl)""#).ok()?;
    let m = href.captures(&text)?;
    let resolved = xml_path.parent()?.join(m.get(1)?.as_str());
    resolved.exists().then_some(resolved)
}
