use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::Result;

/// A ZIP archive unpacked into a scratch directory.
///
/// The directory is removed when the value drops; the viewer calls [`keep`]
/// instead so the browser can still read anything the generated HTML
/// references, leaving cleanup to the operating system.
///
/// [`keep`]: Extraction::keep
pub struct Extraction {
    dir: TempDir,
}

impl Extraction {
    /// Extract the whole archive into a freshly created scratch directory.
    pub fn unpack(zip_path: &Path) -> Result<Self> {
        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;
        let dir = TempDir::new()?;
        archive.extract(dir.path())?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// All `.xml` files anywhere under the extraction root, in walk order.
    pub fn xml_files(&self) -> Vec<PathBuf> {
        WalkDir::new(self.dir.path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            })
            .collect()
    }

    /// Give up ownership of the scratch directory, leaving it on disk.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}
