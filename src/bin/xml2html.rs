use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use xml2html::archive::Extraction;
use xml2html::convert;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// XML files or ZIP archives to convert; output HTML lands next to each
    /// input (or next to the archive).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    for input in &args.inputs {
        if !input.is_file() {
            warn!("skipping {}: not a file", input.display());
            continue;
        }
        match extension_of(input) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => {
                if let Err(err) = convert::convert_to_dir(input, beside(input)) {
                    error!("{}: {err}", input.display());
                }
            }
            Some(ext) if ext.eq_ignore_ascii_case("zip") => {
                if let Err(err) = convert_archive(input) {
                    error!("{}: {err}", input.display());
                }
            }
            _ => warn!("skipping {}: unsupported file type", input.display()),
        }
    }
    Ok(())
}

/// Extract the archive and convert every XML member, writing the HTML next
/// to the archive itself. One bad member does not stop the rest.
fn convert_archive(zip_path: &Path) -> Result<()> {
    info!("extracting {}", zip_path.display());
    let extraction = Extraction::unpack(zip_path)?;
    let files = extraction.xml_files();
    if files.is_empty() {
        info!("no XML files in {}", zip_path.display());
        return Ok(());
    }
    let out_dir = beside(zip_path);
    for xml in &files {
        if let Err(err) = convert::convert_to_dir(xml, out_dir) {
            warn!("{}: {err}", xml.display());
        }
    }
    Ok(())
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn beside(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing subscriber: {err}"))?;
    Ok(())
}
