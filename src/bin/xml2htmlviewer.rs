use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use xml2html::archive::Extraction;
use xml2html::{convert, picker};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// XML files or ZIP archives to view. Archives open a picker for which
    /// member to display.
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
                if let Err(err) = view_file(input) {
                    error!("{}: {err}", input.display());
                }
            }
            Some(ext) if ext.eq_ignore_ascii_case("zip") => {
                if let Err(err) = view_archive(input) {
                    error!("{}: {err}", input.display());
                }
            }
            _ => warn!("skipping {}: unsupported file type", input.display()),
        }
    }
    Ok(())
}

fn view_file(xml_path: &Path) -> Result<()> {
    let out = convert::view_in_browser(xml_path)?;
    info!("opened {}", out.display());
    Ok(())
}

/// Extract the archive, let the user pick one XML member, and open it in the
/// browser. After a successful view the extracted tree is deliberately left
/// on disk so the browser can read anything the HTML references; every other
/// path cleans it up.
fn view_archive(zip_path: &Path) -> Result<()> {
    info!("extracting {}", zip_path.display());
    let extraction = Extraction::unpack(zip_path)?;
    let files = extraction.xml_files();
    if files.is_empty() {
        info!("no XML files in {}", zip_path.display());
        return Ok(());
    }

    match picker::choose(&files, extraction.root())? {
        Some(xml) => {
            let out = convert::view_in_browser(&xml)?;
            info!("opened {}", out.display());
            let _ = extraction.keep();
        }
        None => info!("selection cancelled"),
    }
    Ok(())
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
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
