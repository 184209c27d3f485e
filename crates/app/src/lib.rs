//! Command-line entry points for the flipbook viewer.

pub mod flip_widget;
pub mod session;
pub mod viewer;

use anyhow::{bail, Context, Result};
use clap::Parser;
use flipbook_engine::{OpenSource, PdfEngine};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::viewer::ViewerArgs;

#[derive(Debug, Parser)]
#[command(name = "flipbook", version, about = "Page-flip viewer for PDF documents")]
pub struct Cli {
    /// PDF document to open.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Rasterization scale factor.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Pages rendered up front before the viewer opens.
    #[arg(long, default_value_t = flipbook_render::INITIAL_PAGES)]
    initial_pages: u32,

    /// Print document metadata as JSON and exit without opening a window.
    #[arg(long)]
    info: bool,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    ensure_readable_pdf(&cli.file)?;

    if cli.info {
        return print_info(&cli.file);
    }

    viewer::run(ViewerArgs {
        file: cli.file,
        scale: cli.scale,
        initial_pages: cli.initial_pages,
    })
}

fn ensure_readable_pdf(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("no such file: {}", path.display());
    }
    if path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.eq_ignore_ascii_case("pdf"))
        != Some(true)
    {
        bail!("not a PDF file: {}", path.display());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct InfoOutput<'a> {
    path: &'a Path,
    page_count: u32,
    first_page_width_pt: f32,
    first_page_height_pt: f32,
}

fn print_info(path: &Path) -> Result<()> {
    let mut engine = flipbook_engine::LopdfEngine::new();
    let handle = engine
        .open(OpenSource::Path(path.to_path_buf()))
        .with_context(|| format!("failed to open {}", path.display()))?;

    let page_count = engine.page_count(handle)?;
    let size = engine.page_size(handle, 0)?;

    let info = InfoOutput {
        path,
        page_count,
        first_page_width_pt: size.width_pt,
        first_page_height_pt: size.height_pt,
    };
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
