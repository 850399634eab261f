use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use phong_pipeline::app::{load_objects, print_summary, render_frame};
use phong_pipeline::Scene;

const USAGE: &str =
    "Usage: phong-render <scene.xml> [--output <frame.png>] [--size <W>x<H>] [--summary-only]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path.display()))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;
    print_summary(&scene);

    if options.summary_only {
        return Ok(());
    }

    let base_dir = options.path.parent().unwrap_or_else(|| Path::new("."));
    let objects = load_objects(&scene, base_dir);
    let (framebuffer, stats) = render_frame(&scene, &objects, options.width, options.height);
    framebuffer
        .to_image()
        .save(&options.output)
        .with_context(|| format!("failed to write {}", options.output.display()))?;
    info!("wrote {}", options.output.display());

    println!(
        "Rendered {}x{} frame: {} triangles, {} fragments",
        options.width, options.height, stats.triangles_rasterized, stats.fragments_shaded
    );
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    path: PathBuf,
    output: PathBuf,
    width: u32,
    height: u32,
    summary_only: bool,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            path: PathBuf::from(path),
            output: PathBuf::from("frame.png"),
            width: 1024,
            height: 768,
            summary_only: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--output" => {
                    let value = args.next().ok_or_else(|| anyhow!("--output needs a file name"))?;
                    options.output = PathBuf::from(value);
                }
                "--size" => {
                    let value = args.next().ok_or_else(|| anyhow!("--size needs <W>x<H>"))?;
                    (options.width, options.height) = parse_size(&value)?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(options)
    }
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like 640x480, got {value}"))?;
    let width: u32 = width.trim().parse().with_context(|| format!("invalid width in {value}"))?;
    let height: u32 = height.trim().parse().with_context(|| format!("invalid height in {value}"))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("size must be non-zero, got {value}"));
    }
    Ok((width, height))
}
