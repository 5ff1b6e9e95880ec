// =============================================================================
// Dataset inspector — mnists
// =============================================================================
//
// Downloads (if needed), verifies and loads one dataset from the catalog,
// then prints the shape of every tensor, the class list and the first few
// training labels.
//
// Usage:
//   cargo run -p inspect-demo -- mnist
//   cargo run -p inspect-demo -- fmnist --data-dir ./data/fashion
//   cargo run -p inspect-demo -- emnist-letters --samples 20
//   RUST_LOG=debug cargo run -p inspect-demo -- kmnist --offline

use std::path::PathBuf;
use std::process;

use mnists::catalog::{self, Entry};
use mnists::prelude::*;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

struct Config {
    dataset: String,
    data_dir: Option<PathBuf>,
    offline: bool,
    force: bool,
    transpose: Option<bool>,
    samples: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: "mnist".to_string(),
            data_dir: None,
            offline: false,
            force: false,
            transpose: None,
            samples: 10,
        }
    }
}

fn usage() -> ! {
    println!("Dataset inspector for mnists");
    println!();
    println!("Usage: inspect-demo [DATASET] [options]");
    println!();
    println!("Datasets:");
    for d in catalog::DATASETS {
        println!("  {:<12} {} classes", d.name, d.num_classes());
    }
    println!();
    println!("Options:");
    println!("  --data-dir <path>   Directory for the dataset files");
    println!("  --offline           Never download, only load what is on disk");
    println!("  --force             Re-download (or re-extract) every file");
    println!("  --transpose         Swap the last two image axes on load");
    println!("  --no-transpose      Keep images as stored");
    println!("  --samples <n>       Training labels to print (default: 10)");
    process::exit(0);
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn parse_args() -> Config {
    let mut cfg = Config::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data-dir" => {
                let dir = args.next().unwrap_or_else(|| fail("--data-dir needs a path"));
                cfg.data_dir = Some(PathBuf::from(dir));
            }
            "--offline" => cfg.offline = true,
            "--force" => cfg.force = true,
            "--transpose" => cfg.transpose = Some(true),
            "--no-transpose" => cfg.transpose = Some(false),
            "--samples" => {
                cfg.samples = args
                    .next()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or_else(|| fail("invalid --samples"));
            }
            "--help" | "-h" => usage(),
            other if other.starts_with("--") => fail(&format!("Unknown argument: {other}")),
            name => cfg.dataset = name.to_string(),
        }
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

fn open_standalone(desc: &'static catalog::DatasetDescriptor, cfg: &Config) -> mnists::Result<IdxDataset> {
    let mut options = DatasetOptions::default()
        .download(!cfg.offline)
        .force_download(cfg.force && !cfg.offline)
        .load(false);
    if let Some(dir) = &cfg.data_dir {
        options = options.target_dir(dir);
    }
    let mut ds = IdxDataset::open(desc, options)?;
    ds.load(cfg.transpose.unwrap_or(false))?;
    Ok(ds)
}

fn open_variant(
    parent: &'static catalog::CompositeDescriptor,
    variant: &str,
    cfg: &Config,
) -> mnists::Result<IdxDataset> {
    let dir = cfg.data_dir.clone().unwrap_or_else(|| parent.default_dir());
    let mut composite = CompositeDataset::new(parent, dir);
    if !cfg.offline {
        composite.download(cfg.force)?;
    }
    let options = VariantOptions::default()
        .force_unzip(cfg.force)
        .transpose(cfg.transpose.unwrap_or(true));
    composite.variant_with(variant, options)
}

fn open(cfg: &Config) -> mnists::Result<IdxDataset> {
    match catalog::find(&cfg.dataset) {
        Some(Entry::Dataset(desc)) => match catalog::parent_of(desc) {
            Some(parent) => open_variant(parent, desc.name, cfg),
            None => open_standalone(desc, cfg),
        },
        Some(Entry::Composite(parent)) => {
            let names = parent.variants.iter().map(|v| v.name).collect::<Vec<_>>();
            fail(&format!(
                "{} is a composite dataset, pick a variant: {}",
                parent.name,
                names.join(", ")
            ))
        }
        None => Err(mnists::Error::UnknownVariant(cfg.dataset.clone())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> mnists::Result<()> {
    env_logger::init();
    let cfg = parse_args();

    let ds = open(&cfg)?;
    log::info!("{} ready in {}", ds.name(), ds.target_dir().display());

    println!("=== {} ===", ds.name());
    println!("train images: {} {}", ds.train_images()?.shape(), ds.train_images()?.dtype());
    println!("train labels: {} {}", ds.train_labels()?.shape(), ds.train_labels()?.dtype());
    println!("test images:  {} {}", ds.test_images()?.shape(), ds.test_images()?.dtype());
    println!("test labels:  {} {}", ds.test_labels()?.shape(), ds.test_labels()?.dtype());
    println!();
    println!("{} classes: {}", ds.classes().len(), ds.classes().join(", "));
    println!();

    let train = ds.split(Split::Train)?;
    for i in 0..cfg.samples.min(train.len()) {
        let label = train.label(i).unwrap_or_default();
        let class = train.class_name(i).unwrap_or("?");
        println!("  #{i:<5} label {label:>3}  {class}");
    }
    Ok(())
}
