//! Clone a repository and flatten its default branch.
//!
//! Selected files are either written side by side into one directory
//! (basenames only, last write wins) or concatenated into a single text file
//! with a `--- <path> ---` header per file.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use gitflat::core::naming::split_list;
use gitflat::error::RunError;
use gitflat::exit_codes;
use gitflat::flatten::flatten_repo;
use gitflat::io::config::{DEFAULT_CONFIG_FILE, Overrides, load_config, resolve};
use gitflat::logging;

#[derive(Parser, Debug)]
#[command(
    name = "gitflat",
    version,
    about = "Flatten a git repository into one directory or one text file"
)]
struct Cli {
    /// URL (or local path) of the git repository.
    #[arg(long)]
    repo: Option<String>,

    /// Destination folder for flattened files.
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Path prefixes to exclude, comma or space separated.
    #[arg(long)]
    exclude: Option<String>,

    /// Only include files under this path prefix (overrides --exclude).
    #[arg(long)]
    include: Option<String>,

    /// File extensions to include, e.g. ".go,.txt". Empty keeps everything.
    #[arg(long, alias = "extensions")]
    exts: Option<String>,

    /// Flatten the repo into a single text file.
    #[arg(long)]
    single: bool,

    /// Name of the single-file artifact inside --dest.
    #[arg(long)]
    output_name: Option<String>,

    /// Remove subdirectories of --dest after flattening.
    #[arg(long)]
    prune_dirs: bool,

    /// TOML config file (defaults to `.gitflat.toml` when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            repo: self.repo.clone(),
            dest: self.dest.clone(),
            include: self.include.clone(),
            exclude: self.exclude.as_deref().map(split_list),
            extensions: self.exts.as_deref().map(split_list),
            single_file: self.single,
            output_name: self.output_name.clone(),
            prune_dirs: self.prune_dirs,
        }
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        let code = err
            .downcast_ref::<RunError>()
            .map(|run_err| exit_codes::for_stage(run_err.stage()))
            .unwrap_or(exit_codes::INVALID);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) if !path.exists() => bail!("config file not found: {}", path.display()),
        Some(path) => load_config(path)?,
        None => load_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    let cfg = resolve(file_config, cli.overrides())?;

    let report = flatten_repo(&cfg)?;

    if cfg.single_file {
        println!(
            "Selected files from {} have been flattened to a single file in {}",
            cfg.repo,
            cfg.dest.display()
        );
    } else {
        println!(
            "Selected files from {} have been flattened to {}",
            cfg.repo,
            cfg.dest.display()
        );
    }
    println!(
        "commit={} visited={} selected={} collisions={} output={}",
        report.head.as_deref().unwrap_or("unknown"),
        report.stats.visited,
        report.stats.selected,
        report.collisions,
        report.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal() {
        let cli = Cli::parse_from(["gitflat", "--repo", "r", "--dest", "d"]);
        assert_eq!(cli.repo.as_deref(), Some("r"));
        assert!(!cli.single);
    }

    #[test]
    fn lists_are_split_into_overrides() {
        let cli = Cli::parse_from([
            "gitflat",
            "--repo",
            "r",
            "--dest",
            "d",
            "--exclude",
            "vendor/,docs/",
            "--extensions",
            ".go .md",
            "--single",
        ]);
        let overrides = cli.overrides();
        assert_eq!(
            overrides.exclude,
            Some(vec!["vendor/".to_string(), "docs/".to_string()])
        );
        assert_eq!(
            overrides.extensions,
            Some(vec![".go".to_string(), ".md".to_string()])
        );
        assert!(overrides.single_file);
    }

    #[test]
    fn absent_lists_leave_file_values() {
        let cli = Cli::parse_from(["gitflat"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.exclude, None);
        assert_eq!(overrides.extensions, None);
    }
}
