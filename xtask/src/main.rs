use std::{path::PathBuf, process::Command};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for daltonlens", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format check, lints, build and tests, with and without the GPU backend
    Ci,
    /// Print the generated WGSL filter shader
    Shader {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Cargo invocations run by `ci`, in order.
const CI_STEPS: &[&[&str]] = &[
    &["fmt", "--all", "--check"],
    &[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
        "-A",
        "clippy::needless_range_loop",
    ],
    &["build", "--all-features"],
    &["test", "--all-features"],
    // CPU-only build, the gpu module must still compile without wgpu
    &["test", "-p", "daltonlens", "--no-default-features"],
];

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Ci => CI_STEPS.iter().try_for_each(|args| cargo(args)),
        Commands::Shader { out } => dump_shader(out),
    }
}

fn dump_shader(out: Option<PathBuf>) -> Result<()> {
    let src = daltonlens::gpu::shader::shader_source();
    let Some(path) = out else {
        print!("{src}");
        return Ok(());
    };
    std::fs::write(&path, src).with_context(|| format!("writing shader to {}", path.display()))
}

fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .context("spawning cargo")?;
    if !status.success() {
        bail!("cargo {} failed with {status}", args.join(" "));
    }
    Ok(())
}
