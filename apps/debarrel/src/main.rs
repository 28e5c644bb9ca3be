use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use debarrel_core::{ResolveOptions, find_git_root, resolve};
use debarrel_rewrite::Config;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "debarrel")]
#[command(about = "Rewrite barrel-file imports into direct imports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rewrite imports of barrel packages in JavaScript/TypeScript projects
    Rewrite(Config),

    /// Print the resolved export map of a package as JSON
    Exports {
        /// Package name as it appears in import specifiers
        package: String,

        /// Directory where node_modules lookup starts (defaults to git root)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Rewrite(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!(
                "Rewriting imports of {:?} (using {} threads)",
                cfg.packages, num_threads
            );
            debug!(
                "Config: root={:?}, modules_root={:?}, entry_glob={:?}, write={}",
                cfg.root, cfg.modules_root, cfg.entry_glob, cfg.write
            );

            let report = debarrel_rewrite::run_rewrite(cfg)?;
            debug!("{} files with changes or diagnostics", report.files.len());

            let elapsed_ms = start.elapsed().as_millis();

            if report.files.is_empty() {
                debarrel_rewrite::print_no_changes_message(&mut stdout, &report)?;
            } else {
                debarrel_rewrite::print_report(&mut stdout, &report)?;
            }
            writeln!(
                stdout,
                "\n{} Finished in {}ms on {} files (using {} threads).",
                "●".bright_blue(),
                elapsed_ms.to_string().cyan(),
                report.files_scanned.to_string().cyan(),
                num_threads.to_string().cyan()
            )?;
            stdout.flush()?;

            if !report.failed_packages.is_empty() || report.write_failures() > 0 {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Exports { package, root } => {
            let root = match root {
                Some(r) => r,
                None => find_git_root()?,
            };
            info!("Resolving exports of '{}' from {}", package, root.display());

            let exports = match resolve(&package, &root, &ResolveOptions::default()) {
                Ok(exports) => exports,
                Err(e) => {
                    eprintln!("{} {}: {}", "✗".red().bold(), package.red(), e);
                    std::process::exit(1);
                }
            };

            let json = serde_json::to_string_pretty(&exports)
                .with_context(|| format!("Failed to serialize exports of '{}'", package))?;
            writeln!(stdout, "{}", json)?;
            stdout.flush()?;
            debug!("Resolved {} exports in {}ms", exports.len(), start.elapsed().as_millis());
            Ok(())
        }
    }
}
