use std::io::{self, Write};

use colored::Colorize;
use log::{debug, trace};

use crate::types::{FileReport, RewriteWarning, RunReport};

const TOP_UNRESOLVED: usize = 5;

pub fn print_no_changes_message<W: Write>(writer: &mut W, report: &RunReport) -> io::Result<()> {
    debug!("No barrel imports to rewrite");
    writeln!(
        writer,
        "{} No barrel imports to rewrite ({} exports resolved).",
        "✓".green().bold(),
        report.exports_resolved
    )?;
    print_failed_packages(writer, report)?;
    writer.flush()?;
    Ok(())
}

pub fn print_report<W: Write>(writer: &mut W, report: &RunReport) -> io::Result<()> {
    debug!("Printing report for {} files", report.files.len());
    let verb = if report.written { "Rewrote" } else { "Would rewrite" };
    writeln!(
        writer,
        "{} {} barrel imports in {} files\n",
        "⚡".yellow().bold(),
        verb,
        report.files_rewritten().to_string().yellow()
    )?;

    for file in &report.files {
        print_file(writer, file)?;
    }

    print_failed_packages(writer, report)?;
    print_summary(writer, report)?;

    writer.flush()?;
    Ok(())
}

fn print_file<W: Write>(writer: &mut W, file: &FileReport) -> io::Result<()> {
    trace!("Printing {}", file.path.display());
    let display_path = file.path.display().to_string();
    if file.transformed {
        writeln!(writer, "{}", display_path.blue())?;
    } else {
        writeln!(writer, "{}", display_path.bright_white().bold())?;
    }

    let mut lines: Vec<String> = Vec::new();
    for optimized in &file.optimized {
        for rewrite in &optimized.rewrites {
            lines.push(format!("{} {}", "+".green(), rewrite));
        }
    }
    for skipped in &file.skipped {
        lines.push(format!("{} {} of '{}'", "skipped".yellow(), skipped.reason, skipped.source));
    }
    for warning in file.warnings.iter().filter(|w| !is_skip_warning(w)) {
        lines.push(format!("{} {}", "!".red(), warning));
    }
    if let Some(error) = &file.write_error {
        lines.push(format!("{} failed to write: {}", "✗".red().bold(), error));
    }

    for (idx, line) in lines.iter().enumerate() {
        let prefix = if idx == lines.len() - 1 { "└──" } else { "├──" };
        writeln!(writer, "{}  {}", prefix.dimmed(), line)?;
    }
    writeln!(writer)?;
    Ok(())
}

// Skips are already listed on their own line.
fn is_skip_warning(warning: &RewriteWarning) -> bool {
    matches!(warning, RewriteWarning::UnsafePattern { .. })
}

fn print_failed_packages<W: Write>(writer: &mut W, report: &RunReport) -> io::Result<()> {
    for failed in &report.failed_packages {
        writeln!(writer, "{} {}: {}", "✗".red().bold(), failed.package.red(), failed.error)?;
    }
    Ok(())
}

fn print_summary<W: Write>(writer: &mut W, report: &RunReport) -> io::Result<()> {
    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Files rewritten: {}", report.files_rewritten().to_string().green().bold())?;
    writeln!(writer, "  Imports optimized: {}", report.imports_optimized().to_string().green())?;
    writeln!(writer, "  Imports skipped: {}", report.imports_skipped().to_string().yellow())?;
    if report.write_failures() > 0 {
        writeln!(writer, "  Write failures: {}", report.write_failures().to_string().red().bold())?;
    }

    if !report.unresolved.is_empty() {
        let top = &report.unresolved[..report.unresolved.len().min(TOP_UNRESOLVED)];
        writeln!(writer, "  Top {} unresolved names:", top.len())?;
        for (idx, (name, count)) in top.iter().enumerate() {
            writeln!(writer, "    {}. {} ({} imports)", idx + 1, name, count.to_string().red())?;
        }
    }

    if !report.written && report.files_rewritten() > 0 {
        writeln!(writer, "\n  Dry run, pass {} to apply the changes.", "--write".cyan())?;
    }
    Ok(())
}
