//! Check command - reads manifests and reports bound and call-site errors

use anyhow::{anyhow, Context, Result};
use boundck_check::check_source;
use boundck_diagnostics::{
    DiagnosticEmitter, Diagnostics, JsonEmitter, SimpleEmitter, SourceCache, TerminalEmitter,
};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Manifest file, or a directory searched for *.toml manifests
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

fn is_manifest(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}

/// Collect manifests under `path`, in a stable order. `Cargo.toml` files
/// are skipped when walking a directory.
fn collect_manifests(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.exists() {
        return Err(anyhow!("{} does not exist", path.display()));
    }

    let files = WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_manifest(p))
        .filter(|p| p.file_name().map_or(true, |name| name != "Cargo.toml"))
        .filter(|p| !p.components().any(|c| c.as_os_str() == "target"))
        .collect();
    Ok(files)
}

pub fn run(
    args: CheckArgs,
    format: OutputFormat,
    use_color: bool,
    verbose: u8,
    quiet: bool,
) -> Result<()> {
    let files = collect_manifests(&args.input)?;
    let chatty = format == OutputFormat::Text && !quiet;

    if files.is_empty() {
        match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "type": "summary",
                    "success": true,
                    "files_checked": 0,
                    "errors": 0,
                    "warnings": 0,
                })
            ),
            _ if !quiet => println!("No manifests found."),
            _ => {}
        }
        return Ok(());
    }

    if chatty && verbose > 0 {
        println!("Checking {} manifest(s)...", files.len());
    }

    let mut source_cache = SourceCache::new();
    let mut all_diagnostics = Diagnostics::new();

    for file in &files {
        let source = fs::read_to_string(file)
            .with_context(|| format!("could not read {}", file.display()))?;
        let filename = file.to_string_lossy().to_string();

        let diagnostics = check_source(&source, &filename, &mut source_cache);
        if chatty && verbose > 0 {
            println!(
                "  {} ({} error(s), {} warning(s))",
                filename,
                diagnostics.error_count(),
                diagnostics.warning_count()
            );
        }
        all_diagnostics.extend(diagnostics);
    }

    let errors = all_diagnostics.error_count();
    let warnings = all_diagnostics.warning_count();
    let failed = errors > 0 || (args.strict && warnings > 0);

    let stderr = std::io::stderr();
    match format {
        OutputFormat::Text => {
            let mut emitter = TerminalEmitter::new(stderr.lock(), use_color);
            emitter.emit_all(&all_diagnostics, &source_cache)?;

            if !quiet || failed {
                print_summary(files.len(), errors, warnings, args.strict, use_color);
            }
        }
        OutputFormat::Short => {
            let mut emitter = SimpleEmitter::new(stderr.lock());
            emitter.emit_all(&all_diagnostics, &source_cache)?;
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(std::io::stdout().lock());
            emitter.emit_all(&all_diagnostics, &source_cache)?;

            let summary = serde_json::json!({
                "type": "summary",
                "success": !failed,
                "files_checked": files.len(),
                "errors": errors,
                "warnings": warnings,
                "strict": args.strict,
            });
            println!("{}", serde_json::to_string(&summary)?);
        }
    }

    if failed {
        Err(anyhow!("Check failed with errors"))
    } else {
        Ok(())
    }
}

fn print_summary(files: usize, errors: usize, warnings: usize, strict: bool, use_color: bool) {
    if errors > 0 {
        if use_color {
            println!(
                "{}: {} error(s), {} warning(s)",
                console::style("Check failed").red().bold(),
                errors,
                warnings
            );
        } else {
            println!("Check failed: {} error(s), {} warning(s)", errors, warnings);
        }
    } else if warnings > 0 && strict {
        if use_color {
            println!(
                "{}: {} warning(s) (strict mode)",
                console::style("Check failed").yellow().bold(),
                warnings
            );
        } else {
            println!("Check failed: {} warning(s) (strict mode)", warnings);
        }
    } else if warnings > 0 {
        if use_color {
            println!(
                "{}: {} warning(s)",
                console::style("Check passed").yellow(),
                warnings
            );
        } else {
            println!("Check passed: {} warning(s)", warnings);
        }
    } else if use_color {
        println!(
            "{} - {} manifest(s) checked",
            console::style("All checks passed!").green().bold(),
            files
        );
    } else {
        println!("All checks passed! - {} manifest(s) checked", files);
    }
}
