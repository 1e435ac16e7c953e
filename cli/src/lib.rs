//! fontpick CLI (made by FontLab https://www.fontlab.com/)

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use fontpick_core::catalog::{FontEntry, FontKind, SkippedFont};
use fontpick_core::config::ManagerConfig;
use fontpick_core::error::FontError;
use fontpick_core::manager::FontManager;
use fontpick_core::matcher::FindOptions;
use fontpick_core::output::{write_json_pretty, write_ndjson};
use fontpick_core::snapshot::{JsonSnapshotStore, CATALOG_VERSION};

pub mod server;

/// CLI entrypoint for fontpick.
#[derive(Debug, Parser)]
#[command(
    name = "fontpick",
    about = "Nearest-match font lookup over a cached catalog (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// JSON config file; absent keys keep their defaults
    #[arg(long = "config", global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Extra font directory searched before the system ones (repeatable)
    #[arg(long = "font-path", global = true, value_hint = ValueHint::DirPath)]
    font_paths: Vec<PathBuf>,

    /// Bundled font directory, searched first and stored relatively in the snapshot
    #[arg(long = "base-dir", global = true, value_hint = ValueHint::DirPath)]
    base_dir: Option<PathBuf>,

    /// Skip the platform font directories
    #[arg(long = "no-system-fonts", global = true, action = ArgAction::SetTrue)]
    no_system_fonts: bool,

    /// Do not ask fc-list for more fonts
    #[arg(long = "no-fontconfig", global = true, action = ArgAction::SetTrue)]
    no_fontconfig: bool,

    /// Follow symlinks while walking font directories
    #[arg(long = "follow-symlinks", global = true, action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Directory holding the catalog snapshot
    #[arg(
        long = "cache-dir",
        global = true,
        value_hint = ValueHint::DirPath,
        conflicts_with = "no_cache"
    )]
    cache_dir: Option<PathBuf>,

    /// Neither read nor write a catalog snapshot
    #[arg(long = "no-cache", global = true, action = ArgAction::SetTrue)]
    no_cache: bool,

    /// Worker threads used while building the catalog
    #[arg(short = 'j', long = "jobs", global = true)]
    jobs: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve font patterns such as "serif-12:bold" to font files
    Match(MatchArgs),
    /// List the faces the catalog knows about
    List(ListArgs),
    /// Rescan every font directory and refresh the snapshot
    Rebuild,
    /// Serve lookups over HTTP
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Font patterns to resolve, in fontconfig-like syntax
    #[arg(required = true, value_hint = ValueHint::Other)]
    patterns: Vec<String>,

    /// Which catalog to search: outline (ttf) or metric (afm)
    #[arg(short = 'k', long = "kind", default_value = "outline", value_parser = parse_kind)]
    kind: FontKind,

    /// Only consider fonts located below this directory
    #[arg(long = "within", value_hint = ValueHint::DirPath)]
    within: Option<PathBuf>,

    /// Do not retry with the default family when nothing matches well
    #[arg(long = "no-fallback", action = ArgAction::SetTrue)]
    no_fallback: bool,

    /// Fail instead of rebuilding when the chosen file has vanished
    #[arg(long = "no-rebuild", action = ArgAction::SetTrue)]
    no_rebuild: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Which catalog to list: outline (ttf) or metric (afm)
    #[arg(short = 'k', long = "kind", default_value = "outline", value_parser = parse_kind)]
    kind: FontKind,

    /// Regex patterns; a face is listed when its family matches any of them
    #[arg(short = 'n', long = "name", value_hint = ValueHint::Other)]
    name_patterns: Vec<String>,

    /// List the files that could not be read instead
    #[arg(long = "skipped", action = ArgAction::SetTrue)]
    skipped: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long = "bind", default_value = "127.0.0.1:8765")]
    bind: String,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Format output as padded columns
    #[arg(long = "columns", action = ArgAction::SetTrue)]
    columns: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

impl OutputArgs {
    fn use_color(&self, out: &impl IsTerminal) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => out.is_terminal(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// One resolved pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct MatchRow {
    request: String,
    path: PathBuf,
}

fn parse_kind(raw: &str) -> Result<FontKind, FontError> {
    raw.parse()
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli.global)?;
    let manager = FontManager::new(config);

    let outcome = match &cli.command {
        Command::Match(args) => run_match(&manager, args),
        Command::List(args) => run_list(&manager, args),
        Command::Rebuild => run_rebuild(&manager, io::stdout().lock()),
        Command::Serve(args) => {
            report_diagnostics(&manager, io::stderr().lock())?;
            return run_serve(manager, args);
        }
    };

    report_diagnostics(&manager, io::stderr().lock())?;
    outcome
}

/// Config file, then environment, then flags; later layers win.
fn build_config(args: &GlobalArgs) -> Result<ManagerConfig> {
    let mut config = match &args.config {
        Some(path) => ManagerConfig::from_json_file(path)?,
        None => ManagerConfig::default(),
    };
    config.apply_env();

    config.font_paths.extend(args.font_paths.iter().cloned());
    if let Some(dir) = &args.base_dir {
        config.base_dir = Some(dir.clone());
    }
    if args.no_system_fonts {
        config.include_system_fonts = false;
    }
    if args.no_fontconfig {
        config.use_fontconfig = false;
    }
    if args.follow_symlinks {
        config.follow_symlinks = true;
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if args.no_cache {
        config.cache_dir = None;
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }

    config.validate()?;
    Ok(config)
}

fn find_options(args: &MatchArgs) -> FindOptions {
    let opts = FindOptions::default()
        .kind(args.kind)
        .fallback_to_default(!args.no_fallback)
        .rebuild_if_missing(!args.no_rebuild);
    match &args.within {
        Some(dir) => opts.within(dir.clone()),
        None => opts,
    }
}

fn run_match(manager: &FontManager, args: &MatchArgs) -> Result<()> {
    let opts = find_options(args);
    let rows = resolve_patterns(manager, &args.patterns, &opts)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = args.output.use_color(&handle);

    if args.output.ndjson {
        write_ndjson(&rows, &mut handle)?;
    } else if args.output.json {
        write_json_pretty(&rows, &mut handle)?;
    } else if args.output.columns {
        write_match_columns(&rows, &mut handle, use_color)?;
    } else {
        write_match_plain(&rows, &mut handle, use_color)?;
    }

    Ok(())
}

/// Resolve every pattern in parallel; output keeps the input order.
fn resolve_patterns(
    manager: &FontManager,
    patterns: &[String],
    opts: &FindOptions,
) -> Result<Vec<MatchRow>> {
    patterns
        .par_iter()
        .map(|pattern| -> Result<MatchRow> {
            let path = manager
                .find_font_pattern(pattern, opts)
                .with_context(|| format!("resolving {pattern:?}"))?;
            Ok(MatchRow {
                request: pattern.clone(),
                path,
            })
        })
        .collect()
}

fn run_list(manager: &FontManager, args: &ListArgs) -> Result<()> {
    let catalog = manager.catalog();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = args.output.use_color(&handle);

    if args.skipped {
        let skipped = catalog.skipped();
        if args.output.ndjson {
            write_ndjson(skipped, &mut handle)?;
        } else if args.output.json {
            write_json_pretty(skipped, &mut handle)?;
        } else {
            write_skipped(skipped, &mut handle, use_color)?;
        }
        return Ok(());
    }

    let filters = compile_patterns(&args.name_patterns)?;
    let entries = filter_entries(catalog.entries(args.kind), &filters);

    if args.output.ndjson {
        write_ndjson(&entries, &mut handle)?;
    } else if args.output.json {
        write_json_pretty(&entries, &mut handle)?;
    } else if args.output.columns {
        write_entry_columns(&entries, &mut handle, use_color)?;
    } else {
        for entry in &entries {
            let rendered = apply_color(&entry.path.display().to_string(), use_color, AnsiColor::Cyan);
            writeln!(handle, "{rendered}")?;
        }
    }

    Ok(())
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid regex: {p}")))
        .collect()
}

fn filter_entries<'c>(entries: &'c [FontEntry], filters: &[Regex]) -> Vec<&'c FontEntry> {
    entries
        .iter()
        .filter(|entry| filters.is_empty() || filters.iter().any(|re| re.is_match(&entry.name)))
        .collect()
}

fn run_rebuild(manager: &FontManager, mut w: impl Write) -> Result<()> {
    let catalog = manager.rebuild();
    writeln!(
        w,
        "catalog rebuilt: {} outline, {} metric, {} skipped",
        catalog.entries(FontKind::Outline).len(),
        catalog.entries(FontKind::Metric).len(),
        catalog.skipped().len()
    )?;

    match &manager.config().cache_dir {
        Some(dir) => {
            let path = JsonSnapshotStore::new(dir).path_for(CATALOG_VERSION);
            writeln!(w, "snapshot: {}", path.display())?;
        }
        None => writeln!(w, "snapshot: disabled")?,
    }
    Ok(())
}

fn run_serve(manager: FontManager, args: &ServeArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(server::serve(&args.bind, Arc::new(manager)))
}

/// Print the notices gathered so far as `warning:` lines.
fn report_diagnostics(manager: &FontManager, mut w: impl Write) -> Result<()> {
    for notice in manager.take_diagnostics() {
        writeln!(w, "warning: {notice}")?;
    }
    Ok(())
}

fn write_match_plain(rows: &[MatchRow], mut w: impl Write, color: bool) -> Result<()> {
    for row in rows {
        let rendered = apply_color(&row.path.display().to_string(), color, AnsiColor::Cyan);
        writeln!(w, "{rendered}")?;
    }
    Ok(())
}

fn write_match_columns(rows: &[MatchRow], mut w: impl Write, color: bool) -> Result<()> {
    let request_width = rows
        .iter()
        .map(|r| r.request.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 80);

    for row in rows {
        let padded = format!("{:<request_width$}", row.request);
        let rendered_request = apply_color(&padded, color, AnsiColor::Yellow);
        let rendered_path = apply_color(&row.path.display().to_string(), color, AnsiColor::Cyan);
        writeln!(w, "{rendered_request}  {rendered_path}")?;
    }
    Ok(())
}

fn write_entry_columns(entries: &[&FontEntry], mut w: impl Write, color: bool) -> Result<()> {
    let rows: Vec<(String, String, String)> = entries
        .iter()
        .map(|e| {
            let style = format!(
                "{} {} weight:{} stretch:{}",
                e.style, e.variant, e.weight, e.stretch
            );
            (e.path.display().to_string(), e.name.clone(), style)
        })
        .collect();

    let path_width = rows
        .iter()
        .map(|r| r.0.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 120);
    let name_width = rows
        .iter()
        .map(|r| r.1.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 60);

    for (path, name, style) in rows {
        let padded_path = format!("{:<path_width$}", path);
        let padded_name = format!("{:<name_width$}", name);
        let rendered_path = apply_color(&padded_path, color, AnsiColor::Cyan);
        let rendered_name = apply_color(&padded_name, color, AnsiColor::Yellow);
        let rendered_style = apply_color(&style, color, AnsiColor::Green);

        writeln!(w, "{rendered_path}  {rendered_name}  {rendered_style}")?;
    }
    Ok(())
}

fn write_skipped(skipped: &[SkippedFont], mut w: impl Write, color: bool) -> Result<()> {
    for item in skipped {
        let rendered = apply_color(&item.path.display().to_string(), color, AnsiColor::Cyan);
        writeln!(w, "{rendered}: {}", item.reason)?;
    }
    Ok(())
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}
