use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gantt_engine::config::AppConfig;
use gantt_engine::io::{csv_export, csv_import, file};
use gantt_engine::model::ScaleSelector;
use gantt_engine::{ChartFrame, Project, TimeScale};

#[derive(Parser, Debug)]
#[command(name = "gantt-engine")]
#[command(version)]
#[command(about = "Resolve a Gantt project and print its timeline layout")]
struct Cli {
    /// Project file (.json) or task list (.csv). Uses the sample project when omitted.
    project: Option<PathBuf>,

    /// Pin the time scale (days, weeks, months) instead of auto-detecting.
    #[arg(long, value_parser = parse_scale)]
    scale: Option<TimeScale>,

    /// Clear a previously pinned scale.
    #[arg(long, conflicts_with = "scale")]
    auto_scale: bool,

    /// Write the resolved schedule to this CSV file.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Settings file (defaults to the OS config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_scale(s: &str) -> Result<TimeScale, String> {
    match s.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => Ok(TimeScale::Days),
        "weeks" | "week" | "w" => Ok(TimeScale::Weeks),
        "months" | "month" | "m" => Ok(TimeScale::Months),
        other => Err(format!("unknown scale '{}', expected days, weeks or months", other)),
    }
}

fn load(path: &Path, config: &AppConfig) -> gantt_engine::Result<Project> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return file::load_project(path);
    }

    let (tasks, skipped) = csv_import::import_csv(path)?;
    if skipped > 0 {
        tracing::warn!(skipped, "some CSV rows were skipped");
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Imported Project");
    let mut project = Project::new(name);
    project.tasks = tasks;
    project.settings = config.default_settings.clone();
    Ok(project)
}

fn print_frame(project: &Project, frame: &ChartFrame) {
    let bounds = &frame.render_settings.timeline;
    let show_dates = frame.render_settings.settings.show_dates_in_bars;
    println!("{}", project.name);
    println!(
        "Timeline {} .. {}  [{}]",
        bounds.start.format("%Y-%m-%d %H:%M"),
        bounds.end.format("%Y-%m-%d %H:%M"),
        frame.scale.label()
    );

    let labels: Vec<String> = frame
        .markers
        .iter()
        .map(|m| format!("{} @{:.1}%", m.marker.label, m.position))
        .collect();
    println!("Markers: {}", labels.join(", "));
    println!();

    for row in &frame.layout.rows {
        let Some(task) = frame.task(row.task_id) else {
            continue;
        };
        let indent = "  ".repeat(row.level as usize);
        let chevron = if row.has_children { "▸ " } else { "" };
        let flag = if frame.findings_for(row.task_id).next().is_some() { " !" } else { "" };
        let bar = match row.bar {
            Some(bar) => format!("{:>6.2}% +{:>6.2}%", bar.left_percent, bar.width_percent),
            None => "      (no dates)".to_string(),
        };
        let dates = match (show_dates, task.dates()) {
            (true, Some((s, e))) => format!("  {} - {}", s.format("%d/%m/%Y"), e.format("%d/%m/%Y")),
            _ => String::new(),
        };
        println!(
            "{:>7.1}px h{:<4} {}{}{:<28} {}{}{}",
            row.top, row.height, indent, chevron, task.name, bar, dates, flag
        );
    }

    if !frame.findings.is_empty() {
        println!();
        for finding in &frame.findings {
            println!("! {}", finding);
        }
    }
}

fn run(cli: Cli) -> gantt_engine::Result<()> {
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);

    let mut selector: ScaleSelector = config.scale_selector();
    if let Some(scale) = cli.scale {
        selector.pin(scale);
    } else if cli.auto_scale {
        selector.clear();
    }

    let project = match &cli.project {
        Some(path) => load(path, &config)?,
        None => Project::sample(),
    };

    let frame = ChartFrame::compute(&project.tasks, &project.settings, &selector, Utc::now());
    print_frame(&project, &frame);

    if let Some(path) = &cli.export_csv {
        let written = csv_export::export_csv(&project.tasks, path)?;
        tracing::info!(written, path = %path.display(), "exported schedule");
    }

    config.set_scale_selector(&selector);
    if cli.project.is_some() {
        config.last_project = cli.project;
    }
    if let Err(e) = config.save(&config_path) {
        tracing::warn!(error = %e, "could not save settings");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
