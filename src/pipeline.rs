use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::cleaning::{handle_missing_values, remove_duplicates};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::feedback::extract_feedback;
use crate::frame::{Cell, DataFrame};
use crate::ingestion::{load_csv, load_excel, load_json, write_csv};
use crate::validation::validate_isbn;

/// One dataset kind processed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Circulation,
    Events,
    Catalogue,
    Feedback,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Circulation,
        Stage::Events,
        Stage::Catalogue,
        Stage::Feedback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Circulation => "circulation",
            Stage::Events => "events",
            Stage::Catalogue => "catalogue",
            Stage::Feedback => "feedback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| PipelineError::InvalidArgument(format!("unknown pipeline stage: {s}")))
    }
}

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineRun {
    pub results: HashMap<String, DataFrame>,
    pub duration_secs: f64,
    pub output_files: Vec<String>,
}

fn report_frame(label: &str, frame: &DataFrame) {
    let summary = frame.summary();
    info!(
        rows = summary.rows,
        columns = summary.columns,
        missing = summary.missing_cells,
        duplicates = summary.duplicate_rows,
        "{label}"
    );
    println!("\n{label}:");
    println!("   Rows: {}", summary.rows);
    println!("   Columns: {}", summary.columns);
    println!("   Missing values: {}", summary.missing_cells);
    println!("   Duplicates: {}", summary.duplicate_rows);
}

fn save_to_silver(frame: &DataFrame, filename: &str, config: &PipelineConfig) -> Result<PathBuf> {
    fs::create_dir_all(&config.silver_dir)?;
    let filepath = config.silver_dir.join(filename);
    write_csv(frame, &filepath)?;
    Ok(filepath)
}

/// Circulation transactions: CSV in, duplicate transactions and rows with
/// missing values removed.
pub fn process_circulation(config: &PipelineConfig) -> Result<DataFrame> {
    println!("\n📚 Processing circulation data...");
    let frame = load_csv(&config.bronze_dir.join("circulation_data.csv"))?;
    report_frame("Raw data", &frame);

    let deduped = remove_duplicates(&frame, Some(&["transaction_id"]))?;
    info!(
        removed = frame.row_count() - deduped.row_count(),
        "removed duplicate transactions"
    );
    println!(
        "   Removed {} duplicate rows",
        frame.row_count() - deduped.row_count()
    );

    let cleaned = handle_missing_values(&deduped, "drop", None)?;
    println!("   Dropped rows with missing values");

    let filepath = save_to_silver(&cleaned, "circulation_clean.csv", config)?;
    println!("   Saved to: {}", filepath.display());
    report_frame("Cleaned data", &cleaned);

    Ok(cleaned)
}

/// Library events: JSON records in, rows with missing values removed.
pub fn process_events(config: &PipelineConfig) -> Result<DataFrame> {
    println!("\n📅 Processing events data...");
    let frame = load_json(&config.bronze_dir.join("events_data.json"))?;
    report_frame("Raw data", &frame);

    let cleaned = handle_missing_values(&frame, "drop", None)?;

    let filepath = save_to_silver(&cleaned, "events_clean.csv", config)?;
    println!("   Saved to: {}", filepath.display());
    report_frame("Cleaned data", &cleaned);

    Ok(cleaned)
}

/// Catalogue records: spreadsheet in, duplicate ISBNs removed, each row
/// flagged with an ISBN validity column.
pub fn process_catalogue(config: &PipelineConfig) -> Result<DataFrame> {
    println!("\n📖 Processing catalogue data...");
    let frame = load_excel(&config.bronze_dir.join("catalogue.xlsx"))?;
    report_frame("Raw data", &frame);

    let mut cleaned = remove_duplicates(&frame, Some(&["ISBN"]))?;
    println!(
        "   Removed {} duplicate rows",
        frame.row_count() - cleaned.row_count()
    );

    if let Some(isbn_index) = cleaned.column_index("ISBN") {
        let flags: Vec<Cell> = cleaned
            .rows()
            .map(|row| Cell::Bool(validate_isbn(&row[isbn_index])))
            .collect();
        let invalid = flags
            .iter()
            .filter(|flag| **flag == Cell::Bool(false))
            .count();
        cleaned.add_column("ISBN_valid", flags)?;
        if invalid > 0 {
            warn!(invalid, "catalogue contains invalid ISBNs");
        }
        println!("   Found {invalid} invalid ISBNs");
    }

    let filepath = save_to_silver(&cleaned, "catalogue_clean.csv", config)?;
    println!("   Saved to: {}", filepath.display());
    report_frame("Cleaned data", &cleaned);

    Ok(cleaned)
}

/// Reader feedback: free-text log in, grouped (branch, rating) counts
/// out. Returns the raw extracted pairs.
pub fn process_feedback(config: &PipelineConfig) -> Result<DataFrame> {
    println!("\n💬 Processing feedback data...");
    let path = config.bronze_dir.join("feedback.txt");
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;

    let report = extract_feedback(&content)?;
    info!(
        entries = report.entries_found,
        extracted = report.pairs.row_count(),
        "extracted feedback"
    );
    println!("   Found {} feedback entries", report.entries_found);
    println!("   Extracted {} rating lines", report.pairs.row_count());

    let filepath = save_to_silver(&report.summary, "feedback_summary.csv", config)?;
    println!("   Saved to: {}", filepath.display());

    Ok(report.pairs)
}

/// Runs a single stage regardless of the configured stage list.
pub fn run_stage(stage: Stage, config: &PipelineConfig) -> Result<DataFrame> {
    let span = tracing::info_span!("stage", stage = %stage);
    let _enter = span.enter();
    match stage {
        Stage::Circulation => process_circulation(config),
        Stage::Events => process_events(config),
        Stage::Catalogue => process_catalogue(config),
        Stage::Feedback => process_feedback(config),
    }
}

/// Runs the configured stages strictly in sequence. The first stage
/// failure is logged and re-raised unmodified; there is no retry and no
/// partial-state recovery.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineRun> {
    info!(stages = config.stages.len(), "starting pipeline");
    println!("🚀 Starting pipeline ({} stages)...", config.stages.len());
    let started = Instant::now();

    fs::create_dir_all(&config.silver_dir)?;

    let mut results = HashMap::new();
    for stage in &config.stages {
        match run_stage(*stage, config) {
            Ok(frame) => {
                results.insert(stage.name().to_string(), frame);
            }
            Err(e) => {
                error!(stage = %stage, "stage failed: {e}");
                println!("\n❌ Pipeline failed in {stage} stage: {e}");
                return Err(e);
            }
        }
    }

    let duration_secs = started.elapsed().as_secs_f64();
    let output_files = list_output_files(&config.silver_dir)?;

    info!(duration_secs, files = output_files.len(), "pipeline finished");
    println!("\n✅ Pipeline completed successfully!");
    println!("   Duration: {duration_secs:.2} seconds");
    println!("   Stages processed: {}", results.len());
    println!("   Output directory: {}", config.silver_dir.display());
    println!("\nCleaned files created:");
    for file in &output_files {
        println!("   - {file}");
    }

    Ok(PipelineRun {
        results,
        duration_secs,
        output_files,
    })
}

fn list_output_files(silver_dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(silver_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".csv") {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}
