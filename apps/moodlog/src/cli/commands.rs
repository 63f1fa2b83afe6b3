//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands. Every
//! command opens the configured store, performs one facade call and prints
//! the result as text or, with `--json-mode`, as pretty JSON.

use crate::api::{self, AppState};
use crate::config::Settings;
use crate::error::AppError;
use moodlog_core::{
    DIMENSIONS, DateKey, DayView, DimensionInsight, HistoryEntry, MoodError, MoodRecord,
    MoodService, Ratings, StorageBackend, SystemClock, TrendDirection, formats::import_from_bytes,
    primitives::{MAX_DOCUMENT_SIZE, MIN_INSIGHT_DAYS},
};
use moodlog_core::ExportDocument;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the configured store on the system clock.
pub fn open_service(settings: &Settings) -> Result<MoodService, AppError> {
    let store = StorageBackend::open(settings.backend, &settings.database)?;
    tracing::debug!(
        backend = %settings.backend,
        database = %settings.database.display(),
        "Store opened"
    );
    Ok(MoodService::new(store, SystemClock))
}

/// Parse `DIMENSION=VALUE` pairs into raw ratings.
///
/// Only the syntax is checked here; completeness and range are validated by
/// the service like any other input.
pub fn parse_ratings(pairs: &[String]) -> Result<Ratings, AppError> {
    let mut ratings = Ratings::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            AppError::InvalidArgument(format!("'{}' is not DIMENSION=VALUE", pair))
        })?;
        let key = key.trim();
        let value: f64 = value.trim().parse().map_err(|_| {
            AppError::InvalidArgument(format!("'{}' is not a number in '{}'", value, pair))
        })?;
        if ratings.insert(key.to_string(), value).is_some() {
            return Err(AppError::InvalidArgument(format!(
                "'{}' given more than once",
                key
            )));
        }
    }
    Ok(ratings)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| MoodError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// `+2`, `+1`, ` 0`, `-1`, `-2`.
fn signed(value: i8) -> String {
    if value > 0 {
        format!("+{}", value)
    } else if value == 0 {
        " 0".to_string()
    } else {
        value.to_string()
    }
}

/// One line per dimension: emoji, label, value and the scale's end labels.
fn print_record(record: &MoodRecord) {
    for dimension in &DIMENSIONS {
        let value = record.get(dimension.id).unwrap_or(0);
        println!(
            "  {} {:<8} {}   ({} .. {})",
            dimension.emoji,
            dimension.label,
            signed(value),
            dimension.left,
            dimension.right
        );
    }
    println!("  Average:   {:+.2}", record.average());
}

/// Compact single-line form used by `history`.
fn record_summary(record: &MoodRecord) -> String {
    record
        .iter()
        .map(|(id, value)| format!("{}={}", id, signed(value).trim()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Calendar glyph for one day.
fn day_glyph(day: &DayView) -> &'static str {
    if day.is_future {
        return "   ";
    }
    match day.avg {
        None => " . ",
        Some(avg) if avg >= 1.0 => " ++",
        Some(avg) if avg >= 0.25 => " + ",
        Some(avg) if avg > -0.25 => " = ",
        Some(avg) if avg > -1.0 => " - ",
        Some(_) => " --",
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(settings: &Settings) -> Result<(), AppError> {
    let service = open_service(settings)?;

    println!("Moodlog Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", settings.host);
    println!("  Port:     {}", settings.port);
    println!("  Backend:  {}", settings.backend);
    println!("  Database: {}", settings.database.display());
    println!();
    println!("Endpoints:");
    println!("  GET    /api/moods              - All records");
    println!("  GET    /api/moods/export/all   - Export");
    println!("  GET    /api/moods/{{date}}       - One record");
    println!("  POST   /api/moods              - Create or replace");
    println!("  DELETE /api/moods/{{date}}       - Delete");
    println!("  GET    /api/today              - Today's record");
    println!("  GET    /api/calendar           - Calendar grid");
    println!("  GET    /api/insights           - Trends");
    println!("  GET    /health                 - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state =
        AppState::new(service).with_defaults(settings.calendar_weeks, settings.history_limit);
    api::run_server(&settings.bind_addr(), state).await
}

// =============================================================================
// TODAY / LOG / SET
// =============================================================================

/// Show today's record, neutral if nothing is logged yet.
pub fn cmd_today(settings: &Settings, json_mode: bool) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let today = service.today();
    let record = service.fetch_today()?;
    let logged = service.get(&today.to_string())?.is_some();

    if json_mode {
        return print_json(&serde_json::json!({
            "date": today,
            "data": record,
            "logged": logged,
            "average": record.average(),
        }));
    }

    println!("Today: {}{}", today, if logged { "" } else { " (not logged yet)" });
    println!();
    print_record(&record);
    Ok(())
}

/// Record today's ratings.
pub fn cmd_log(settings: &Settings, json_mode: bool, pairs: &[String]) -> Result<(), AppError> {
    let ratings = parse_ratings(pairs)?;
    let mut service = open_service(settings)?;
    let ack = service.submit(&ratings)?;

    if json_mode {
        return print_json(&ack);
    }
    println!("Saved mood for {}", ack.date);
    print_record(&ack.data);
    Ok(())
}

/// Record ratings for an arbitrary date.
pub fn cmd_set(
    settings: &Settings,
    json_mode: bool,
    date: &str,
    pairs: &[String],
) -> Result<(), AppError> {
    let ratings = parse_ratings(pairs)?;
    let mut service = open_service(settings)?;
    let ack = service.upsert(date, &ratings)?;

    if json_mode {
        return print_json(&ack);
    }
    println!("Saved mood for {}", ack.date);
    print_record(&ack.data);
    Ok(())
}

// =============================================================================
// GET / DELETE
// =============================================================================

/// Show the record for one date.
pub fn cmd_get(settings: &Settings, json_mode: bool, date: &str) -> Result<(), AppError> {
    let key = DateKey::parse(date)?;
    let service = open_service(settings)?;
    let record = service
        .get(date)?
        .ok_or(AppError::Mood(MoodError::NotFound(key)))?;

    if json_mode {
        return print_json(&HistoryEntry {
            date: key,
            data: record,
        });
    }
    println!("{}", key);
    print_record(&record);
    Ok(())
}

/// Delete the record for one date.
pub fn cmd_delete(settings: &Settings, json_mode: bool, date: &str) -> Result<(), AppError> {
    let mut service = open_service(settings)?;
    let removed = service.remove(date)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "message": "Mood deleted",
            "date": date,
            "data": removed,
        }));
    }
    println!("Deleted mood for {}", date);
    Ok(())
}

// =============================================================================
// HISTORY / CALENDAR / INSIGHTS
// =============================================================================

/// List recent records, most recent first.
pub fn cmd_history(settings: &Settings, json_mode: bool, limit: usize) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let history = service.fetch_history(limit)?;

    if json_mode {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("No moods logged yet");
        return Ok(());
    }
    for entry in &history {
        println!(
            "{}  avg {:+.2}  {}",
            entry.date,
            entry.data.average(),
            record_summary(&entry.data)
        );
    }
    Ok(())
}

/// Show the calendar grid ending today.
pub fn cmd_calendar(settings: &Settings, json_mode: bool, weeks: u32) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let grid = service.calendar(weeks)?;

    if json_mode {
        return print_json(&grid);
    }

    println!("Week of       Sun Mon Tue Wed Thu Fri Sat");
    for week in &grid {
        let cells: String = week
            .iter()
            .map(|day| {
                if day.is_today {
                    format!("[{:>2}]", day_glyph(day).trim())
                } else {
                    format!("{} ", day_glyph(day))
                }
            })
            .collect();
        println!("{}   {}", week[0].date, cells);
    }
    println!();
    println!("Legend: ++ great  + good  = steady  - low  -- rough  . not logged  [ ] today");
    Ok(())
}

/// Per-dimension averages and trends over the rolling window.
pub fn cmd_insights(settings: &Settings, json_mode: bool, weeks: u32) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let insights = service.insights(weeks)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "ready": insights.is_some(),
            "min_days": MIN_INSIGHT_DAYS,
            "weeks": weeks,
            "dimensions": insights.unwrap_or_default(),
        }));
    }

    let Some(insights) = insights else {
        println!(
            "Log at least {} days in the last {} weeks to see insights",
            MIN_INSIGHT_DAYS, weeks
        );
        return Ok(());
    };

    println!("Insights (last {} weeks)", weeks);
    println!("========================");
    for insight in &insights {
        print_insight(insight);
    }
    Ok(())
}

fn print_insight(insight: &DimensionInsight) {
    let direction = match insight.direction {
        TrendDirection::Improving => "Improving",
        TrendDirection::Declining => "Declining",
        TrendDirection::Steady => "Steady",
    };
    println!(
        "  {} {:<8} avg {:+.2}  trend {:+.2}  {}",
        insight.dimension.emoji, insight.dimension.label, insight.average, insight.trend, direction
    );
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, AppError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let canonical_parent = parent.canonicalize().map_err(|e| {
        AppError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;
    let filename = path
        .file_name()
        .ok_or_else(|| AppError::Io("Output path has no filename".to_string()))?;
    Ok(canonical_parent.join(filename))
}

/// Validate an input path: it must resolve to a regular file no larger than
/// the document limit.
fn validate_input_file(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Err(AppError::InvalidArgument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_DOCUMENT_SIZE
        )));
    }
    Ok(canonical)
}

/// Write the export envelope as pretty JSON with a trailing newline.
///
/// Returns the number of bytes written.
pub fn write_export(export: &ExportDocument, out: &mut impl Write) -> Result<usize, AppError> {
    let mut data = serde_json::to_vec_pretty(export)
        .map_err(|e| MoodError::SerializationError(e.to_string()))?;
    data.push(b'\n');
    out.write_all(&data)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::Io(format!("Write export: {}", e)))?;
    Ok(data.len())
}

/// Write the export envelope to `output`, or stdout.
pub fn cmd_export(settings: &Settings, output: Option<&Path>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let export = service.export()?;

    let Some(output) = output else {
        write_export(&export, &mut std::io::stdout().lock())?;
        return Ok(());
    };

    let validated = validate_output_path(output)?;
    let mut file = std::fs::File::create(&validated)
        .map_err(|e| AppError::Io(format!("Create '{}': {}", validated.display(), e)))?;
    let written = write_export(&export, &mut file)?;

    println!(
        "Exported {} records ({} bytes) to {}",
        export.moods.len(),
        written,
        validated.display()
    );
    Ok(())
}

/// Load records from an export envelope or a raw store document.
pub fn cmd_import(settings: &Settings, json_mode: bool, input: &Path) -> Result<(), AppError> {
    let validated = validate_input_file(input)?;
    let bytes = std::fs::read(&validated)
        .map_err(|e| AppError::Io(format!("Read '{}': {}", validated.display(), e)))?;
    let document = import_from_bytes(&bytes)?;

    let mut service = open_service(settings)?;
    let summary = service.import(document)?;

    if json_mode {
        return print_json(&summary);
    }
    println!(
        "Imported {} records ({} replaced existing dates)",
        summary.imported, summary.replaced
    );
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty store, optionally replacing an existing one.
pub fn cmd_init(settings: &Settings, force: bool) -> Result<(), AppError> {
    let path = &settings.database;
    if path.exists() {
        if !force {
            return Err(AppError::InvalidArgument(format!(
                "Store already exists at {}. Use --force to overwrite.",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| AppError::Io(format!("Remove '{}': {}", path.display(), e)))?;
        tracing::warn!(database = %path.display(), "Existing store removed");
    }

    let service = open_service(settings)?;
    println!(
        "Initialized new {} store at {}",
        service.backend_name(),
        path.display()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
