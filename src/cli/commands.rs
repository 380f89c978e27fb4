//! Command handlers for the IMGW RainGRS CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the core application functionality.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::models::{GeoPoint, SeriesRow};
use crate::app::{FailureReport, RainGrs, SeriesOutput};
use crate::cli::{
    AcquireArgs, AcquisitionProgress, ConfigAction, ConfigArgs, GlobalArgs, OutputFormat,
    ProgressConfig, SeriesArgs,
};
use crate::config::{AppConfig, RuntimeConfig};
use crate::errors::{AppError, Result};

/// CSV header of the series output
pub const CSV_HEADER: &str = "datetime,label,row,col,lat,lon,value";

/// Handle the acquire command
pub async fn handle_acquire(args: AcquireArgs, global: &GlobalArgs, config: AppConfig) -> Result<()> {
    let range = args.range.time_range()?;
    let runtime = runtime_config(&config, global);
    let raingrs = RainGrs::new(&runtime).await?;

    info!("Acquiring {} hours into {}", range.len(), raingrs.cache().cache_root().display());

    let mut progress = AcquisitionProgress::new(progress_config(global), range.len())?;
    let record = raingrs
        .acquire_with(&range, |timestamp, available| {
            progress.hour_finished(timestamp, available)
        })
        .await;
    progress.finish(&record);

    Ok(())
}

/// Handle the series command
///
/// Acquires the range unless `--offline` is given, then extracts and writes
/// the series. Row failures are reported on stderr and do not fail the
/// command.
pub async fn handle_series(args: SeriesArgs, global: &GlobalArgs, config: AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let range = args.range.time_range()?;

    let mut points = args.points.clone();
    if let Some(path) = &args.points_file {
        points.extend(load_points_file(path).await?);
    }
    if points.is_empty() {
        return Err(AppError::generic("No points to extract"));
    }

    let mut runtime = runtime_config(&config, global);
    if let Some(policy) = args.missing_raster_policy() {
        runtime.extraction.missing_raster = policy;
    }
    let raingrs = RainGrs::new(&runtime).await?;

    if args.offline {
        debug!("Offline mode, using cached rasters only");
    } else {
        let mut progress = AcquisitionProgress::new(progress_config(global), range.len())?;
        let record = raingrs
            .acquire_with(&range, |timestamp, available| {
                progress.hour_finished(timestamp, available)
            })
            .await;
        progress.finish(&record);
    }

    let output = raingrs.extract_series(&range, &points).await;

    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            write_series(BufWriter::new(file), &output, args.format)?;
            info!("Wrote {} rows to {}", output.rows.len(), path.display());
        }
        None => write_series(io::stdout().lock(), &output, args.format)?,
    }

    report_failures(&output);
    Ok(())
}

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = AppConfig::write_default(path, force).await?;
            println!("Created configuration file: {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

fn runtime_config(config: &AppConfig, global: &GlobalArgs) -> RuntimeConfig {
    let mut runtime = config.to_runtime_config();
    if let Some(cache_dir) = &global.cache_dir {
        runtime.cache.cache_root = Some(cache_dir.clone());
    }
    runtime
}

fn progress_config(global: &GlobalArgs) -> ProgressConfig {
    if global.quiet {
        ProgressConfig::quiet()
    } else {
        ProgressConfig::default()
    }
}

/// Read points from a file with one `LAT,LON[,LABEL]` record per line
///
/// Blank lines and lines starting with `#` are ignored. Labels containing
/// commas must be quoted.
pub async fn load_points_file(path: &Path) -> Result<Vec<GeoPoint>> {
    let content = tokio::fs::read(path).await.map_err(|e| {
        AppError::generic(format!("Failed to read points file {}: {}", path.display(), e))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_slice());

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());
        let point = point_from_record(&record).map_err(|e| {
            AppError::generic(format!("{}:{}: {}", path.display(), line, e))
        })?;
        points.push(point);
    }

    debug!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

fn point_from_record(record: &csv::StringRecord) -> Result<GeoPoint> {
    if record.len() > 3 {
        return Err(AppError::generic(format!(
            "expected LAT,LON[,LABEL], found {} fields",
            record.len()
        )));
    }
    let coordinates = format!(
        "{},{}",
        record.get(0).unwrap_or_default(),
        record.get(1).unwrap_or_default()
    );
    let point = coordinates.parse::<GeoPoint>()?;
    Ok(match record.get(2).filter(|label| !label.is_empty()) {
        Some(label) => point.with_label(label),
        None => point,
    })
}

/// Write the series in the requested format
pub fn write_series<W: Write>(mut writer: W, output: &SeriesOutput, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&mut writer, &output.rows)?,
        OutputFormat::Json => write_json(&mut writer, output)?,
    }
    writer.flush()?;
    Ok(())
}

/// One CSV output record, fields in [`CSV_HEADER`] order
#[derive(Serialize)]
struct CsvRow<'a> {
    datetime: String,
    label: &'a str,
    row: i64,
    col: i64,
    lat: f64,
    lon: f64,
    value: Option<f64>,
}

impl<'a> From<&'a SeriesRow> for CsvRow<'a> {
    fn from(row: &'a SeriesRow) -> Self {
        Self {
            datetime: row.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            label: row.point.label.as_deref().unwrap_or(""),
            row: row.cell.row,
            col: row.cell.col,
            lat: row.point.latitude,
            lon: row.point.longitude,
            value: row.value,
        }
    }
}

fn write_csv<W: Write>(writer: &mut W, rows: &[SeriesRow]) -> Result<()> {
    // Header written explicitly so an empty series still has one
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER.split(','))?;
    for row in rows {
        csv_writer.serialize(CsvRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SeriesDocument<'a> {
    rows: &'a [SeriesRow],
    failures: Vec<FailureReport>,
}

fn write_json<W: Write>(writer: &mut W, output: &SeriesOutput) -> Result<()> {
    let document = SeriesDocument {
        rows: &output.rows,
        failures: output.failures.iter().map(FailureReport::from).collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|e| AppError::generic(format!("Failed to write JSON output: {}", e)))?;
    writeln!(writer)?;
    Ok(())
}

fn report_failures(output: &SeriesOutput) {
    if output.is_clean() {
        return;
    }

    warn!("{} extraction failures", output.failures.len());
    eprintln!("Rows not extracted:");
    for failure in &output.failures {
        let report = FailureReport::from(failure);
        let when = report
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "all hours".to_string());
        eprintln!("   {} [{}]: {}", when, report.points.join("; "), report.error);
    }
}
