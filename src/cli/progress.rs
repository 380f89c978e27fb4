//! Progress display for acquisition runs
//!
//! One indicatif bar advances per finished hour. When stderr is not a
//! terminal, or in quiet mode, the bar is hidden and only the summary is
//! printed.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::models::AcquisitionRecord;
use crate::errors::{AppError, Result};

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable the visual progress bar
    pub enable_progress_bar: bool,
    /// Spinner tick interval
    pub tick_interval: Duration,
    /// Print the summary when finished
    pub show_summary: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: true,
            tick_interval: Duration::from_millis(100),
            show_summary: true,
        }
    }
}

impl ProgressConfig {
    /// Quiet display: no bar, no summary
    pub fn quiet() -> Self {
        Self {
            enable_progress_bar: false,
            show_summary: false,
            ..Default::default()
        }
    }
}

/// Per-hour progress bar for an acquisition pass
pub struct AcquisitionProgress {
    config: ProgressConfig,
    bar: ProgressBar,
    started: Instant,
    available: usize,
    unavailable: usize,
}

impl AcquisitionProgress {
    /// Create the display for `total_hours` hours
    ///
    /// # Errors
    ///
    /// Returns an error if the bar template is invalid
    pub fn new(config: ProgressConfig, total_hours: usize) -> Result<Self> {
        let bar = if config.enable_progress_bar && std::io::stderr().is_terminal() {
            let bar = ProgressBar::new(total_hours as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                    )
                    .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
                    .progress_chars("##-"),
            );
            bar.enable_steady_tick(config.tick_interval);
            bar
        } else {
            ProgressBar::hidden()
        };

        debug!("Progress display started for {} hours", total_hours);
        Ok(Self {
            config,
            bar,
            started: Instant::now(),
            available: 0,
            unavailable: 0,
        })
    }

    /// Record one finished hour
    pub fn hour_finished(&mut self, timestamp: &NaiveDateTime, available: bool) {
        if available {
            self.available += 1;
        } else {
            self.unavailable += 1;
        }
        self.bar.set_message(timestamp.format("%Y-%m-%d %H:%M").to_string());
        self.bar.inc(1);
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.available, self.unavailable)
    }

    /// Clear the bar and print the run summary to stderr
    pub fn finish(self, record: &AcquisitionRecord) {
        self.bar.finish_and_clear();
        if !self.config.show_summary {
            return;
        }

        let stats = record.stats();
        eprintln!("Acquisition summary:");
        eprintln!("   Hours: {}", record.len());
        eprintln!("   Already cached: {}", stats.cached);
        eprintln!("   Live source: {}", stats.live);
        eprintln!("   Archive (+2 days): {}", stats.archive_primary);
        eprintln!("   Archive (+1 day): {}", stats.archive_fallback);
        eprintln!("   Unavailable: {}", stats.unavailable);
        eprintln!("   Duration: {:.1?}", self.started.elapsed());

        let missing = record.unavailable();
        if !missing.is_empty() {
            eprintln!("Unavailable hours:");
            for timestamp in missing {
                eprintln!("   {}", timestamp.format("%Y-%m-%d %H:%M"));
            }
        }
    }
}
