//! Per-hour acquisition states
//!
//! ```text
//! CheckCache ──present──────────────────────────────▶ Done(Cache)
//!     │ absent
//!     ▼
//! LiveFetch ──found, written────────────────────────▶ Done(Live)
//!     │ not found
//!     ▼
//! ArchiveFetch(Primary) ──not found─────────────────▶ Done(unavailable)
//!     │ extracted, target absent      └─target present▶ Done(ArchivePrimary)
//!     ▼
//! ArchiveFetch(Fallback) ──target present───────────▶ Done(ArchiveFallback)
//!                        └─otherwise────────────────▶ Done(unavailable)
//! ```

use std::fmt;

use crate::app::models::RasterSource;
use crate::constants::archive;

/// Which daily archive to consult for a missing hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveAttempt {
    /// Archive published two days after the hour
    Primary,
    /// Archive published one day after the hour
    Fallback,
}

impl ArchiveAttempt {
    /// Days between the hour and the archive's publication day
    pub fn lag_days(self) -> i64 {
        match self {
            ArchiveAttempt::Primary => archive::PRIMARY_LAG_DAYS,
            ArchiveAttempt::Fallback => archive::FALLBACK_LAG_DAYS,
        }
    }

    /// Attempt to make when this archive did not contain the hour
    pub fn next(self) -> Option<Self> {
        match self {
            ArchiveAttempt::Primary => Some(ArchiveAttempt::Fallback),
            ArchiveAttempt::Fallback => None,
        }
    }

    pub fn source(self) -> RasterSource {
        match self {
            ArchiveAttempt::Primary => RasterSource::ArchivePrimary,
            ArchiveAttempt::Fallback => RasterSource::ArchiveFallback,
        }
    }
}

/// State of one hour in the acquisition pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    CheckCache,
    LiveFetch,
    ArchiveFetch(ArchiveAttempt),
    /// Terminal; `Some` names where the raster came from
    Done(Option<RasterSource>),
}

impl AcquisitionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AcquisitionState::Done(_))
    }
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionState::CheckCache => write!(f, "check-cache"),
            AcquisitionState::LiveFetch => write!(f, "live-fetch"),
            AcquisitionState::ArchiveFetch(attempt) => {
                write!(f, "archive-fetch(+{}d)", attempt.lag_days())
            }
            AcquisitionState::Done(Some(source)) => write!(f, "done({:?})", source),
            AcquisitionState::Done(None) => write!(f, "done(unavailable)"),
        }
    }
}
