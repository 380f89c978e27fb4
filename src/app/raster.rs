//! ESRI ASCII grid decoding
//!
//! RainGRS hourly files carry a six line `KEY VALUE` header followed by
//! `nrows` lines of `ncols` whitespace separated values. Cells equal to the
//! header's `NODATA_value` are stored as `None`.

use serde::{Deserialize, Serialize};

use crate::app::models::GridCell;
use crate::errors::{ExtractionError, ExtractionResult, RasterError, RasterResult};

/// Header keys in the order they must appear
const HEADER_KEYS: [&str; 6] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "cellsize",
    "NODATA_value",
];

/// Raster metadata from the file header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterHeader {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata_value: f64,
}

/// Decoded raster with sentinel cells masked out
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    header: RasterHeader,
    cells: Vec<Option<f64>>,
}

impl RasterGrid {
    /// Parse an ESRI ASCII grid
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::MalformedHeader`] if any of the six header lines
    /// is missing, out of order or unparsable, and
    /// [`RasterError::MalformedData`] if the body does not hold exactly
    /// `nrows * ncols` numbers.
    pub fn parse(content: &str) -> RasterResult<Self> {
        let mut lines = content.lines();
        let header = parse_header(&mut lines)?;

        let expected = header.nrows.checked_mul(header.ncols).ok_or_else(|| {
            RasterError::MalformedHeader {
                line: 2,
                reason: format!("grid of {} x {} is too large", header.nrows, header.ncols),
            }
        })?;

        let mut cells = Vec::with_capacity(expected);
        for (index, token) in lines.flat_map(str::split_whitespace).enumerate() {
            if index >= expected {
                return Err(RasterError::MalformedData {
                    reason: format!("more than the {} values declared by the header", expected),
                });
            }
            let value: f64 = token.parse().map_err(|_| RasterError::MalformedData {
                reason: format!(
                    "invalid value '{}' at row {}, column {}",
                    token,
                    index / header.ncols,
                    index % header.ncols
                ),
            })?;
            cells.push(if value == header.nodata_value {
                None
            } else {
                Some(value)
            });
        }

        if cells.len() != expected {
            return Err(RasterError::MalformedData {
                reason: format!(
                    "expected {} values ({} rows x {} columns), found {}",
                    expected,
                    header.nrows,
                    header.ncols,
                    cells.len()
                ),
            });
        }

        Ok(Self { header, cells })
    }

    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    pub fn nrows(&self) -> usize {
        self.header.nrows
    }

    pub fn ncols(&self) -> usize {
        self.header.ncols
    }

    /// Value at a cell, `Ok(None)` for no-data cells
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::OutOfBoundsCell`] if the cell lies outside
    /// the raster.
    pub fn value_at(&self, cell: GridCell) -> ExtractionResult<Option<f64>> {
        let out_of_bounds = || ExtractionError::OutOfBoundsCell {
            row: cell.row,
            col: cell.col,
            nrows: self.header.nrows,
            ncols: self.header.ncols,
        };

        let row = usize::try_from(cell.row).map_err(|_| out_of_bounds())?;
        let col = usize::try_from(cell.col).map_err(|_| out_of_bounds())?;
        if row >= self.header.nrows || col >= self.header.ncols {
            return Err(out_of_bounds());
        }

        Ok(self.cells[row * self.header.ncols + col])
    }
}

fn parse_header<'a>(lines: &mut impl Iterator<Item = &'a str>) -> RasterResult<RasterHeader> {
    let mut values = [""; 6];
    for (index, key) in HEADER_KEYS.iter().enumerate() {
        let line_no = index + 1;
        let line = lines.next().ok_or_else(|| RasterError::MalformedHeader {
            line: line_no,
            reason: format!("missing '{}' line", key),
        })?;

        let mut tokens = line.split_whitespace();
        let (found_key, value) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(k), Some(v), None) => (k, v),
            _ => {
                return Err(RasterError::MalformedHeader {
                    line: line_no,
                    reason: format!("expected '{} VALUE', found '{}'", key, line.trim()),
                })
            }
        };
        if !found_key.eq_ignore_ascii_case(key) {
            return Err(RasterError::MalformedHeader {
                line: line_no,
                reason: format!("expected key '{}', found '{}'", key, found_key),
            });
        }
        values[index] = value;
    }

    Ok(RasterHeader {
        ncols: header_count(values[0], 1)?,
        nrows: header_count(values[1], 2)?,
        xllcorner: header_number(values[2], 3)?,
        yllcorner: header_number(values[3], 4)?,
        cellsize: header_number(values[4], 5)?,
        nodata_value: header_number(values[5], 6)?,
    })
}

fn header_count(value: &str, line: usize) -> RasterResult<usize> {
    match value.parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(RasterError::MalformedHeader {
            line,
            reason: format!("'{}' is not a positive integer", value),
        }),
    }
}

fn header_number(value: &str, line: usize) -> RasterResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RasterError::MalformedHeader {
            line,
            reason: format!("'{}' is not a number", value),
        })
}
