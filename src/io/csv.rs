//! Delimited-text point loader.

use mpase_core::{Error, PointSet, Result, MIN_CSV_POINTS};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Header names of the x, y and z columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvColumns {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self::new("middle_x", "middle_y", "middle_z")
    }
}

impl CsvColumns {
    pub fn new(x: impl Into<String>, y: impl Into<String>, z: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }
}

fn split_line(line: &str) -> Vec<&str> {
    line.split(',').map(|f| f.trim().trim_matches('"')).collect()
}

fn parse_cell(cell: &str, line_no: usize, column: &str) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let v: f64 = cell.parse().map_err(|_| {
        Error::Parse(format!("line {line_no}: column '{column}': bad number '{cell}'"))
    })?;
    Ok(v.is_finite().then_some(v))
}

/// Read the selected columns of a comma-separated table with a header row.
///
/// Rows where any selected cell is empty or NaN are dropped. Fewer than
/// `MIN_CSV_POINTS` remaining rows is an input error.
pub fn read_points<R: BufRead>(reader: R, label: &str, columns: &CsvColumns) -> Result<PointSet> {
    let mut lines = reader.lines();
    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(Error::invalid_input(format!("{label}: empty file"))),
        }
    };
    let names = split_line(header.trim_start_matches('\u{feff}'));
    let find = |name: &str| {
        names.iter().position(|n| *n == name).ok_or_else(|| {
            Error::invalid_input(format!("{label}: missing column '{name}'"))
        })
    };
    let idx = [find(&columns.x)?, find(&columns.y)?, find(&columns.z)?];
    let col_names = [&columns.x, &columns.y, &columns.z];

    let mut points = Vec::new();
    let mut dropped = 0usize;
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = i + 2;
        let cells = split_line(&line);
        let mut xyz = [0.0; 3];
        let mut complete = true;
        for k in 0..3 {
            match cells.get(idx[k]) {
                Some(cell) => match parse_cell(cell, line_no, col_names[k])? {
                    Some(v) => xyz[k] = v,
                    None => complete = false,
                },
                None => complete = false,
            }
        }
        if complete {
            points.push(Point3::new(xyz[0], xyz[1], xyz[2]));
        } else {
            dropped += 1;
        }
    }

    if points.len() < MIN_CSV_POINTS {
        return Err(Error::invalid_input(format!(
            "{label}: {} usable rows, need at least {MIN_CSV_POINTS}",
            points.len()
        )));
    }
    if dropped > 0 {
        tracing::debug!(label, dropped, "dropped incomplete rows");
    }
    Ok(PointSet::new(label, points))
}

/// Load a CSV file; the label is the file stem.
pub fn load_points(path: impl AsRef<Path>, columns: &CsvColumns) -> Result<PointSet> {
    let path = path.as_ref();
    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = File::open(path)?;
    read_points(BufReader::new(file), &label, columns)
}
