//! `;`-separated result tables.
//!
//! Field order, header names and number formatting are fixed so existing
//! consumers of the tables keep working.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{Datelike, Timelike};

use crate::error::Result;
use crate::sim::records::ExposureRecord;
use crate::sim::spatial::{MapBounds, PlanningArea};

pub const EXPOSURE_HEADER: &str =
    "Planungsraum;Datum;Uhrzeit;Sonnenanteil;Gebäudeanzahl;Gebäudefläche";
pub const COVERAGE_HEADER: &str = "Planungsraum;Lage";

/// One table row: `name;D/M/YYYY;H:M:00;pct;count;area`.
///
/// Date and time fields are not zero-padded.
pub fn format_exposure_row(record: &ExposureRecord) -> String {
    let t = &record.timestamp;
    format!(
        "{};{}/{}/{};{}:{}:00;{:.2};{};{:.2}",
        record.area,
        t.day(),
        t.month(),
        t.year(),
        t.hour(),
        t.minute(),
        record.exposure_percentage,
        record.building_count,
        record.total_area
    )
}

/// Writes exposure records row by row, header first.
pub struct ExposureCsvWriter<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> ExposureCsvWriter<W> {
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", EXPOSURE_HEADER)?;
        Ok(Self { out, rows: 0 })
    }

    pub fn write_record(&mut self, record: &ExposureRecord) -> Result<()> {
        writeln!(self.out, "{}", format_exposure_row(record))?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_records(&mut self, records: &[ExposureRecord]) -> Result<()> {
        records.iter().try_for_each(|r| self.write_record(r))
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ExposureCsvWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and writes the header.
    ///
    /// # Example
    /// ```no_run
    /// use exposure3d::io::ExposureCsvWriter;
    /// use std::path::Path;
    ///
    /// let mut writer = ExposureCsvWriter::create(Path::new("SunExposure_All.csv")).unwrap();
    /// writer.flush().unwrap();
    /// ```
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

/// Writes the map coverage table: `1` when an area lies fully on the map,
/// `0` otherwise.
pub fn write_coverage<W: Write>(mut out: W, areas: &[PlanningArea], map: &MapBounds) -> Result<()> {
    writeln!(out, "{}", COVERAGE_HEADER)?;
    for area in areas {
        let on_map = if map.contains_polygon(area) { 1 } else { 0 };
        writeln!(out, "{};{}", area.name, on_map)?;
    }
    out.flush()?;
    Ok(())
}
