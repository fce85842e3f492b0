//! Per-day and per-iteration CSV output. Columns:
//! `Run,Day,<camelCased output variable names>`. Once-per-iteration
//! variables are written only on the row where the iteration ended; every
//! other row leaves that column empty.

use std::io::Write;

use crate::{
    error::SimResult,
    io::reporting::{Aggregation, OutputHandle},
    sim::DayReport,
};

/// camelCases a `module.variable` column name, e.g. `destruction-monitor
/// .peak-units-awaiting` -> `destructionMonitorPeakUnitsAwaiting`.
fn camel_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut capitalize_next = false;
    for ch in column.chars() {
        if ch == '.' || ch == '-' || ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Writes the per-day output table: one row per simulated day per
/// iteration, `Run,Day,<variables>`.
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
    outputs: Vec<OutputHandle>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(inner: W, outputs: Vec<OutputHandle>) -> SimResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        let mut header = vec!["Run".to_string(), "Day".to_string()];
        header.extend(outputs.iter().map(|o| camel_case(&o.column_name())));
        writer.write_record(&header)?;
        Ok(Self { writer, outputs })
    }

    pub fn write_iteration(&mut self, run: u64, reports: &[DayReport]) -> SimResult<()> {
        for report in reports {
            let mut row = vec![run.to_string(), report.day.to_string()];
            for handle in &self.outputs {
                let value = report
                    .values
                    .iter()
                    .find(|(name, _)| name == &handle.column_name())
                    .and_then(|(_, value)| *value);
                let cell = match (handle.aggregation, value) {
                    (Aggregation::PerIteration, Some(v)) if report.done => v.to_string(),
                    (Aggregation::PerIteration, _) => String::new(),
                    (Aggregation::Daily, Some(v)) => v.to_string(),
                    (Aggregation::Daily, None) => String::new(),
                };
                row.push(cell);
            }
            self.writer.write_record(&row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> SimResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod csv_writer_tests {
    use super::*;

    fn outputs() -> Vec<OutputHandle> {
        vec![
            OutputHandle::new("destruction-monitor", "units-awaiting", Aggregation::Daily),
            OutputHandle::new("destruction-monitor", "peak-units-awaiting", Aggregation::PerIteration),
        ]
    }

    fn report(day: u32, done: bool, units_awaiting: Option<f64>, peak: Option<f64>) -> DayReport {
        DayReport {
            day,
            done,
            values: vec![
                ("destruction-monitor.units-awaiting".to_string(), units_awaiting),
                ("destruction-monitor.peak-units-awaiting".to_string(), peak),
            ],
        }
    }

    #[test]
    fn camel_cases_dotted_and_hyphenated_column_names() {
        assert_eq!(camel_case("destruction-monitor.peak-units-awaiting"), "destructionMonitorPeakUnitsAwaiting");
        assert_eq!(camel_case("units-awaiting"), "unitsAwaiting");
    }

    #[test]
    fn header_row_is_run_day_then_camel_cased_columns() {
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf, outputs()).unwrap();
        let header = String::from_utf8(buf).unwrap();
        assert_eq!(header.trim(), "Run,Day,destructionMonitorUnitsAwaiting,destructionMonitorPeakUnitsAwaiting");
    }

    #[test]
    fn per_iteration_column_is_blank_except_on_the_done_row() {
        let mut buf = Vec::new();
        let mut writer = CsvWriter::new(&mut buf, outputs()).unwrap();
        writer
            .write_iteration(0, &[report(1, false, Some(2.0), Some(3.0)), report(2, true, Some(0.0), Some(3.0))])
            .unwrap();
        writer.flush().unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        lines.next(); // header
        assert_eq!(lines.next().unwrap(), "0,1,2,");
        assert_eq!(lines.next().unwrap(), "0,2,0,3");
    }
}

/// One row per iteration, once-per-iteration variables only — a convenience
/// summary table alongside the full per-day writer (supplements the spec:
/// the original engine's full-table-writer has an analogous once-per-
/// iteration summary table).
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
    outputs: Vec<OutputHandle>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(inner: W, outputs: Vec<OutputHandle>) -> SimResult<Self> {
        let per_iteration: Vec<_> = outputs
            .into_iter()
            .filter(|o| o.aggregation == Aggregation::PerIteration)
            .collect();
        let mut writer = csv::Writer::from_writer(inner);
        let mut header = vec!["Run".to_string()];
        header.extend(per_iteration.iter().map(|o| camel_case(&o.column_name())));
        writer.write_record(&header)?;
        Ok(Self {
            writer,
            outputs: per_iteration,
        })
    }

    pub fn write_iteration(&mut self, run: u64, reports: &[DayReport]) -> SimResult<()> {
        let Some(last) = reports.last() else {
            return Ok(());
        };
        let mut row = vec![run.to_string()];
        for handle in &self.outputs {
            let value = last
                .values
                .iter()
                .find(|(name, _)| name == &handle.column_name())
                .and_then(|(_, value)| *value);
            row.push(value.map(|v| v.to_string()).unwrap_or_default());
        }
        self.writer.write_record(&row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> SimResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
