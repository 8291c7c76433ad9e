// Report emission: the three CSV dumps and the SVG chart files.

pub mod charts;
pub mod svg;

use crate::metrics::{bytes_to_petabytes, bytes_to_terabytes};
use crate::models::{DailyStatsRow, DumpTotals, MonthlyStatsRow, ProjectStatsRow};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: PathBuf::from(output_dir),
        })
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// stats.csv: one row per (day, project, configuration) group, plus
    /// running totals for the log.
    pub fn write_daily_stats(
        &self,
        filename: &str,
        rows: &[DailyStatsRow],
    ) -> anyhow::Result<DumpTotals> {
        let mut w = self.open(filename)?;
        writeln!(
            w,
            "date,projid,config,time(s),archived(bytes),deleted(bytes),time(hours),archived(TB)"
        )?;

        let mut totals = DumpTotals::default();
        for row in rows {
            let hours = row.duration_secs as f64 / 3600.0;
            let terabytes = bytes_to_terabytes(Some(row.archived_bytes as i64));
            totals.rows += 1;
            totals.total_secs += row.duration_secs;
            totals.total_bytes += row.archived_bytes;
            totals.deleted_bytes += row.deleted_bytes;
            writeln!(
                w,
                "{},{},{},{},{},{},{},{}",
                csv_field(&row.date),
                csv_field(&row.project_id),
                csv_field(&row.array_configuration),
                row.duration_secs,
                row.archived_bytes,
                row.deleted_bytes,
                hours,
                terabytes
            )?;
        }
        w.flush()?;

        tracing::info!(
            rows = totals.rows,
            file = filename,
            total_pb = bytes_to_petabytes(Some(totals.total_bytes as i64)),
            total_hours = totals.total_secs as f64 / 3600.0,
            deleted_pb = bytes_to_petabytes(Some(totals.deleted_bytes as i64)),
            "daily stats written"
        );
        Ok(totals)
    }

    /// stats_by_month.csv with the derived duty-cycle columns.
    pub fn write_monthly_stats(
        &self,
        filename: &str,
        rows: &[MonthlyStatsRow],
    ) -> anyhow::Result<()> {
        let mut w = self.open(filename)?;
        writeln!(w, "year,month,hrs,TB,avail_hrs,duty_cycle")?;
        for row in rows {
            writeln!(
                w,
                "{},{},{},{},{},{}",
                row.year, row.month, row.hours, row.terabytes, row.available_hours, row.duty_cycle
            )?;
        }
        w.flush()?;
        tracing::info!(rows = rows.len(), file = filename, "monthly stats written");
        Ok(())
    }

    /// stats_by_project.csv, descending by volume.
    pub fn write_project_stats(
        &self,
        filename: &str,
        rows: &[ProjectStatsRow],
    ) -> anyhow::Result<()> {
        let mut w = self.open(filename)?;
        writeln!(w, "projid,projname,TB")?;
        for row in rows {
            writeln!(
                w,
                "{},{},{}",
                csv_field(&row.project_id),
                csv_field(&row.project_shortname),
                bytes_to_terabytes(Some(row.archived_bytes as i64))
            )?;
        }
        w.flush()?;
        tracing::info!(rows = rows.len(), file = filename, "project stats written");
        Ok(())
    }

    pub fn write_svg(&self, filename: &str, content: &str) -> anyhow::Result<()> {
        let path = self.path(filename);
        std::fs::write(&path, content)?;
        tracing::info!(file = %path.display(), "chart written");
        Ok(())
    }

    fn open(&self, filename: &str) -> anyhow::Result<BufWriter<File>> {
        let path = self.path(filename);
        Ok(BufWriter::new(File::create(&path)?))
    }
}

/// Minimal CSV quoting: wrap fields containing a comma, quote, or newline.
pub fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Read back a CSV written by this module (used by the science-theme
/// reports, which take stats_by_project.csv as input).
pub fn read_project_csv(path: &Path) -> anyhow::Result<Vec<(String, String, f64)>> {
    let content = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for line in content.lines().skip(1) {
        let fields = split_csv_line(line);
        if fields.len() != 3 {
            anyhow::bail!("malformed project stats row: {line:?}");
        }
        let tb: f64 = fields[2].parse()?;
        out.push((fields[0].clone(), fields[1].clone(), tb));
    }
    Ok(out)
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
