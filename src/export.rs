//! CSV export of spectra and asymmetry distances

use std::io;
use std::path::{Path, PathBuf};

use crate::asymmetry::AsymmetryReport;
use crate::error::Result;
use crate::spectrum::Spectra;

fn row_label(row: usize) -> String {
    match row {
        0 => "area".to_string(),
        1 => "volume".to_string(),
        n => format!("ev{}", n - 2),
    }
}

/// Path of the asymmetry table next to the eigenvalue table.
pub fn asymmetry_csv_path(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    csv_path.with_file_name(format!("{}.asymmetry.csv", stem))
}

/// Write spectra as one column per structure; rows `area`, `volume`,
/// `ev0`, `ev1`, ... Shorter columns are padded with empty cells.
pub fn write_spectra<W: io::Write>(wtr: &mut csv::Writer<W>, spectra: &Spectra) -> Result<()> {
    let mut header = vec!["row".to_string()];
    header.extend(spectra.keys().cloned());
    wtr.write_record(&header)?;

    let rows = spectra.values().map(Vec::len).max().unwrap_or(0);
    for row in 0..rows {
        let mut record = vec![row_label(row)];
        record.extend(
            spectra
                .values()
                .map(|values| values.get(row).map(f64::to_string).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write distances as a header of pair keys and a single row of values.
pub fn write_distances<W: io::Write>(wtr: &mut csv::Writer<W>, report: &AsymmetryReport) -> Result<()> {
    wtr.write_record(report.distances.keys())?;
    wtr.write_record(report.distances.values().map(f64::to_string))?;
    wtr.flush()?;
    Ok(())
}

fn render<F>(write: F) -> Result<String>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<()>,
{
    let mut wtr = csv::Writer::from_writer(Vec::new());
    write(&mut wtr)?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render the eigenvalue table in memory.
pub fn spectra_to_csv(spectra: &Spectra) -> Result<String> {
    render(|wtr| write_spectra(wtr, spectra))
}

/// Render the asymmetry table in memory.
pub fn distances_to_csv(report: &AsymmetryReport) -> Result<String> {
    render(|wtr| write_distances(wtr, report))
}

/// Write the eigenvalue table and, when given, the asymmetry table.
///
/// Returns the paths written.
pub fn export_results(
    csv_path: &Path,
    spectra: &Spectra,
    distances: Option<&AsymmetryReport>,
) -> Result<Vec<PathBuf>> {
    write_spectra(&mut csv::Writer::from_path(csv_path)?, spectra)?;
    let mut written = vec![csv_path.to_path_buf()];
    if let Some(report) = distances {
        let path = asymmetry_csv_path(csv_path);
        write_distances(&mut csv::Writer::from_path(&path)?, report)?;
        written.push(path);
    }
    Ok(written)
}
