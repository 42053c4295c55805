use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use xval::{FoldedFrame, Frame};

/// Name of the integer fold column appended by `split` and consumed by
/// `train`.
pub const FOLD_COLUMN: &str = "kfold";

/// A dataset read from CSV, keeping the source header order so the file
/// can be written back with the fold column appended at the end.
#[derive(Debug)]
pub struct CsvDataset {
    pub frame: Frame<String, f64>,
    /// Header row of the source file, without the fold column.
    pub headers: Vec<String>,
}

/// Reads a labeled dataset from a CSV file.
///
/// Every column except the label column is parsed as a feature value; an
/// existing fold column is dropped so a re-split starts clean, matching
/// the overwrite semantics of assignment.
pub fn read_dataset(path: &Path, label: &str) -> Result<CsvDataset> {
    let file =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_dataset_from(file, label)
        .with_context(|| format!("while reading {}", path.display()))
}

fn read_dataset_from(reader: impl Read, label: &str) -> Result<CsvDataset> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let all_headers: Vec<String> = csv_reader
        .headers()
        .context("missing header row")?
        .iter()
        .map(str::to_string)
        .collect();
    let label_idx = all_headers
        .iter()
        .position(|h| h == label)
        .with_context(|| format!("label column '{}' not found", label))?;
    let fold_idx = all_headers.iter().position(|h| h == FOLD_COLUMN);
    if fold_idx.is_some() {
        log::warn!("dropping existing '{}' column", FOLD_COLUMN);
    }

    let headers: Vec<String> = all_headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| Some(i) != fold_idx)
        .map(|(_, h)| h.clone())
        .collect();
    let feature_names: Vec<String> = all_headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != label_idx && Some(i) != fold_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut values: Vec<f64> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("row {}", row + 1))?;
        for (i, field) in record.iter().enumerate() {
            if i == label_idx {
                labels.push(field.to_string());
            } else if Some(i) != fold_idx {
                let value: f64 = field.parse().with_context(|| {
                    format!(
                        "row {}, column '{}': '{}' is not a number",
                        row + 1,
                        all_headers[i],
                        field
                    )
                })?;
                values.push(value);
            }
        }
    }

    let n_rows = labels.len();
    let features = Array2::from_shape_vec((n_rows, feature_names.len()), values)?;
    let frame = Frame::new(feature_names, label, features, labels)?;
    Ok(CsvDataset { frame, headers })
}

/// Reads a fold-augmented dataset written by `split`.
///
/// The fold count is taken as the largest fold id plus one; the fold
/// column itself is validated when the [`FoldedFrame`] is built.
pub fn read_folded(path: &Path, label: &str) -> Result<FoldedFrame<String, f64>> {
    let file =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_folded_from(file, label)
        .with_context(|| format!("while reading {}", path.display()))
}

fn read_folded_from(reader: impl Read, label: &str) -> Result<FoldedFrame<String, f64>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let all_headers: Vec<String> = csv_reader
        .headers()
        .context("missing header row")?
        .iter()
        .map(str::to_string)
        .collect();
    let label_idx = all_headers
        .iter()
        .position(|h| h == label)
        .with_context(|| format!("label column '{}' not found", label))?;
    let fold_idx = all_headers
        .iter()
        .position(|h| h == FOLD_COLUMN)
        .with_context(|| format!("fold column '{}' not found", FOLD_COLUMN))?;
    let feature_names: Vec<String> = all_headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != label_idx && i != fold_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut values: Vec<f64> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut fold_ids: Vec<i64> = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("row {}", row + 1))?;
        for (i, field) in record.iter().enumerate() {
            if i == label_idx {
                labels.push(field.to_string());
            } else if i == fold_idx {
                let id: i64 = field.parse().with_context(|| {
                    format!("row {}: fold id '{}' is not an integer", row + 1, field)
                })?;
                fold_ids.push(id);
            } else {
                let value: f64 = field.parse().with_context(|| {
                    format!(
                        "row {}, column '{}': '{}' is not a number",
                        row + 1,
                        all_headers[i],
                        field
                    )
                })?;
                values.push(value);
            }
        }
    }
    if labels.is_empty() {
        bail!("input contains no rows");
    }

    let features = Array2::from_shape_vec((labels.len(), feature_names.len()), values)?;
    let frame = Frame::new(feature_names, label, features, labels)?;
    // Largest fold id determines k; FoldedFrame::new rejects sentinels and
    // out-of-range ids.
    let k = fold_ids.iter().copied().max().unwrap_or(-1) + 1;
    let folded = FoldedFrame::new(frame, fold_ids, k.max(0) as usize)?;
    Ok(folded)
}

/// Writes the dataset back out with the fold column appended.
///
/// Columns keep the source file's order; `kfold` goes last.
pub fn write_folds(
    path: &Path,
    folded: &FoldedFrame<String, f64>,
    headers: &[String],
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    write_folds_to(file, folded, headers)
        .with_context(|| format!("while writing {}", path.display()))
}

fn write_folds_to(
    writer: impl Write,
    folded: &FoldedFrame<String, f64>,
    headers: &[String],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut out_headers = headers.to_vec();
    out_headers.push(FOLD_COLUMN.to_string());
    csv_writer.write_record(&out_headers)?;

    let frame = folded.frame();
    let features = frame.features();
    for row in 0..frame.n_rows() {
        let mut record: Vec<String> = Vec::with_capacity(out_headers.len());
        let mut feature = 0;
        for header in headers {
            if header == frame.label_name() {
                record.push(frame.labels()[row].clone());
            } else {
                record.push(features[[row, feature]].to_string());
                feature += 1;
            }
        }
        record.push(folded.fold_of(row).to_string());
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
