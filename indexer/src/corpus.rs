use anyhow::{bail, Context, Result};
use jobrec_core::posting::postings_from_records;
use jobrec_core::{Error, JobPosting};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load every posting under `input`, a `.json`/`.jsonl` file or a directory of them.
///
/// Files are read in file-name order so the same snapshot always yields the
/// same row order. Symlinks are followed; any entry the walk cannot read fails
/// the whole load.
pub fn load_corpus(input: &Path) -> Result<Vec<JobPosting>> {
    let files = collect_files(input)?;
    let mut records: Vec<Value> = Vec::new();
    for file in &files {
        let before = records.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(file, &mut records)?;
        } else {
            read_json(file, &mut records)?;
        }
        tracing::debug!(file = %file.display(), records = records.len() - before, "read corpus file");
    }
    tracing::info!(files = files.len(), records = records.len(), "loaded corpus");
    Ok(postings_from_records(records)?)
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("corpus input {} does not exist", input.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking corpus directory {}", input.display()))?;
        let p = entry.path();
        if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

fn read_jsonl(file: &Path, records: &mut Vec<Value>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", file.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|e| Error::Corpus {
            location: format!("{}:{}", file.display(), i + 1),
            reason: e.to_string(),
        })?;
        records.push(value);
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<Value>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: Value = serde_json::from_reader(BufReader::new(f))
        .map_err(|e| Error::Corpus { location: file.display().to_string(), reason: e.to_string() })?;
    match json {
        Value::Array(arr) => records.extend(arr),
        obj @ Value::Object(_) => records.push(obj),
        _ => {
            return Err(Error::Corpus {
                location: file.display().to_string(),
                reason: "expected a JSON array or object".into(),
            }
            .into())
        }
    }
    Ok(())
}
