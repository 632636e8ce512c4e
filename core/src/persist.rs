use crate::error::{Error, Result};
use crate::index::{IndexHeader, JobIndex, FORMAT_VERSION};
use bincode::Options;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// First bytes of every index artifact.
pub const MAGIC: &[u8; 4] = b"JREC";
const PREAMBLE_LEN: usize = MAGIC.len() + 4;
/// Upper bound on the bytes `load_header` will decode after the preamble.
const HEADER_LIMIT: u64 = 64 * 1024;

type ArtifactWriter<'a> = BufWriter<&'a mut File>;

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// Write `index` to `path` as a single artifact.
///
/// The bytes go to a temporary file next to `path` which is then renamed over
/// it, so readers see either the previous artifact or the new one in full.
pub fn save_index<P: AsRef<Path>>(path: P, index: &JobIndex) -> Result<()> {
    let path = path.as_ref();
    replace_atomically(path, |w| {
        w.write_all(MAGIC).map_err(|e| Error::storage(path, e))?;
        w.write_all(&FORMAT_VERSION.to_le_bytes()).map_err(|e| Error::storage(path, e))?;
        codec().serialize_into(w, index).map_err(|e| Error::storage(path, e))
    })?;
    tracing::info!(path = %path.display(), num_postings = index.len(), num_terms = index.dims(), "saved index");
    Ok(())
}

/// Run `write` against a temp file in the target directory and rename it over
/// `path` only if every byte made it to disk. On error the temp file is removed.
fn replace_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut ArtifactWriter<'_>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::storage(dir, e))?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        write(&mut w)?;
        w.flush().map_err(|e| Error::storage(path, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| Error::storage(path, e))?;
    tmp.persist(path).map_err(|e| Error::storage(path, e.error))?;
    Ok(())
}

/// Load and validate a full index. Any defect is reported as [`Error::Storage`];
/// nothing partially decoded is ever returned.
pub fn load_index<P: AsRef<Path>>(path: P) -> Result<JobIndex> {
    let path = path.as_ref();
    let mut f = File::open(path).map_err(|e| Error::storage(path, e))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(|e| Error::storage(path, e))?;
    if buf.len() < PREAMBLE_LEN {
        return Err(Error::storage(path, "not an index artifact (bad magic)"));
    }
    check_preamble(&buf[..PREAMBLE_LEN], path)?;

    let payload = &buf[PREAMBLE_LEN..];
    let index: JobIndex = codec()
        .with_limit(payload.len() as u64)
        .deserialize(payload)
        .map_err(|e| Error::storage(path, format!("corrupt index payload: {e}")))?;
    index.check_consistency().map_err(|reason| Error::storage(path, reason))?;
    tracing::info!(path = %path.display(), num_postings = index.len(), num_terms = index.dims(), "loaded index");
    Ok(index)
}

/// Load only the header. Reads the preamble and a bounded prefix of the
/// payload; the vocabulary and matrix are never read from disk.
pub fn load_header<P: AsRef<Path>>(path: P) -> Result<IndexHeader> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| Error::storage(path, e))?;
    let mut reader = BufReader::new(f);
    let mut preamble = [0u8; PREAMBLE_LEN];
    reader
        .read_exact(&mut preamble)
        .map_err(|_| Error::storage(path, "not an index artifact (bad magic)"))?;
    check_preamble(&preamble, path)?;
    codec()
        .with_limit(HEADER_LIMIT)
        .allow_trailing_bytes()
        .deserialize_from(reader.take(HEADER_LIMIT))
        .map_err(|e| Error::storage(path, format!("corrupt index header: {e}")))
}

fn check_preamble(preamble: &[u8], path: &Path) -> Result<()> {
    if &preamble[..MAGIC.len()] != MAGIC {
        return Err(Error::storage(path, "not an index artifact (bad magic)"));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&preamble[MAGIC.len()..PREAMBLE_LEN]);
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(Error::storage(path, format!("unsupported format version {version} (expected {FORMAT_VERSION})")));
    }
    Ok(())
}
