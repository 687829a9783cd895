use {
    anyhow::{Context, Result},
    serde::Serialize,
    std::{fs, io::Write, path::Path},
};

/// Writes `records` as CSV with a header row taken from their field names.
pub fn write_records<T: Serialize, W: Write>(w: W, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `records` to `path`, creating its parent directory.
pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, records: &[T]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_records(file, records).with_context(|| format!("Failed to write {}", path.display()))
}
