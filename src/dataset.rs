use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Placeholder written for a field whose content is absent from a page.
pub const NOT_AVAILABLE: &str = "N/A";

/// One extracted listing. Column order in the dataset is fixed:
/// Name, Location, Activities, Address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub name: String,
    pub location: String,
    pub activities: String,
    pub address: String,
}

impl Record {
    /// A record with every field set to the sentinel, standing in for a
    /// detail page that could not be fetched.
    pub fn unavailable() -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            activities: NOT_AVAILABLE.to_string(),
            address: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Persists records by merging them into a single CSV file.
pub struct DatasetWriter;

impl DatasetWriter {
    /// Merges `records` into the file at `path`: prior rows keep their
    /// order and position, new rows are appended after them.
    ///
    /// The merged result is written to a temporary sibling and renamed
    /// into place, so a crash mid-write never corrupts the existing file.
    pub fn merge(path: &Path, records: &[Record]) -> Result<(), CrawlError> {
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(CrawlError::InvalidFormat {
                path: path.to_path_buf(),
            });
        }

        let prior = if path.exists() {
            Self::load(path)?
        } else {
            Vec::new()
        };

        if records.is_empty() {
            ::log::info!("No records to write to {:?}", path);
            return Ok(());
        }

        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for record in prior.iter().chain(records) {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;

        ::log::info!(
            "Wrote {} rows ({} prior + {} new) to {:?}",
            prior.len() + records.len(),
            prior.len(),
            records.len(),
            path
        );
        Ok(())
    }

    /// Loads the prior dataset. Any read or parse failure aborts the merge
    /// rather than silently overwriting data we could not read back.
    fn load(path: &Path) -> Result<Vec<Record>, CrawlError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| CrawlError::Merge {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            let record: Record = row.map_err(|e| CrawlError::Merge {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            rows.push(record);
        }
        Ok(rows)
    }
}

/// Rotates the previous run's output into the single backup slot before a
/// new run starts. An older backup is discarded.
pub fn rotate_backup(path: &Path, backup_path: &Path) -> Result<(), CrawlError> {
    if path.exists() {
        if backup_path.exists() {
            fs::remove_file(backup_path)?;
        }
        fs::rename(path, backup_path)?;
        ::log::info!("Backup created: {:?}", backup_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Record {
        Record {
            name: name.to_string(),
            location: "Forest of Dean".to_string(),
            activities: "Hiking, Stargazing".to_string(),
            address: "Gloucestershire".to_string(),
        }
    }

    fn count_rows(path: &Path) -> usize {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize::<Record>().count()
    }

    #[test]
    fn merge_appends_after_prior_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let batch = vec![record("a"), record("b"), record("c")];

        DatasetWriter::merge(&path, &batch).unwrap();
        DatasetWriter::merge(&path, &batch).unwrap();

        assert_eq!(count_rows(&path), 6);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let names: Vec<String> = reader
            .deserialize::<Record>()
            .map(|r| r.unwrap().name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn merge_preserves_initial_rows_before_both_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        DatasetWriter::merge(&path, &[record("initial")]).unwrap();
        let batch = vec![record("x"), record("y")];
        DatasetWriter::merge(&path, &batch).unwrap();
        DatasetWriter::merge(&path, &batch).unwrap();

        // initial + 2 * batch
        assert_eq!(count_rows(&path), 1 + 2 * 2);
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let first: Record = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(first.name, "initial");
    }

    #[test]
    fn empty_batch_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        DatasetWriter::merge(&path, &[record("a")]).unwrap();

        let before = fs::read(&path).unwrap();
        DatasetWriter::merge(&path, &[]).unwrap();
        let after = fs::read(&path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_batch_with_no_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        DatasetWriter::merge(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn rejects_non_csv_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let err = DatasetWriter::merge(&path, &[record("a")]).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidFormat { .. }));
    }

    #[test]
    fn unreadable_prior_file_aborts_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "Nope,Wrong\ngarbage,here\n").unwrap();
        let before = fs::read(&path).unwrap();

        let err = DatasetWriter::merge(&path, &[record("a")]).unwrap_err();
        assert!(matches!(err, CrawlError::Merge { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn column_order_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        DatasetWriter::merge(&path, &[record("a")]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "Name,Location,Activities,Address");
    }

    #[test]
    fn backup_rotation_uses_a_single_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let backup = dir.path().join("out_backup.csv");

        fs::write(&path, "first run\n").unwrap();
        rotate_backup(&path, &backup).unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "first run\n");

        fs::write(&path, "second run\n").unwrap();
        rotate_backup(&path, &backup).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "second run\n");
    }

    #[test]
    fn rotation_without_prior_output_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let backup = dir.path().join("out_backup.csv");
        rotate_backup(&path, &backup).unwrap();
        assert!(!backup.exists());
    }
}
