//! Newest-record-per-category extraction over a reverse scan.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::reverse::{DEFAULT_BLOCK_SIZE, ReverseLineReader};
use crate::error::ReadError;
use crate::model::{Category, CategoryPayload, CategorySet, LogRecord};

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Newest payload seen per category. Categories with no record in the
    /// scanned region are absent.
    pub payloads: BTreeMap<Category, CategoryPayload>,
    /// Non-blank lines looked at.
    pub lines_scanned: u64,
    /// Lines that were not a JSON object (partial writes, garbage).
    pub malformed_lines: u64,
    /// Every tracked category was resolved.
    pub complete: bool,
}

impl Extraction {
    pub fn get(&self, category: Category) -> Option<&CategoryPayload> {
        self.payloads.get(&category)
    }

    pub fn is_resolved(&self, category: Category) -> bool {
        self.payloads.contains_key(&category)
    }
}

/// Scans a fact log from its end and keeps the first (newest) payload per
/// tracked category.
#[derive(Debug, Clone)]
pub struct LatestRecordExtractor {
    block_size: usize,
}

impl Default for LatestRecordExtractor {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl LatestRecordExtractor {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    /// Extract the newest payload for every category in `tracked`.
    ///
    /// Stops as soon as all tracked categories are resolved, otherwise scans
    /// to the start of the file. Malformed lines are skipped.
    pub fn extract(
        &self,
        path: impl AsRef<Path>,
        tracked: &CategorySet,
    ) -> Result<Extraction, ReadError> {
        self.extract_while(path, tracked, |_| true)
    }

    /// Like [`extract`](Self::extract), but also stops once `keep_going`
    /// returns false. The predicate sees the partial result after each line.
    pub fn extract_while<F>(
        &self,
        path: impl AsRef<Path>,
        tracked: &CategorySet,
        mut keep_going: F,
    ) -> Result<Extraction, ReadError>
    where
        F: FnMut(&Extraction) -> bool,
    {
        let path = path.as_ref();
        let mut extraction = Extraction::default();

        if tracked.is_empty() {
            extraction.complete = true;
            return Ok(extraction);
        }

        let reader = ReverseLineReader::open(path)?.with_block_size(self.block_size);
        reader.for_each_line_from_end(|line| {
            extraction.lines_scanned += 1;

            let Some(record) = LogRecord::parse(line) else {
                extraction.malformed_lines += 1;
                return keep_going(&extraction);
            };

            for category in tracked.iter() {
                if extraction.is_resolved(category) {
                    continue;
                }
                if let Some(payload) = record.payload(category) {
                    extraction.payloads.insert(category, payload);
                }
            }

            if extraction.payloads.len() == tracked.len() {
                extraction.complete = true;
                return false;
            }

            keep_going(&extraction)
        })?;

        debug!(
            "Extracted {}/{} categories from {} ({} lines, {} malformed)",
            extraction.payloads.len(),
            tracked.len(),
            path.display(),
            extraction.lines_scanned,
            extraction.malformed_lines
        );

        Ok(extraction)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, lines: &[String]) -> std::path::PathBuf {
        let path = dir.path().join("kFacts.json");
        let mut file = fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    fn player_and_train() -> CategorySet {
        [Category::Player, Category::Train].into_iter().collect()
    }

    #[test]
    fn test_newest_record_per_category() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[
                r#"{"player_information":{"timestamp":1,"data":"A"}}"#.to_string(),
                r#"{"train_information":{"timestamp":2,"data":"B"}}"#.to_string(),
                r#"{"player_information":{"timestamp":5,"data":"C"}}"#.to_string(),
            ],
        );

        let extraction = LatestRecordExtractor::default()
            .extract(&path, &player_and_train())
            .unwrap();

        assert_eq!(
            extraction.get(Category::Player),
            Some(&CategoryPayload::new(5, "C"))
        );
        assert_eq!(
            extraction.get(Category::Train),
            Some(&CategoryPayload::new(2, "B"))
        );
        assert!(extraction.complete);
        // Stopped once both categories were found.
        assert_eq!(extraction.lines_scanned, 2);
    }

    #[test]
    fn test_max_timestamp_in_large_log() {
        let temp_dir = TempDir::new().unwrap();
        let lines: Vec<String> = (1..=2_000)
            .map(|ts| json!({"turret_information": {"timestamp": ts, "data": {"n": ts}}}).to_string())
            .collect();
        let path = write_log(&temp_dir, &lines);

        let tracked: CategorySet = [Category::Turret].into_iter().collect();
        let extraction = LatestRecordExtractor::new(512)
            .extract(&path, &tracked)
            .unwrap();

        let payload = extraction.get(Category::Turret).unwrap();
        assert_eq!(payload.timestamp, 2_000);
        assert_eq!(payload.data, json!({"n": 2000}));
    }

    #[test]
    fn test_partial_results() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[r#"{"player_information":{"timestamp":1,"data":[]}}"#.to_string()],
        );

        let extraction = LatestRecordExtractor::default()
            .extract(&path, &CategorySet::all())
            .unwrap();

        assert!(extraction.is_resolved(Category::Player));
        assert!(!extraction.is_resolved(Category::Turret));
        assert!(!extraction.complete);
    }

    #[test]
    fn test_malformed_line_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let valid = vec![
            r#"{"player_information":{"timestamp":1,"data":"A"}}"#.to_string(),
            r#"{"train_information":{"timestamp":2,"data":"B"}}"#.to_string(),
            r#"{"player_information":{"timestamp":3,"data":"C"}}"#.to_string(),
        ];
        let mut with_garbage = valid.clone();
        with_garbage.insert(2, r#"{"player_information":{"timestamp":9,"da"#.to_string());
        with_garbage.push(r#"{"train_informa"#.to_string());

        let clean_path = write_log(&temp_dir, &valid);
        let clean = LatestRecordExtractor::default()
            .extract(&clean_path, &player_and_train())
            .unwrap();

        let dirty_dir = TempDir::new().unwrap();
        let dirty_path = write_log(&dirty_dir, &with_garbage);
        let dirty = LatestRecordExtractor::default()
            .extract(&dirty_path, &player_and_train())
            .unwrap();

        assert_eq!(clean.payloads, dirty.payloads);
        assert_eq!(dirty.malformed_lines, 2);
    }

    #[test]
    fn test_keep_going_predicate_stops_scan() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[
                r#"{"train_information":{"timestamp":1,"data":"old"}}"#.to_string(),
                r#"{"player_information":{"timestamp":2,"data":"p"}}"#.to_string(),
                "not json".to_string(),
            ],
        );

        let extraction = LatestRecordExtractor::default()
            .extract_while(&path, &player_and_train(), |partial| partial.lines_scanned < 2)
            .unwrap();

        assert_eq!(extraction.lines_scanned, 2);
        assert!(extraction.is_resolved(Category::Player));
        assert!(!extraction.is_resolved(Category::Train));
    }

    #[test]
    fn test_missing_log_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = LatestRecordExtractor::default()
            .extract(temp_dir.path().join("absent.json"), &CategorySet::all());

        assert!(matches!(result, Err(ReadError::Open { .. })));
    }
}
