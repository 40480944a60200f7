//! CSV dataset loader
//!
//! Reads every configured source once at startup. Any missing file or
//! required column aborts startup; nothing is re-read afterwards.

use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tacit_common::config::{ColumnConfig, DatasetSource, SourceRole};
use tacit_common::labels::{is_sentinel, parse_labels};
use tacit_common::{Error, Result};
use tracing::{debug, info};

use super::{Dataset, Row};

/// Column positions resolved from one file's header row
struct ColumnIndex {
    sentence: usize,
    labels: Option<usize>,
    essay_id: Option<usize>,
}

/// Builds a [`Dataset`] from CSV sources
pub struct DatasetLoader<'a> {
    columns: &'a ColumnConfig,
}

impl<'a> DatasetLoader<'a> {
    pub fn new(columns: &'a ColumnConfig) -> Self {
        Self { columns }
    }

    /// Load and merge all sources in order
    pub fn load(&self, sources: &[DatasetSource]) -> Result<Dataset> {
        let mut rows = Vec::new();
        for source in sources {
            let loaded = self.load_source(source)?;
            info!(
                "Loaded {} sentences from {} ({:?})",
                loaded.len(),
                source.path.display(),
                source.role
            );
            rows.extend(loaded);
        }

        let dataset = Dataset::from_rows(rows);
        info!(
            "Dataset ready: {} sentences from {} file(s)",
            dataset.len(),
            sources.len()
        );
        Ok(dataset)
    }

    fn load_source(&self, source: &DatasetSource) -> Result<Vec<Row>> {
        if !source.path.exists() {
            return Err(Error::MissingFile(source.path.clone()));
        }

        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&source.path)?;
        self.read_rows(reader, &source.path, &source.role)
    }

    /// Parse rows from an open CSV reader
    ///
    /// `path` is only used for error messages.
    pub fn read_rows<R: Read>(
        &self,
        mut reader: csv::Reader<R>,
        path: &Path,
        role: &SourceRole,
    ) -> Result<Vec<Row>> {
        let headers = reader.headers()?.clone();
        let index = self.index_columns(&headers, path, role)?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for (line, record) in reader.records().enumerate() {
            let record = record?;

            let sentence = record.get(index.sentence).unwrap_or("").trim();
            if sentence.is_empty() {
                debug!("Skipping blank sentence at {}:{}", path.display(), line + 2);
                skipped += 1;
                continue;
            }

            let raw_labels = index
                .labels
                .and_then(|i| record.get(i))
                .unwrap_or("");
            let labels = match role {
                SourceRole::Labeled => parse_labels(raw_labels),
                SourceRole::Unlabeled => Vec::new(),
                SourceRole::Category(name) if is_sentinel(name) => Vec::new(),
                SourceRole::Category(name) => {
                    let mut labels = parse_labels(raw_labels);
                    if !labels.iter().any(|l| l == name) {
                        labels.push(name.clone());
                    }
                    labels
                }
            };

            let essay_id = index
                .essay_id
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);

            rows.push(Row::new(sentence, labels, essay_id));
        }

        if skipped > 0 {
            info!(
                "Skipped {} row(s) with blank sentences in {}",
                skipped,
                path.display()
            );
        }
        Ok(rows)
    }

    fn index_columns(
        &self,
        headers: &StringRecord,
        path: &Path,
        role: &SourceRole,
    ) -> Result<ColumnIndex> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let missing = |column: &str| Error::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        };

        let sentence = position(self.columns.sentence.as_str())
            .ok_or_else(|| missing(self.columns.sentence.as_str()))?;

        let labels = match role {
            SourceRole::Labeled => Some(
                position(self.columns.labels.as_str())
                    .ok_or_else(|| missing(self.columns.labels.as_str()))?,
            ),
            SourceRole::Category(name) if is_sentinel(name) => None,
            SourceRole::Category(_) => position(self.columns.labels.as_str()),
            SourceRole::Unlabeled => None,
        };

        Ok(ColumnIndex {
            sentence,
            labels,
            essay_id: position(self.columns.essay_id.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tacit_common::CategoryGroup;
    use tempfile::NamedTempFile;

    fn csv_reader(body: &str) -> csv::Reader<&[u8]> {
        ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes())
    }

    fn write_csv(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_labeled_rows_are_normalized() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let body = "sentence,cct_labels,essay_id\n\
                    I will make my family proud,\"Familial, Spiritual\",e1\n\
                    Just a sentence,,e2\n\
                    Another,Class 0,\n";

        let rows = loader
            .read_rows(csv_reader(body), Path::new("test.csv"), &SourceRole::Labeled)
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].labels, vec!["Familial", "Spiritual"]);
        assert_eq!(rows[0].category_group, CategoryGroup::Cct);
        assert_eq!(rows[0].essay_id.as_deref(), Some("e1"));
        assert!(rows[1].labels.is_empty());
        assert_eq!(rows[1].category_group, CategoryGroup::Class0);
        assert_eq!(rows[2].category_group, CategoryGroup::Class0);
        assert_eq!(rows[2].essay_id, None);
    }

    #[test]
    fn test_blank_sentences_skipped() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let body = "sentence,cct_labels\n   ,Social\nKept,Social\n";

        let rows = loader
            .read_rows(csv_reader(body), Path::new("test.csv"), &SourceRole::Labeled)
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sentence, "Kept");
    }

    #[test]
    fn test_unlabeled_rows_ignore_label_column() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let body = "sentence,cct_labels\nNo label example,Familial\n";

        let rows = loader
            .read_rows(csv_reader(body), Path::new("none.csv"), &SourceRole::Unlabeled)
            .unwrap();

        assert!(rows[0].labels.is_empty());
        assert_eq!(rows[0].category_group, CategoryGroup::Class0);
    }

    #[test]
    fn test_category_rows_carry_category_label() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let body = "sentence\nMy grandmother taught me to pray\n";

        let rows = loader
            .read_rows(
                csv_reader(body),
                Path::new("spiritual.csv"),
                &SourceRole::Category("Spiritual".to_string()),
            )
            .unwrap();

        assert_eq!(rows[0].labels, vec!["Spiritual"]);
        assert_eq!(rows[0].category_group, CategoryGroup::Cct);
    }

    #[test]
    fn test_missing_sentence_column_fails() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let body = "text,cct_labels\nhello,Social\n";

        let err = loader
            .read_rows(csv_reader(body), Path::new("bad.csv"), &SourceRole::Labeled)
            .unwrap_err();

        match err {
            Error::MissingColumn { column, .. } => assert_eq!(column, "sentence"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_labeled_file_requires_label_column() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let body = "sentence\nhello\n";

        let err = loader
            .read_rows(csv_reader(body), Path::new("bad.csv"), &SourceRole::Labeled)
            .unwrap_err();
        assert!(err.to_string().contains("cct_labels"));
    }

    #[test]
    fn test_missing_file_fails_fast() {
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);
        let sources = vec![DatasetSource::labeled(PathBuf::from("/nonexistent/data.csv"))];

        let err = loader.load(&sources).unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }

    #[test]
    fn test_load_merges_labeled_and_unlabeled_files() {
        let labeled = write_csv("sentence,cct_labels\nI will make my family proud,Familial\n");
        let unlabeled = write_csv("sentence\nNo label example\n");
        let columns = ColumnConfig::default();
        let loader = DatasetLoader::new(&columns);

        let dataset = loader
            .load(&[
                DatasetSource::labeled(labeled.path()),
                DatasetSource::unlabeled(unlabeled.path()),
            ])
            .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0].category_group, CategoryGroup::Cct);
        assert_eq!(dataset.rows()[1].category_group, CategoryGroup::Class0);
    }

    #[test]
    fn test_custom_column_names_and_bom_header() {
        let columns = ColumnConfig {
            sentence: "text".to_string(),
            labels: "labels".to_string(),
            essay_id: "essay".to_string(),
        };
        let loader = DatasetLoader::new(&columns);
        let body = "\u{feff}text,labels,essay\nHello,Social,7\n";

        let rows = loader
            .read_rows(csv_reader(body), Path::new("custom.csv"), &SourceRole::Labeled)
            .unwrap();

        assert_eq!(rows[0].sentence, "Hello");
        assert_eq!(rows[0].labels, vec!["Social"]);
        assert_eq!(rows[0].essay_id.as_deref(), Some("7"));
    }
}
