//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use crate::corpus::ReviewRecord;
use crate::error::PipelineError;
use crate::matrix::TermCountMatrix;
use camino::Utf8Path;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter};

/// The name of the label column of a training matrix.
pub const LABEL_COLUMN: &str = "label";

/// The precomputed aggregate document features, keyed by document id.
///
/// A `None` cell is a genuinely missing input value. It stays `None`
/// here and fails the join, aggregate features are never zero-filled.
#[derive(Debug, Clone)]
pub struct AggregateTable {
    columns: Vec<String>,
    rows: IndexMap<String, Vec<Option<f64>>>,
}

impl AggregateTable {
    pub fn from_records<'a, I: IntoIterator<Item = &'a ReviewRecord>>(
        columns: &[String],
        records: I,
    ) -> Self {
        let rows = records
            .into_iter()
            .map(|record| {
                let values = columns
                    .iter()
                    .map(|column| record.aggregates.get(column).copied().flatten())
                    .collect();
                (record.id.clone(), values)
            })
            .collect();
        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }
}

/// One row of a [FeatureMatrix], values in column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: String,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// A fully joined, fixed-width numeric feature matrix.
///
/// Rows are keyed by unique document id, columns are the aggregate
/// features followed by the vocabulary terms, plus the label column
/// for a training matrix. Column order is significant, it is the
/// schema the test matrix must be projected onto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: IndexSet<String>,
    has_label: bool,
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &IndexSet<String> {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_label(&self) -> bool {
        self.has_label
    }

    /// The ordered column schema, label column excluded.
    pub fn feature_schema(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| column.as_str() != LABEL_COLUMN || !self.has_label)
            .cloned()
            .collect()
    }

    /// The value of [column] for the document [id], if both exist.
    pub fn value(&self, id: &str, column: &str) -> Option<f64> {
        let index = self.columns.get_index_of(column)?;
        self.rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.values[index])
    }

    /// Reshapes this matrix to exactly the [target] column schema.
    ///
    /// A pure reshape keyed on column identity: matching columns are
    /// copied, target columns absent from this matrix are added as
    /// all-zero, columns absent from the target are dropped. The row
    /// set and row order are preserved.
    pub fn project_onto(&self, target: &[String]) -> FeatureMatrix {
        let source_indices: Vec<Option<usize>> = target
            .iter()
            .map(|column| self.columns.get_index_of(column))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| FeatureRow {
                id: row.id.clone(),
                values: source_indices
                    .iter()
                    .map(|index| index.map(|idx| row.values[idx]).unwrap_or(0.0))
                    .collect(),
            })
            .collect();

        FeatureMatrix {
            columns: target.iter().cloned().collect(),
            has_label: false,
            rows,
        }
    }

    /// Writes the matrix as csv, id column first.
    pub fn write_csv<W: io::Write>(&self, out: W) -> Result<(), PipelineError> {
        let mut writer = csv::Writer::from_writer(out);
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push("id");
        header.extend(self.columns.iter().map(String::as_str));
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.id.clone());
            record.extend(row.values.iter().map(|value| value.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_to_path(&self, path: impl AsRef<Utf8Path>) -> Result<(), PipelineError> {
        let out = BufWriter::new(
            File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path.as_ref().as_std_path())?,
        );
        self.write_csv(out)
    }
}

/// Joins a term-count matrix with the aggregate features by document
/// id and attaches the label vector by id, if one is supplied.
///
/// The id sets must be identical, any discrepancy between the two
/// collaborators is a precondition violation. The fill policy is split
/// in two deliberate passes: term columns default to 0 (absence means
/// a true zero count), aggregate columns must be populated.
pub fn join_features(
    counts: &TermCountMatrix,
    aggregates: &AggregateTable,
    labels: Option<&HashMap<String, bool>>,
) -> Result<FeatureMatrix, PipelineError> {
    for row in counts.rows() {
        if !aggregates.contains(&row.id) {
            return Err(PipelineError::schema_integrity(
                "join",
                format!(
                    "document '{}' has term counts but no aggregate features",
                    row.id
                ),
            ));
        }
    }
    if aggregates.rows.len() != counts.row_count() {
        let counted: IndexSet<&str> = counts.rows().iter().map(|row| row.id.as_str()).collect();
        let orphan = aggregates
            .rows
            .keys()
            .find(|id| !counted.contains(id.as_str()))
            .cloned()
            .unwrap_or_default();
        return Err(PipelineError::schema_integrity(
            "join",
            format!("document '{orphan}' has aggregate features but no term counts"),
        ));
    }

    let mut columns: IndexSet<String> = aggregates.columns.iter().cloned().collect();
    columns.extend(counts.columns().iter().cloned());
    if labels.is_some() {
        columns.insert(LABEL_COLUMN.to_string());
    }
    if columns.len() != aggregates.columns.len() + counts.columns().len() + labels.map_or(0, |_| 1)
    {
        return Err(PipelineError::schema_integrity(
            "join",
            "an aggregate column collides with a vocabulary term or the label column".to_string(),
        ));
    }

    let mut rows = Vec::with_capacity(counts.row_count());
    for row in counts.rows() {
        let mut values = Vec::with_capacity(columns.len());

        // aggregate pass: every value must be present
        let aggregate_values = &aggregates.rows[&row.id];
        for (column, value) in aggregates.columns.iter().zip(aggregate_values) {
            match value {
                Some(value) => values.push(*value),
                None => {
                    return Err(PipelineError::AggregateFeatureMissing {
                        id: row.id.clone(),
                        column: column.clone(),
                    })
                }
            }
        }

        // term pass: absence within the vocabulary is a true zero
        for term in counts.columns() {
            values.push(row.count(term) as f64);
        }

        if let Some(labels) = labels {
            match labels.get(&row.id) {
                Some(label) => values.push(if *label { 1.0 } else { 0.0 }),
                None => {
                    return Err(PipelineError::schema_integrity(
                        "join",
                        format!("no label collected for document '{}'", row.id),
                    ))
                }
            }
        }

        rows.push(FeatureRow {
            id: row.id.clone(),
            values,
        });
    }

    Ok(FeatureMatrix {
        columns,
        has_label: labels.is_some(),
        rows,
    })
}

#[cfg(test)]
mod test {
    use crate::corpus::ReviewRecord;
    use crate::error::PipelineError;
    use crate::features::{join_features, AggregateTable, LABEL_COLUMN};
    use crate::matrix::build_term_count_matrix;
    use crate::matrix::TokenizedDocument;
    use indexmap::IndexMap;
    use std::collections::HashMap;

    fn doc(id: &str, text: &str) -> TokenizedDocument {
        TokenizedDocument {
            id: id.to_string(),
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    fn record(id: &str, aggregates: &[(&str, Option<f64>)]) -> ReviewRecord {
        ReviewRecord {
            id: id.to_string(),
            group: "book".to_string(),
            rating: 3,
            text: String::new(),
            aggregates: aggregates
                .iter()
                .map(|(column, value)| (column.to_string(), *value))
                .collect::<IndexMap<_, _>>(),
        }
    }

    fn sent_table(entries: &[(&str, Option<f64>)]) -> AggregateTable {
        let records: Vec<_> = entries
            .iter()
            .map(|(id, value)| record(id, &[("sent_score", *value)]))
            .collect();
        AggregateTable::from_records(&["sent_score".to_string()], records.iter())
    }

    #[test]
    fn join_places_aggregates_before_terms() {
        let counts =
            build_term_count_matrix(&[doc("a", "bad bad"), doc("b", "bad good")], 0.5, "t")
                .unwrap();
        let aggregates = sent_table(&[("a", Some(-0.5)), ("b", Some(0.0))]);
        let labels = HashMap::from([("a".to_string(), false), ("b".to_string(), true)]);

        let matrix = join_features(&counts, &aggregates, Some(&labels)).unwrap();

        let columns: Vec<_> = matrix.columns().iter().map(String::as_str).collect();
        assert_eq!(columns, ["sent_score", "bad", "good", LABEL_COLUMN]);
        assert_eq!(matrix.value("a", "sent_score"), Some(-0.5));
        assert_eq!(matrix.value("a", "bad"), Some(2.0));
        assert_eq!(matrix.value("a", "good"), Some(0.0));
        assert_eq!(matrix.value("a", LABEL_COLUMN), Some(0.0));
        assert_eq!(matrix.value("b", LABEL_COLUMN), Some(1.0));
        // a legitimate aggregate zero survives, it is not a fill artifact
        assert_eq!(matrix.value("b", "sent_score"), Some(0.0));
    }

    #[test]
    fn missing_aggregate_is_an_error_not_a_zero() {
        let counts = build_term_count_matrix(&[doc("a", "bad")], 0.5, "t").unwrap();
        let aggregates = sent_table(&[("a", None)]);
        match join_features(&counts, &aggregates, None) {
            Err(PipelineError::AggregateFeatureMissing { id, column }) => {
                assert_eq!(id, "a");
                assert_eq!(column, "sent_score");
            }
            other => panic!("expected AggregateFeatureMissing, got {other:?}"),
        }
    }

    #[test]
    fn join_rejects_id_discrepancies() {
        let counts = build_term_count_matrix(&[doc("a", "bad")], 0.5, "t").unwrap();

        let missing = sent_table(&[("b", Some(0.1))]);
        assert!(matches!(
            join_features(&counts, &missing, None),
            Err(PipelineError::SchemaIntegrity { stage: "join", .. })
        ));

        let extra = sent_table(&[("a", Some(0.1)), ("b", Some(0.2))]);
        assert!(matches!(
            join_features(&counts, &extra, None),
            Err(PipelineError::SchemaIntegrity { stage: "join", .. })
        ));
    }

    #[test]
    fn projection_matches_target_schema_exactly() {
        let counts = build_term_count_matrix(&[doc("x", "bad story extra")], 0.5, "t").unwrap();
        let aggregates = sent_table(&[("x", Some(0.3))]);
        let joined = join_features(&counts, &aggregates, None).unwrap();

        let target: Vec<String> = ["sent_score", "awful", "bad", "great", "read", "story"]
            .iter()
            .map(|column| column.to_string())
            .collect();
        let projected = joined.project_onto(&target);

        assert_eq!(projected.feature_schema(), target);
        assert_eq!(projected.value("x", "bad"), Some(1.0));
        assert_eq!(projected.value("x", "story"), Some(1.0));
        assert_eq!(projected.value("x", "awful"), Some(0.0));
        assert_eq!(projected.value("x", "great"), Some(0.0));
        assert_eq!(projected.value("x", "sent_score"), Some(0.3));
        // the test-only term is dropped
        assert_eq!(projected.value("x", "extra"), None);
    }

    #[test]
    fn projection_preserves_rows() {
        let counts = build_term_count_matrix(
            &[doc("m", "alpha"), doc("k", "alpha beta"), doc("z", "beta")],
            0.3,
            "t",
        )
        .unwrap();
        let aggregates = sent_table(&[("m", Some(1.0)), ("k", Some(2.0)), ("z", Some(3.0))]);
        let joined = join_features(&counts, &aggregates, None).unwrap();

        let projected = joined.project_onto(&["gamma".to_string(), "alpha".to_string()]);
        let ids: Vec<_> = projected.rows().iter().map(|row| row.id.as_str()).collect();
        let original: Vec<_> = joined.rows().iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, original);
        assert_eq!(projected.row_count(), joined.row_count());
        assert_eq!(projected.value("k", "gamma"), Some(0.0));
        assert_eq!(projected.value("k", "alpha"), Some(1.0));
    }

    #[test]
    fn csv_export_writes_schema_and_rows() {
        let counts = build_term_count_matrix(&[doc("a", "bad")], 0.5, "t").unwrap();
        let aggregates = sent_table(&[("a", Some(0.25))]);
        let labels = HashMap::from([("a".to_string(), false)]);
        let matrix = join_features(&counts, &aggregates, Some(&labels)).unwrap();

        let mut out = Vec::new();
        matrix.write_csv(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert_eq!(written, "id,sent_score,bad,label\na,0.25,1,0\n");
    }
}
