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

use crate::error::PipelineError;
use crate::vocabulary::DocumentFrequencyCollector;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A document after tokenization, the unit every matrix stage works on.
#[derive(Debug, Clone)]
pub struct TokenizedDocument {
    pub id: String,
    pub tokens: Vec<String>,
}

/// One row of a [TermCountMatrix]. Only terms with a count above zero
/// are stored, an absent cell within the column schema is exactly 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermCountRow {
    pub id: String,
    counts: HashMap<String, u32>,
}

impl TermCountRow {
    /// The count for [term], 0 for any column the row has no entry for.
    pub fn count(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }
}

/// Sparse term counts of a document collection over one vocabulary.
///
/// A column exists iff it is in the vocabulary that produced the
/// matrix, so a 0 always means "the term truly occurs zero times",
/// never "unknown".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermCountMatrix {
    columns: IndexSet<String>,
    rows: Vec<TermCountRow>,
}

impl TermCountMatrix {
    pub fn columns(&self) -> &IndexSet<String> {
        &self.columns
    }

    pub fn rows(&self) -> &[TermCountRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The count of [term] in the document [id].
    ///
    /// Returns `None` if [term] is not a column or [id] not a row of
    /// this matrix, `Some(0)` for a cell that simply was not counted.
    pub fn count(&self, id: &str, term: &str) -> Option<u32> {
        if !self.columns.contains(term) {
            return None;
        }
        self.rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.count(term))
    }

    /// Unions this matrix with [other].
    ///
    /// The row sets must be disjoint (classes partition the training
    /// corpus). The resulting column set is the union of both
    /// vocabularies, rows keep 0 for every column outside their own
    /// class's vocabulary and are re-sorted by document id so that a
    /// label vector can be attached by id, never by position.
    pub fn merge(self, other: TermCountMatrix) -> Result<TermCountMatrix, PipelineError> {
        let known: HashSet<&str> = self.rows.iter().map(|row| row.id.as_str()).collect();
        if let Some(duplicate) = other.rows.iter().find(|row| known.contains(row.id.as_str())) {
            return Err(PipelineError::schema_integrity(
                "merge",
                format!("document '{}' appears in both class matrices", duplicate.id),
            ));
        }

        let expected = self.rows.len() + other.rows.len();
        let mut columns = self.columns;
        columns.extend(other.columns);
        let mut rows = self.rows;
        rows.extend(other.rows);
        rows.sort_unstable_by(|a, b| a.id.cmp(&b.id));

        if rows.len() != expected {
            return Err(PipelineError::schema_integrity(
                "merge",
                format!("expected {expected} rows, produced {}", rows.len()),
            ));
        }

        Ok(TermCountMatrix { columns, rows })
    }
}

/// Builds the term-count matrix for one document collection.
///
/// Used per class for the training corpus and once, with a looser
/// threshold, for the combined test corpus. The vocabulary is derived
/// from exactly the supplied documents, so an imbalanced corpus never
/// forces an unreasonably high in-class frequency on the minority
/// class.
pub fn build_term_count_matrix(
    docs: &[TokenizedDocument],
    min_ratio: f64,
    stage: &'static str,
) -> Result<TermCountMatrix, PipelineError> {
    let mut collector = DocumentFrequencyCollector::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(docs.len());
    for doc in docs {
        if !seen.insert(doc.id.as_str()) {
            return Err(PipelineError::schema_integrity(
                stage,
                format!("duplicate document id '{}'", doc.id),
            ));
        }
        collector.add_document(doc.tokens.iter().map(|token| token.as_str()));
    }
    let vocabulary = collector.select(min_ratio, stage)?;

    let columns: IndexSet<String> = vocabulary.terms().iter().cloned().collect();
    let rows = docs
        .iter()
        .map(|doc| {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for token in &doc.tokens {
                if vocabulary.contains(token) {
                    *counts.entry(token.clone()).or_insert(0) += 1;
                }
            }
            TermCountRow {
                id: doc.id.clone(),
                counts,
            }
        })
        .collect();

    Ok(TermCountMatrix { columns, rows })
}

#[cfg(test)]
mod test {
    use crate::error::PipelineError;
    use crate::matrix::{build_term_count_matrix, TokenizedDocument};

    fn doc(id: &str, text: &str) -> TokenizedDocument {
        TokenizedDocument {
            id: id.to_string(),
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[test]
    fn counts_exact_occurrences() {
        let docs = [doc("n1", "bad bad terrible"), doc("n2", "awful bad")];
        let matrix = build_term_count_matrix(&docs, 0.5, "negative").unwrap();

        assert_eq!(
            matrix.columns().iter().map(String::as_str).collect::<Vec<_>>(),
            ["awful", "bad", "terrible"]
        );
        assert_eq!(matrix.count("n1", "bad"), Some(2));
        assert_eq!(matrix.count("n1", "terrible"), Some(1));
        assert_eq!(matrix.count("n1", "awful"), Some(0));
        assert_eq!(matrix.count("n2", "bad"), Some(1));
        // not a column of this matrix
        assert_eq!(matrix.count("n1", "great"), None);
    }

    #[test]
    fn merge_unions_columns_and_sorts_rows() {
        let negative = build_term_count_matrix(
            &[doc("n1", "bad bad terrible"), doc("n2", "awful bad")],
            0.5,
            "negative",
        )
        .unwrap();
        let positive = build_term_count_matrix(
            &[doc("p1", "great great story"), doc("p2", "great read")],
            0.5,
            "positive",
        )
        .unwrap();

        let merged = negative.merge(positive).unwrap();

        let mut columns: Vec<_> = merged.columns().iter().map(String::as_str).collect();
        columns.sort_unstable();
        assert_eq!(columns, ["awful", "bad", "great", "read", "story", "terrible"]);

        let ids: Vec<_> = merged.rows().iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["n1", "n2", "p1", "p2"]);

        // cross-class cells are zero, not missing
        assert_eq!(merged.count("n1", "great"), Some(0));
        assert_eq!(merged.count("p1", "bad"), Some(0));
    }

    #[test]
    fn merge_preserves_counts_for_shared_terms() {
        let left = build_term_count_matrix(&[doc("a", "good bad good")], 0.5, "left").unwrap();
        let right = build_term_count_matrix(&[doc("b", "good good good")], 0.5, "right").unwrap();
        let merged = left.merge(right).unwrap();
        assert_eq!(merged.count("a", "good"), Some(2));
        assert_eq!(merged.count("b", "good"), Some(3));
        assert_eq!(merged.count("a", "bad"), Some(1));
        assert_eq!(merged.count("b", "bad"), Some(0));
    }

    #[test]
    fn merge_rejects_overlapping_rows() {
        let left = build_term_count_matrix(&[doc("x", "alpha")], 0.5, "left").unwrap();
        let right = build_term_count_matrix(&[doc("x", "beta")], 0.5, "right").unwrap();
        assert!(matches!(
            left.merge(right),
            Err(PipelineError::SchemaIntegrity { stage: "merge", .. })
        ));
    }

    #[test]
    fn build_rejects_duplicate_ids() {
        let docs = [doc("d", "alpha"), doc("d", "beta")];
        assert!(matches!(
            build_term_count_matrix(&docs, 0.5, "negative"),
            Err(PipelineError::SchemaIntegrity { .. })
        ));
    }
}
