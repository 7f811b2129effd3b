use crate::config::ColumnConfig;
use crate::error::PipelineError;
use camino::Utf8Path;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader};

/// A raw record as delivered by the aggregate-feature producer.
///
/// Immutable once loaded. The grouping label is carried but unused by
/// the matrix stages, the ordinal rating is only consumed by the
/// labeling rule.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub id: String,
    pub group: String,
    pub rating: u8,
    pub text: String,
    /// Aggregate features in input column order. `None` marks a cell
    /// that was empty in the input, it is reported as an error when
    /// the features are joined, never zero-filled.
    pub aggregates: IndexMap<String, Option<f64>>,
}

/// A record with its binary class label attached.
#[derive(Debug, Clone)]
pub struct LabeledReview {
    pub record: ReviewRecord,
    pub label: bool,
}

/// The external labeling rule, applied at the loading boundary.
///
/// A pure function from a raw record to a new labeled record, the
/// shared corpus is never rewritten in place.
pub fn label_record(record: ReviewRecord, positive_rating_min: u8) -> LabeledReview {
    let label = record.rating >= positive_rating_min;
    LabeledReview { record, label }
}

/// A loaded corpus snapshot.
#[derive(Debug, Clone)]
pub struct ReviewCorpus {
    /// The aggregate feature columns in input order.
    pub aggregate_columns: Vec<String>,
    pub records: Vec<ReviewRecord>,
}

impl ReviewCorpus {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a corpus from a csv file.
pub fn read_corpus_from_path(
    path: impl AsRef<Utf8Path>,
    columns: &ColumnConfig,
) -> Result<ReviewCorpus, PipelineError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::IO(io::Error::new(
            io::ErrorKind::NotFound,
            format!("The file {path} was not found!"),
        )));
    }
    let mut reader = csv::ReaderBuilder::new();
    reader.has_headers(true);
    read_corpus(
        reader.from_reader(BufReader::new(File::open(path.as_std_path())?)),
        columns,
    )
}

/// Reads a corpus from an already opened csv reader.
///
/// Every header that is not the id, grouping, rating or text column
/// is treated as a named numeric aggregate feature; their input order
/// is preserved.
pub fn read_corpus<R: io::Read>(
    mut reader: csv::Reader<R>,
    columns: &ColumnConfig,
) -> Result<ReviewCorpus, PipelineError> {
    let headers = reader.headers()?.clone();

    let required = [
        columns.id.as_str(),
        columns.group.as_str(),
        columns.rating.as_str(),
        columns.text.as_str(),
    ];
    let index_of = |name: &str| headers.iter().position(|header| header == name);
    let mut indices = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, name) in indices.iter_mut().zip(required) {
        match index_of(name) {
            Some(index) => *slot = index,
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::schema_integrity(
            "corpus",
            format!("missing required columns: {}", missing.join(", ")),
        ));
    }
    let [id_idx, group_idx, rating_idx, text_idx] = indices;

    let aggregate_indices: Vec<usize> = (0..headers.len())
        .filter(|idx| ![id_idx, group_idx, rating_idx, text_idx].contains(idx))
        .collect();
    let aggregate_columns: Vec<String> = aggregate_indices
        .iter()
        .map(|idx| headers[*idx].to_string())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = record
            .get(id_idx)
            .unwrap_or_default()
            .trim()
            .to_string();
        if id.is_empty() {
            return Err(PipelineError::schema_integrity(
                "corpus",
                format!("record {} has an empty document id", records.len() + 1),
            ));
        }
        if !seen.insert(id.clone()) {
            return Err(PipelineError::schema_integrity(
                "corpus",
                format!("duplicate document id '{id}'"),
            ));
        }

        let rating = record.get(rating_idx).unwrap_or_default().trim();
        let rating = rating.parse::<u8>().map_err(|_| PipelineError::Corpus {
            id: id.clone(),
            detail: format!("'{rating}' is not a valid rating"),
        })?;

        let mut aggregates = IndexMap::with_capacity(aggregate_indices.len());
        for (idx, column) in aggregate_indices.iter().zip(aggregate_columns.iter()) {
            let cell = record.get(*idx).unwrap_or_default().trim();
            let value = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|_| PipelineError::Corpus {
                    id: id.clone(),
                    detail: format!("aggregate '{column}' holds the non numeric value '{cell}'"),
                })?)
            };
            aggregates.insert(column.clone(), value);
        }

        records.push(ReviewRecord {
            id,
            group: record.get(group_idx).unwrap_or_default().to_string(),
            rating,
            text: record.get(text_idx).unwrap_or_default().to_string(),
            aggregates,
        });
    }

    Ok(ReviewCorpus {
        aggregate_columns,
        records,
    })
}

#[cfg(test)]
mod test {
    use crate::config::ColumnConfig;
    use crate::corpus::{label_record, read_corpus};
    use crate::error::PipelineError;

    fn read(data: &str) -> Result<super::ReviewCorpus, PipelineError> {
        read_corpus(
            csv::ReaderBuilder::new().from_reader(data.as_bytes()),
            &ColumnConfig::default(),
        )
    }

    #[test]
    fn captures_aggregates_in_header_order() {
        let corpus = read(
            "id,product,rating,text,sent_score,word_count\n\
             r1,book-a,5,great read,0.8,2\n\
             r2,book-b,1,awful,-0.9,1\n",
        )
        .unwrap();

        assert_eq!(corpus.aggregate_columns, ["sent_score", "word_count"]);
        assert_eq!(corpus.records[0].id, "r1");
        assert_eq!(corpus.records[0].rating, 5);
        assert_eq!(corpus.records[0].aggregates["sent_score"], Some(0.8));
        assert_eq!(corpus.records[1].aggregates["word_count"], Some(1.0));
    }

    #[test]
    fn empty_aggregate_cells_load_as_missing_not_zero() {
        let corpus = read(
            "id,product,rating,text,sent_score\n\
             r1,book-a,3,fine,\n",
        )
        .unwrap();
        assert_eq!(corpus.records[0].aggregates["sent_score"], None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = read(
            "id,product,rating,text,sent_score\n\
             r1,book-a,3,fine,0.1\n\
             r1,book-b,4,good,0.2\n",
        );
        assert!(matches!(
            result,
            Err(PipelineError::SchemaIntegrity { stage: "corpus", .. })
        ));
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let result = read("id,rating,text\nr1,3,fine\n");
        assert!(matches!(result, Err(PipelineError::SchemaIntegrity { .. })));
    }

    #[test]
    fn labeling_is_a_pure_mapping() {
        let corpus = read(
            "id,product,rating,text,sent_score\n\
             r1,book-a,4,good,0.5\n\
             r2,book-a,3,meh,0.0\n",
        )
        .unwrap();
        let labeled: Vec<_> = corpus
            .records
            .iter()
            .cloned()
            .map(|record| label_record(record, 4))
            .collect();
        assert!(labeled[0].label);
        assert!(!labeled[1].label);
    }
}
