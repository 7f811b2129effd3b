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

//! The forward pipeline over a corpus snapshot.
//!
//! Training: split by class, build one term-count matrix per class,
//! merge, join with the aggregate features and the label vector.
//! Test: build one matrix with the looser threshold, join, project
//! onto the training schema. Every stage consumes immutable input and
//! emits a new artifact, nothing is mutated in place.

use crate::config::PipelineConfig;
use crate::corpus::{label_record, LabeledReview, ReviewCorpus};
use crate::error::PipelineError;
use crate::features::{join_features, AggregateTable, FeatureMatrix};
use crate::matrix::{build_term_count_matrix, TokenizedDocument};
use crate::tokenizer::Tokenizer;
use std::collections::HashMap;

fn tokenize_all<'a, I: IntoIterator<Item = &'a LabeledReview>>(
    tokenizer: &Tokenizer,
    reviews: I,
) -> Vec<TokenizedDocument> {
    reviews
        .into_iter()
        .map(|review| TokenizedDocument {
            id: review.record.id.clone(),
            tokens: tokenizer.tokenize(&review.record.text),
        })
        .collect()
}

/// Builds the final training feature matrix, label column included.
pub fn build_training_matrix(
    corpus: &ReviewCorpus,
    config: &PipelineConfig,
    tokenizer: &Tokenizer,
) -> Result<FeatureMatrix, PipelineError> {
    let labeled: Vec<LabeledReview> = corpus
        .records
        .iter()
        .cloned()
        .map(|record| label_record(record, config.positive_rating_min))
        .collect();
    let (positive, negative): (Vec<&LabeledReview>, Vec<&LabeledReview>) =
        labeled.iter().partition(|review| review.label);
    log::info!(
        "Building the training matrix from {} negative and {} positive documents.",
        negative.len(),
        positive.len()
    );

    let negative_matrix = build_term_count_matrix(
        &tokenize_all(tokenizer, negative.iter().copied()),
        config.negative_class_frequency_threshold,
        "negative",
    )?;
    let positive_matrix = build_term_count_matrix(
        &tokenize_all(tokenizer, positive.iter().copied()),
        config.positive_class_frequency_threshold,
        "positive",
    )?;
    log::info!(
        "Class vocabularies: {} negative terms, {} positive terms.",
        negative_matrix.columns().len(),
        positive_matrix.columns().len()
    );

    let merged = negative_matrix.merge(positive_matrix)?;

    let aggregates = AggregateTable::from_records(&corpus.aggregate_columns, corpus.records.iter());
    let labels: HashMap<String, bool> = labeled
        .iter()
        .map(|review| (review.record.id.clone(), review.label))
        .collect();
    let joined = join_features(&merged, &aggregates, Some(&labels))?;

    if joined.row_count() != corpus.len() {
        return Err(PipelineError::schema_integrity(
            "train",
            format!(
                "expected {} rows, produced {}",
                corpus.len(),
                joined.row_count()
            ),
        ));
    }
    log::info!(
        "Training matrix: {} rows, {} columns.",
        joined.row_count(),
        joined.columns().len()
    );
    Ok(joined)
}

/// Builds the final test feature matrix, projected onto [schema].
///
/// The test corpus is not class-split (the labels are the prediction
/// target), a single looser threshold is applied uniformly instead.
pub fn build_test_matrix(
    corpus: &ReviewCorpus,
    config: &PipelineConfig,
    tokenizer: &Tokenizer,
    schema: &[String],
) -> Result<FeatureMatrix, PipelineError> {
    log::info!(
        "Building the test matrix from {} documents.",
        corpus.len()
    );
    let docs: Vec<TokenizedDocument> = corpus
        .records
        .iter()
        .map(|record| TokenizedDocument {
            id: record.id.clone(),
            tokens: tokenizer.tokenize(&record.text),
        })
        .collect();

    let matrix = build_term_count_matrix(&docs, config.test_frequency_threshold, "test")?;
    let aggregates = AggregateTable::from_records(&corpus.aggregate_columns, corpus.records.iter());
    let joined = join_features(&matrix, &aggregates, None)?;

    let projected = joined.project_onto(schema);
    if projected.row_count() != corpus.len() {
        return Err(PipelineError::schema_integrity(
            "test",
            format!(
                "expected {} rows, produced {}",
                corpus.len(),
                projected.row_count()
            ),
        ));
    }
    log::info!(
        "Test matrix: {} rows projected onto {} columns.",
        projected.row_count(),
        projected.columns().len()
    );
    Ok(projected)
}

/// Runs the whole pipeline over one corpus snapshot.
pub fn run(
    train: &ReviewCorpus,
    test: &ReviewCorpus,
    config: &PipelineConfig,
) -> Result<(FeatureMatrix, FeatureMatrix), PipelineError> {
    config.validate()?;
    let tokenizer = Tokenizer::from(&config.tokenizer);
    let training = build_training_matrix(train, config, &tokenizer)?;
    let schema = training.feature_schema();
    let test = build_test_matrix(test, config, &tokenizer, &schema)?;
    debug_assert_eq!(test.feature_schema(), schema);
    Ok((training, test))
}
