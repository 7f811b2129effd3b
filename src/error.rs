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

use thiserror::Error;

/// An error from building the feature matrices.
///
/// Every variant is a batch precondition. There is no partial output,
/// the pipeline either produces a consistent pair of matrices or
/// aborts with one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The frequency threshold excluded every term of a subset.
    #[error("no term in the '{stage}' documents reaches the document frequency threshold {threshold}")]
    EmptyVocabulary { stage: &'static str, threshold: f64 },

    /// A join or merge changed the row set, or the id sets of two
    /// collaborating tables disagree.
    #[error("schema integrity violated at '{stage}': {detail}")]
    SchemaIntegrity { stage: &'static str, detail: String },

    /// An aggregate feature is absent for a row where it must always
    /// be populated. Never zero-filled, zero is not "unknown".
    #[error("aggregate feature '{column}' is missing for document '{id}'")]
    AggregateFeatureMissing { id: String, column: String },

    /// A frequency threshold outside of (0, 1).
    #[error("the threshold '{name}' must lie in (0, 1) but is {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    /// A malformed cell or record in the input table.
    #[error("malformed corpus record for document '{id}': {detail}")]
    Corpus { id: String, detail: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    CSV(#[from] csv::Error),
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
    #[error(transparent)]
    Serialisation(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn schema_integrity(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::SchemaIntegrity {
            stage,
            detail: detail.into(),
        }
    }
}
