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
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

/// The name of the default config file discovered in the working
/// directory.
pub const DEFAULT_CONFIG_NAME: &str = "dtm.yaml";

/// The config for the whole feature pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Document-frequency ratio for the negative-class vocabulary.
    pub negative_class_frequency_threshold: f64,
    /// Document-frequency ratio for the positive-class vocabulary.
    pub positive_class_frequency_threshold: f64,
    /// Looser ratio for the test vocabulary, the test corpus is not
    /// class-split.
    pub test_frequency_threshold: f64,
    /// Consumed by the external stratified splitter, carried only.
    pub random_seed: u64,
    /// Ratings at or above this value label a review as positive.
    pub positive_rating_min: u8,
    pub tokenizer: TokenizerConfig,
    pub columns: ColumnConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            negative_class_frequency_threshold: 0.05,
            positive_class_frequency_threshold: 0.05,
            test_frequency_threshold: 0.01,
            random_seed: 123,
            positive_rating_min: 4,
            tokenizer: TokenizerConfig::default(),
            columns: ColumnConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_path(path: impl AsRef<Utf8Path>) -> Result<Self, PipelineError> {
        let reader = BufReader::new(File::open(path.as_ref().as_std_path())?);
        let config: PipelineConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads [DEFAULT_CONFIG_NAME] from the working directory if it
    /// exists, otherwise falls back to the defaults.
    pub fn discover_or_default() -> Result<Self, PipelineError> {
        let path = Utf8Path::new(DEFAULT_CONFIG_NAME);
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let thresholds = [
            (
                "negative_class_frequency_threshold",
                self.negative_class_frequency_threshold,
            ),
            (
                "positive_class_frequency_threshold",
                self.positive_class_frequency_threshold,
            ),
            ("test_frequency_threshold", self.test_frequency_threshold),
        ];
        for (name, value) in thresholds {
            if !(value > 0.0 && value < 1.0) {
                return Err(PipelineError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

/// The config for the text processing used by the matrix stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// If set to true the text is normalized
    pub normalize_text: bool,
    /// Numeric tokens are excluded unless set.
    pub keep_numeric_tokens: bool,
    pub stemmer: Option<rust_stemmers::Algorithm>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            normalize_text: true,
            keep_numeric_tokens: false,
            stemmer: None,
        }
    }
}

/// The header names of the non-feature columns of the input table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub id: String,
    /// The source grouping label, unused by the matrix stages.
    pub group: String,
    pub rating: String,
    pub text: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            group: "product".to_string(),
            rating: "rating".to_string(),
            text: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::config::PipelineConfig;
    use crate::error::PipelineError;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn thresholds_must_stay_in_the_open_interval() {
        let mut config = PipelineConfig::default();
        config.test_frequency_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidThreshold {
                name: "test_frequency_threshold",
                ..
            })
        ));

        config.test_frequency_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = PipelineConfig::default();
        let serialized = serde_yaml::to_string(&config).unwrap();
        let loaded: PipelineConfig = serde_yaml::from_str(&serialized).unwrap();
        assert_eq!(
            loaded.negative_class_frequency_threshold,
            config.negative_class_frequency_threshold
        );
        assert_eq!(loaded.columns.group, "product");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let loaded: PipelineConfig =
            serde_yaml::from_str("test_frequency_threshold: 0.02\n").unwrap();
        assert_eq!(loaded.test_frequency_threshold, 0.02);
        assert_eq!(loaded.positive_class_frequency_threshold, 0.05);
    }
}
