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

use crate::config::TokenizerConfig;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Debug;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// A primitive tokenizer.
///
/// Stopwords are deliberately not filtered, for rating prediction
/// they carry signal. Stemming is off unless configured.
#[derive(Debug, Serialize, Deserialize)]
pub struct Tokenizer {
    normalize: bool,
    keep_numeric: bool,
    stemmer: Option<rust_stemmers::Algorithm>,
}

impl Tokenizer {
    pub fn new(
        normalize: bool,
        keep_numeric: bool,
        stemmer: Option<rust_stemmers::Algorithm>,
    ) -> Self {
        Self {
            normalize,
            keep_numeric,
            stemmer,
        }
    }

    /// Preprocesses a text
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.normalize {
            Cow::Owned(text.nfc().to_string())
        } else {
            Cow::Borrowed(text)
        };

        let text = text.unicode_words();

        let text = if self.keep_numeric {
            text.collect_vec()
        } else {
            text.filter(|value| value.parse::<f64>().is_err()).collect_vec()
        };

        if let Some(stemmer) = self.stemmer {
            let stemmer = rust_stemmers::Stemmer::create(stemmer);
            text.into_iter()
                .map(|value| stemmer.stem(&value.to_lowercase()).to_string())
                .collect_vec()
        } else {
            text.into_iter().map(|value| value.to_lowercase()).collect_vec()
        }
    }
}

impl From<&TokenizerConfig> for Tokenizer {
    fn from(cfg: &TokenizerConfig) -> Self {
        Self::new(cfg.normalize_text, cfg.keep_numeric_tokens, cfg.stemmer)
    }
}
