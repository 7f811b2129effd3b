use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Collects the document frequencies in a corpus.
///
/// Counts each term at most once per document, document frequency is
/// not raw term frequency.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocumentFrequencyCollector {
    document_count: u64,
    frequencies: HashMap<String, u64>,
}

impl DocumentFrequencyCollector {
    /// The number of documents seen so far.
    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// The number of distinct terms seen so far.
    pub fn unique_term_count(&self) -> usize {
        self.frequencies.len()
    }

    /// The number of documents containing [term] at least once.
    pub fn document_frequency(&self, term: &str) -> Option<u64> {
        self.frequencies.get(term).copied()
    }

    /// Returns an iterator over the terms and associated frequencies
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.frequencies.iter().map(|(term, count)| (term.as_str(), *count))
    }

    pub fn add_document<'a, D: IntoIterator<Item = &'a str>>(&mut self, doc: D) {
        self.document_count = self.document_count.saturating_add(1);
        let distinct: HashSet<&str> = doc.into_iter().collect();
        for term in distinct {
            self.frequencies
                .entry(term.to_string())
                .and_modify(|value| *value = value.saturating_add(1))
                .or_insert(1);
        }
    }

    /// Retains every term whose document frequency ratio reaches
    /// [min_ratio], boundary inclusive.
    ///
    /// The comparison tolerates float representation error, a term in
    /// exactly 1 of 20 documents passes a 0.05 threshold.
    pub fn select(
        &self,
        min_ratio: f64,
        stage: &'static str,
    ) -> Result<Vocabulary, PipelineError> {
        if self.document_count == 0 {
            return Err(PipelineError::EmptyVocabulary {
                stage,
                threshold: min_ratio,
            });
        }
        let required = min_ratio * self.document_count as f64;
        let mut terms: Vec<String> = self
            .frequencies
            .iter()
            .filter(|(_, frequency)| {
                let frequency = **frequency as f64;
                frequency >= required || float_cmp::approx_eq!(f64, frequency, required)
            })
            .map(|(term, _)| term.clone())
            .collect();
        if terms.is_empty() {
            return Err(PipelineError::EmptyVocabulary {
                stage,
                threshold: min_ratio,
            });
        }
        terms.sort_unstable();
        Ok(Vocabulary { terms })
    }
}

impl Display for DocumentFrequencyCollector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Document Count: {}\n", self.document_count)?;
        write!(f, "Unique Term Count: {}\n", self.unique_term_count())?;
        write!(f, "Terms:")?;
        for (term, count) in &self.frequencies {
            write!(f, "\n  {term}: {count}")?;
        }
        Ok(())
    }
}

/// The terms retained for one document collection, lexicographically
/// sorted so they can serve as a deterministic column schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn contains(&self, term: &str) -> bool {
        self.terms.binary_search_by(|probe| probe.as_str().cmp(term)).is_ok()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Deref for Vocabulary {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.terms
    }
}
