use crate::error::{Error, Result};
use crate::posting::JobPosting;
use crate::tokenizer::Tokenizer;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use crate::tokenizer::Language;

/// Weighting and tokenization knobs. Persisted with the index so queries are
/// vectorized exactly like the corpus was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    pub language: Language,
    pub extra_stop_words: Vec<String>,
    pub stem: bool,
    /// Use `1 + ln(tf)` instead of raw counts.
    pub sublinear_tf: bool,
    /// `ln((1 + n) / (1 + df)) + 1` when set, `ln(n / df) + 1` otherwise.
    pub smooth_idf: bool,
    /// L2-normalize every row and every query vector.
    pub normalize: bool,
    pub min_df: u32,
    pub max_features: Option<usize>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            language: Language::French,
            extra_stop_words: Vec::new(),
            stem: false,
            sublinear_tf: false,
            smooth_idf: true,
            normalize: true,
            min_df: 1,
            max_features: None,
        }
    }
}

impl VectorizerConfig {
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.language, &self.extra_stop_words, self.stem)
    }
}

/// Sparse row with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseRow {
    pub indices: Vec<TermId>,
    pub values: Vec<f32>,
}

impl SparseRow {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Describe why this row cannot live in a `dims`-column space, if it can't.
    pub fn check_shape(&self, dims: usize) -> std::result::Result<(), String> {
        if self.indices.len() != self.values.len() {
            return Err(format!("{} indices but {} values", self.indices.len(), self.values.len()));
        }
        if self.indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err("column indices are not strictly increasing".to_string());
        }
        if self.indices.last().is_some_and(|&c| c as usize >= dims) {
            return Err(format!("column outside the {dims}-term vocabulary"));
        }
        Ok(())
    }

    fn normalize_l2(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in self.values.iter_mut() {
                *v /= norm;
            }
        }
    }
}

/// A query mapped into an index's column space.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    pub dims: usize,
    pub row: SparseRow,
}

impl QueryVector {
    pub fn new(dims: usize, row: SparseRow) -> Self {
        Self { dims, row }
    }

    /// True when no query term overlapped the vocabulary.
    pub fn is_zero(&self) -> bool {
        self.row.values.iter().all(|v| *v == 0.0)
    }
}

/// Vocabulary plus IDF weights learned from a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVectorizer {
    pub config: VectorizerConfig,
    /// Term to column; columns follow sorted term order.
    pub vocabulary: BTreeMap<String, TermId>,
    pub idf: Vec<f32>,
    pub num_docs: u32,
}

impl FittedVectorizer {
    /// Learn the vocabulary and IDF from `postings` and return the weighted
    /// rows in posting order.
    pub fn fit(config: VectorizerConfig, postings: &[JobPosting]) -> Result<(Self, Vec<SparseRow>)> {
        if postings.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let tokenizer = config.tokenizer();

        let mut doc_counts: Vec<HashMap<String, u32>> = Vec::with_capacity(postings.len());
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut total: HashMap<String, u64> = HashMap::new();
        for posting in postings {
            let counts = count_terms(tokenizer.tokenize(&posting.combined_text()));
            for (term, tf) in counts.iter() {
                *df.entry(term.clone()).or_insert(0) += 1;
                *total.entry(term.clone()).or_insert(0) += u64::from(*tf);
            }
            doc_counts.push(counts);
        }

        let mut kept: Vec<String> = df.iter().filter(|(_, d)| **d >= config.min_df).map(|(t, _)| t.clone()).collect();
        if let Some(max) = config.max_features {
            kept.sort_by(|a, b| total[b].cmp(&total[a]).then_with(|| a.cmp(b)));
            kept.truncate(max);
        }
        kept.sort();
        if kept.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let n = postings.len() as f64;
        let idf: Vec<f32> = kept
            .iter()
            .map(|t| {
                let d = f64::from(df[t]);
                let idf = if config.smooth_idf { ((1.0 + n) / (1.0 + d)).ln() + 1.0 } else { (n / d).ln() + 1.0 };
                idf as f32
            })
            .collect();
        let vocabulary: BTreeMap<String, TermId> =
            kept.into_iter().enumerate().map(|(col, t)| (t, col as TermId)).collect();

        let fitted = Self { config, vocabulary, idf, num_docs: postings.len() as u32 };
        let rows: Vec<SparseRow> = doc_counts.iter().map(|c| fitted.weigh(c)).collect();
        tracing::debug!(num_docs = fitted.num_docs, num_terms = fitted.dims(), "fitted vectorizer");
        Ok((fitted, rows))
    }

    pub fn dims(&self) -> usize {
        self.vocabulary.len()
    }

    /// Map free text into the fitted column space. Unknown terms are dropped.
    pub fn transform(&self, text: &str) -> QueryVector {
        let counts = count_terms(self.config.tokenizer().tokenize(text));
        QueryVector::new(self.dims(), self.weigh(&counts))
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseRow {
        let mut entries: Vec<(TermId, f32)> = counts
            .iter()
            .filter_map(|(term, &tf)| {
                let col = *self.vocabulary.get(term)?;
                let tf = if self.config.sublinear_tf { 1.0 + (tf as f32).ln() } else { tf as f32 };
                Some((col, tf * self.idf[col as usize]))
            })
            .collect();
        entries.sort_by_key(|(col, _)| *col);
        let (indices, values) = entries.into_iter().unzip();
        let mut row = SparseRow { indices, values };
        if self.config.normalize {
            row.normalize_l2();
        }
        row
    }
}

fn count_terms(tokens: Vec<String>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for t in tokens {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
}
