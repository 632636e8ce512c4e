use crate::error::Result;
use crate::posting::JobPosting;
use crate::vectorizer::{FittedVectorizer, SparseRow, VectorizerConfig};
use serde::{Deserialize, Serialize};

/// Version tag of the on-disk artifact layout.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub format_version: u32,
    pub created_at: String,
    pub num_postings: u32,
    pub num_terms: u32,
}

/// One row per posting, one column per vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeightMatrix {
    pub n_cols: usize,
    pub rows: Vec<SparseRow>,
}

impl TermWeightMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Fitted vectorizer, weighted rows and the posting table they describe.
///
/// Row `i` of `matrix` always describes `postings[i]`. An index is never
/// mutated after construction; a retrain builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobIndex {
    pub header: IndexHeader,
    pub vectorizer: FittedVectorizer,
    pub matrix: TermWeightMatrix,
    pub postings: Vec<JobPosting>,
}

impl JobIndex {
    /// Fit a fresh index over `postings`.
    pub fn build(config: VectorizerConfig, postings: Vec<JobPosting>) -> Result<Self> {
        let (vectorizer, rows) = FittedVectorizer::fit(config, &postings)?;
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        let index = Self {
            header: IndexHeader {
                format_version: FORMAT_VERSION,
                created_at,
                num_postings: postings.len() as u32,
                num_terms: vectorizer.dims() as u32,
            },
            matrix: TermWeightMatrix { n_cols: vectorizer.dims(), rows },
            vectorizer,
            postings,
        };
        tracing::info!(num_postings = index.len(), num_terms = index.dims(), "built index");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Column count of the term-weight matrix.
    pub fn dims(&self) -> usize {
        self.matrix.n_cols
    }

    /// Describe the first structural inconsistency, if any.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let vocab = self.vectorizer.dims();
        if self.header.format_version != FORMAT_VERSION {
            return Err(format!("header format version {} != {}", self.header.format_version, FORMAT_VERSION));
        }
        if self.matrix.n_rows() != self.postings.len() {
            return Err(format!("{} matrix rows for {} postings", self.matrix.n_rows(), self.postings.len()));
        }
        if self.matrix.n_cols != vocab {
            return Err(format!("{} matrix columns for a vocabulary of {vocab} terms", self.matrix.n_cols));
        }
        if self.vectorizer.idf.len() != vocab {
            return Err(format!("{} idf weights for a vocabulary of {vocab} terms", self.vectorizer.idf.len()));
        }
        if self.header.num_postings as usize != self.postings.len() || self.header.num_terms as usize != vocab {
            return Err("header counts disagree with the index body".to_string());
        }
        for (i, row) in self.matrix.rows.iter().enumerate() {
            row.check_shape(vocab).map_err(|reason| format!("row {i}: {reason}"))?;
        }
        Ok(())
    }
}
