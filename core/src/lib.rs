pub mod error;
pub mod index;
pub mod persist;
pub mod posting;
pub mod scorer;
pub mod tokenizer;
pub mod vectorizer;

pub use error::{Error, Result};
pub use index::{IndexHeader, JobIndex, TermWeightMatrix, FORMAT_VERSION};
pub use posting::{JobPosting, REQUIRED_FIELDS};
pub use scorer::{recommend, score, Recommendation};
pub use vectorizer::{FittedVectorizer, Language, QueryVector, SparseRow, VectorizerConfig};

pub type TermId = u32;
