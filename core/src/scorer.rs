use crate::error::{Error, Result};
use crate::index::JobIndex;
use crate::vectorizer::{QueryVector, SparseRow};
use serde::Serialize;

/// One ranked posting as handed to a serving shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// 1-based position in the result list.
    pub rank: usize,
    /// Row of the posting in the index.
    pub row: usize,
    pub id: String,
    pub title: String,
    pub location: String,
    pub company: String,
    pub description: String,
    pub score: f32,
    pub origin: Option<String>,
    pub publication_date: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub salary: Option<String>,
    pub contract_type: Option<String>,
    pub category: Option<String>,
}

/// Rank the postings of `index` against free-text `query` and return the best
/// `min(top_n, index.len())` of them.
///
/// Postings with no vocabulary overlap still fill the list with a score of 0.0.
pub fn recommend(index: &JobIndex, query: &str, top_n: usize) -> Result<Vec<Recommendation>> {
    if top_n == 0 {
        return Err(Error::InvalidTopN);
    }
    let query_vec = index.vectorizer.transform(query);
    let scores = score(index, &query_vec)?;
    tracing::debug!(top_n, terms = query_vec.row.indices.len(), "scored query");
    Ok(top_ranked(index, &scores, top_n))
}

/// Cosine similarity of `query` against every row, in row order.
pub fn score(index: &JobIndex, query: &QueryVector) -> Result<Vec<f32>> {
    let index_dims = index.dims();
    if index_dims == 0 {
        return Err(Error::EmptyVocabulary);
    }
    if query.dims != index_dims {
        return Err(Error::IndexMismatch { query_dims: query.dims, index_dims });
    }

    // hand-built vectors may carry columns past `dims`
    if let Some(&col) = query.row.indices.iter().find(|&&c| c as usize >= index_dims) {
        return Err(Error::IndexMismatch { query_dims: col as usize + 1, index_dims });
    }
    query.row.check_shape(index_dims).map_err(Error::MalformedQuery)?;

    let mut dense = vec![0.0f32; index_dims];
    for (col, w) in query.row.iter() {
        dense[col as usize] = w;
    }
    let q_norm = query.row.norm();
    Ok(index.matrix.rows.iter().map(|row| cosine(&dense, q_norm, row)).collect())
}

fn cosine(dense_query: &[f32], q_norm: f32, row: &SparseRow) -> f32 {
    let r_norm = row.norm();
    if q_norm == 0.0 || r_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = row.iter().map(|(col, w)| dense_query[col as usize] * w).sum();
    dot / (q_norm * r_norm)
}

fn top_ranked(index: &JobIndex, scores: &[f32], top_n: usize) -> Vec<Recommendation> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable: equal scores keep corpus order.
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, row)| {
            let p = &index.postings[row];
            Recommendation {
                rank: i + 1,
                row,
                id: p.id.clone(),
                title: p.title.clone(),
                location: p.location.clone(),
                company: p.company.clone(),
                description: p.description.clone(),
                score: scores[row],
                origin: p.origin.clone(),
                publication_date: p.publication_date.clone(),
                city: p.city.clone(),
                postal_code: p.postal_code.clone(),
                salary: p.salary.clone(),
                contract_type: p.contract_type.clone(),
                category: p.category.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobPosting, VectorizerConfig};

    fn two_postings() -> JobIndex {
        let postings = vec![
            JobPosting::new("1", "Data Engineer", "Python Spark", "Paris", "Acme"),
            JobPosting::new("2", "Chef de projet", "Agile", "Lyon", "Beta"),
        ];
        JobIndex::build(VectorizerConfig::default(), postings).unwrap()
    }

    #[test]
    fn data_engineer_query_ranks_matching_posting_first() {
        let index = two_postings();
        let recs = recommend(&index, "data engineer paris", 2).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Data Engineer");
        assert!(recs[0].score > 0.0);
        assert_eq!(recs[1].title, "Chef de projet");
        assert_eq!(recs[1].score, 0.0);
        assert_eq!((recs[0].rank, recs[1].rank), (1, 2));
    }

    #[test]
    fn top_n_larger_than_corpus_returns_every_posting() {
        let recs = recommend(&two_postings(), "agile", 5).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].company, "Beta");
    }

    #[test]
    fn zero_top_n_is_rejected() {
        assert!(matches!(recommend(&two_postings(), "data", 0), Err(Error::InvalidTopN)));
    }

    #[test]
    fn no_overlap_scores_zero_and_keeps_corpus_order() {
        let index = two_postings();
        let recs = recommend(&index, "boulanger nantes", 2).unwrap();
        assert!(recs.iter().all(|r| r.score == 0.0));
        assert_eq!(recs.iter().map(|r| r.row).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let postings = vec![
            JobPosting::new("a", "rust", "", "", "x"),
            JobPosting::new("b", "java", "", "", ""),
            JobPosting::new("c", "rust", "", "", "x"),
        ];
        let index = JobIndex::build(VectorizerConfig::default(), postings).unwrap();
        let recs = recommend(&index, "rust", 3).unwrap();
        assert_eq!(recs.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["a", "c", "b"]);
        assert_eq!(recs[0].score, recs[1].score);
    }

    #[test]
    fn foreign_vector_is_a_mismatch() {
        let index = two_postings();
        let before = index.clone();
        let foreign = QueryVector::new(index.dims() + 3, SparseRow::default());
        match score(&index, &foreign) {
            Err(Error::IndexMismatch { query_dims, index_dims }) => {
                assert_eq!(query_dims, index.dims() + 3);
                assert_eq!(index_dims, index.dims());
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert_eq!(index, before);
    }

    #[test]
    fn scores_are_non_increasing() {
        let postings = vec![
            JobPosting::new("1", "Développeur Rust", "backend rust tokio", "Paris", "Acme"),
            JobPosting::new("2", "Développeur Java", "backend spring", "Lyon", "Beta"),
            JobPosting::new("3", "Data Analyst", "sql tableau", "Paris", "Gamma"),
            JobPosting::new("4", "Ingénieur Rust", "embarqué rust", "Toulouse", "Delta"),
        ];
        let index = JobIndex::build(VectorizerConfig::default(), postings).unwrap();
        let recs = recommend(&index, "développeur rust backend", 4).unwrap();
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(recs[0].id, "1");
    }
}
