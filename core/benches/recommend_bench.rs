use criterion::{criterion_group, criterion_main, Criterion};
use jobrec_core::{recommend, JobIndex, JobPosting, VectorizerConfig};

fn synthetic_corpus(n: usize) -> Vec<JobPosting> {
    let titles = ["Data Engineer", "Développeur Rust", "Chef de projet", "Data Analyst", "Ingénieur DevOps"];
    let skills = ["python spark airflow", "tokio axum backend", "agile scrum pilotage", "sql power bi", "kubernetes terraform"];
    let cities = ["Paris", "Lyon", "Nantes", "Toulouse", "Lille"];
    (0..n)
        .map(|i| {
            JobPosting::new(
                i.to_string(),
                titles[i % titles.len()],
                format!("{} mission {i}", skills[(i / 3) % skills.len()]),
                cities[(i / 7) % cities.len()],
                format!("company{}", i % 97),
            )
        })
        .collect()
}

fn bench_recommend(c: &mut Criterion) {
    let index = JobIndex::build(VectorizerConfig::default(), synthetic_corpus(5_000)).expect("fit");
    c.bench_function("recommend_5k", |b| b.iter(|| recommend(&index, "data engineer python paris", 10)));
    c.bench_function("fit_5k", |b| b.iter(|| JobIndex::build(VectorizerConfig::default(), synthetic_corpus(5_000))));
}

criterion_group!(benches, bench_recommend);
criterion_main!(benches);
