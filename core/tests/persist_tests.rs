use jobrec_core::persist::{load_header, load_index, save_index, MAGIC};
use jobrec_core::{recommend, Error, JobIndex, JobPosting, Language, VectorizerConfig, FORMAT_VERSION};
use std::fs;
use tempfile::tempdir;

fn sample_index() -> JobIndex {
    let postings = vec![
        JobPosting::new("ft-1", "Data Engineer", "Python Spark Airflow", "Paris", "Acme"),
        JobPosting::new("ft-2", "Chef de projet", "Agile Scrum", "Lyon", "Beta"),
        JobPosting::new("az-3", "Data Scientist", "Python machine learning", "Paris", "Gamma"),
    ];
    JobIndex::build(VectorizerConfig::default(), postings).unwrap()
}

#[test]
fn save_then_load_is_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("models/jobs.idx");
    let index = sample_index();
    save_index(&path, &index).unwrap();

    let loaded = load_index(&path).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(loaded.vectorizer.vocabulary, index.vectorizer.vocabulary);
    let ids: Vec<&str> = loaded.postings.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["ft-1", "ft-2", "az-3"]);
    assert_eq!(
        recommend(&loaded, "python paris", 3).unwrap(),
        recommend(&index, "python paris", 3).unwrap()
    );
}

#[test]
fn vectorizer_config_survives_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.idx");
    let config = VectorizerConfig {
        language: Language::English,
        extra_stop_words: vec!["senior".into()],
        stem: true,
        sublinear_tf: true,
        max_features: Some(50),
        ..VectorizerConfig::default()
    };
    let index = JobIndex::build(config.clone(), vec![JobPosting::new("1", "Senior engineers", "building", "", "")]).unwrap();
    save_index(&path, &index).unwrap();
    assert_eq!(load_index(&path).unwrap().vectorizer.config, config);
}

#[test]
fn header_can_be_read_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.idx");
    let index = sample_index();
    save_index(&path, &index).unwrap();
    let header = load_header(&path).unwrap();
    assert_eq!(header, index.header);
    assert_eq!(header.format_version, FORMAT_VERSION);
    assert_eq!(header.num_postings, 3);
}

#[test]
fn header_survives_a_truncated_body() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.idx");
    let index = sample_index();
    save_index(&path, &index).unwrap();
    let bytes = fs::read(&path).unwrap();
    // keep the preamble and the header, drop most of the vocabulary and matrix
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert_eq!(load_header(&path).unwrap(), index.header);
    assert!(matches!(load_index(&path), Err(Error::Storage { .. })));
}

#[test]
fn resave_replaces_artifact_wholesale() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.idx");
    save_index(&path, &sample_index()).unwrap();
    let smaller = JobIndex::build(VectorizerConfig::default(), vec![JobPosting::new("x", "Boulanger", "", "Nantes", "")]).unwrap();
    save_index(&path, &smaller).unwrap();
    assert_eq!(load_index(&path).unwrap(), smaller);
    // only the artifact remains, no temp files
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn save_onto_a_directory_fails_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.idx");
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("keep.txt"), "previous").unwrap();

    let err = save_index(&path, &sample_index()).unwrap_err();
    assert!(matches!(err, Error::Storage { .. }));
    assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "previous");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn corrupt_artifacts_are_storage_errors() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.idx");
    save_index(&good, &sample_index()).unwrap();
    let bytes = fs::read(&good).unwrap();

    let mut cases: Vec<(&str, Vec<u8>)> = Vec::new();
    cases.push(("empty", Vec::new()));
    let mut bad_magic = b"PKL!".to_vec();
    bad_magic.extend_from_slice(&bytes[4..]);
    cases.push(("bad-magic", bad_magic));
    let mut wrong_version = bytes.clone();
    wrong_version[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
    cases.push(("wrong-version", wrong_version));
    cases.push(("truncated", bytes[..bytes.len() - 7].to_vec()));
    let mut trailing = bytes.clone();
    trailing.extend_from_slice(b"junk");
    cases.push(("trailing", trailing));
    let mut garbage = MAGIC.to_vec();
    garbage.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    garbage.extend_from_slice(&[0xff; 16]);
    cases.push(("garbage", garbage));

    for (name, data) in cases {
        let path = dir.path().join(format!("{name}.idx"));
        fs::write(&path, data).unwrap();
        match load_index(&path) {
            Err(Error::Storage { .. }) => {}
            other => panic!("{name}: expected storage error, got {other:?}"),
        }
    }
}

#[test]
fn missing_file_is_a_storage_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(load_index(dir.path().join("absent.idx")), Err(Error::Storage { .. })));
}
