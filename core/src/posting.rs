use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Text fields that feed the combined document, in concatenation order.
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "description", "location", "company"];

/// One job listing as seen by the recommender.
///
/// Only the four required text fields are vectorized; everything else is
/// carried through for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub company: String,
    pub origin: Option<String>,
    pub publication_date: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub salary: Option<String>,
    pub contract_type: Option<String>,
    pub category: Option<String>,
}

impl JobPosting {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            location: location.into(),
            company: company.into(),
            ..Self::default()
        }
    }

    /// Title, description, location and company joined by single spaces.
    pub fn combined_text(&self) -> String {
        [self.title.as_str(), self.description.as_str(), self.location.as_str(), self.company.as_str()].join(" ")
    }
}

/// Fails with [`Error::Schema`] listing every required field absent from `columns`.
///
/// Column names are compared case-insensitively.
pub fn validate_columns<'a, I>(columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: BTreeSet<String> = columns.into_iter().map(normalize_key).collect();
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|f| !present.contains(**f))
        .map(|f| f.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema { missing })
    }
}

/// Turn raw JSON records into postings.
///
/// The schema is the union of keys over all records, so a column counts as
/// present if at least one record carries it. Records that lack a value for a
/// required column get an empty string.
pub fn postings_from_records(records: Vec<Value>) -> Result<Vec<JobPosting>> {
    let mut rows: Vec<Record> = Vec::with_capacity(records.len());
    for (i, value) in records.into_iter().enumerate() {
        match value {
            Value::Object(map) => rows.push(Record::new(map)),
            other => {
                return Err(Error::Corpus {
                    location: format!("record #{i}"),
                    reason: format!("expected a JSON object, found {}", json_kind(&other)),
                })
            }
        }
    }
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns: BTreeSet<&str> = rows.iter().flat_map(|r| r.fields.keys().map(String::as_str)).collect();
    validate_columns(columns)?;

    let postings = rows.iter().enumerate().map(|(i, r)| r.to_posting(i)).collect();
    Ok(postings)
}

struct Record {
    fields: Map<String, Value>,
}

impl Record {
    fn new(raw: Map<String, Value>) -> Self {
        let fields = raw.into_iter().map(|(k, v)| (normalize_key(&k), v)).collect();
        Self { fields }
    }

    /// `None` for absent or null values; scalars are rendered as text.
    fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            nested => Some(nested.to_string()),
        }
    }

    fn required(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    fn to_posting(&self, row: usize) -> JobPosting {
        JobPosting {
            id: self.text("id").unwrap_or_else(|| row.to_string()),
            title: self.required("title"),
            description: self.required("description"),
            location: self.required("location"),
            company: self.required("company"),
            origin: self.text("origin"),
            publication_date: self.text("publication_date"),
            city: self.text("city"),
            postal_code: self.text("postal_code"),
            salary: self.text("salary"),
            contract_type: self.text("contract_type"),
            category: self.text("category"),
        }
    }
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "code_postal" => "postal_code".to_string(),
        _ => key,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn combined_text_keeps_field_order() {
        let p = JobPosting::new("1", "Data Engineer", "Python Spark", "Paris", "Acme");
        assert_eq!(p.combined_text(), "Data Engineer Python Spark Paris Acme");
    }

    #[test]
    fn missing_values_become_empty_strings() {
        let records = vec![
            json!({"TITLE": "Chef", "DESCRIPTION": null, "LOCATION": "Lyon", "COMPANY": "Beta"}),
            json!({"title": "Dev", "description": "Rust", "location": "Nantes"}),
        ];
        let postings = postings_from_records(records).unwrap();
        assert_eq!(postings[0].description, "");
        assert_eq!(postings[1].company, "");
        assert_eq!(postings[0].id, "0");
        assert_eq!(postings[1].id, "1");
    }

    #[test]
    fn schema_error_lists_every_missing_field() {
        let records = vec![json!({"title": "Chef", "location": "Lyon"})];
        match postings_from_records(records) {
            Err(Error::Schema { missing }) => assert_eq!(missing, vec!["description", "company"]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn passthrough_scalars_are_rendered_as_text() {
        let records = vec![json!({
            "id": 42, "title": "a", "description": "b", "location": "c", "company": "d",
            "salary": 3500.5, "code_postal": "75011", "origin": "Adzuna"
        })];
        let p = &postings_from_records(records).unwrap()[0];
        assert_eq!(p.id, "42");
        assert_eq!(p.salary.as_deref(), Some("3500.5"));
        assert_eq!(p.postal_code.as_deref(), Some("75011"));
        assert_eq!(p.origin.as_deref(), Some("Adzuna"));
        assert_eq!(p.category, None);
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = postings_from_records(vec![json!(["not", "an", "object"])]).unwrap_err();
        assert!(matches!(err, Error::Corpus { .. }));
    }
}
