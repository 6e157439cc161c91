//! Collection contents shared by the bundled engines.
//!
//! Both engines keep a collection as its schema plus an ordered list of
//! encoded documents. The in-memory engine holds these permanently; the file
//! engine loads one, mutates it, and writes it back.

use crate::engine::{DocumentFilter, DocumentTransform};
use crate::error::{StorageError, StorageResult};
use crate::schema::Schema;
use serde_json::Value;
use uuid::Uuid;

/// Name of the identity field every stored document carries.
pub const ID_FIELD: &str = "$id";

/// One stored document: its identity and its encoded form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredDocument {
    pub(crate) id: Value,
    pub(crate) text: String,
}

/// The outcome of a delete or replace, computed without mutating the
/// collection.
#[derive(Debug)]
pub(crate) struct Plan {
    documents: Vec<StoredDocument>,
    changed: usize,
}

/// The schema and documents of one collection.
#[derive(Debug, Clone)]
pub(crate) struct StoredCollection {
    database: String,
    name: String,
    schema_text: String,
    schema: Schema,
    documents: Vec<StoredDocument>,
}

impl StoredCollection {
    /// Creates an empty collection, checking the schema.
    pub(crate) fn new(database: &str, name: &str, schema_text: &str) -> StorageResult<Self> {
        let schema = Schema::parse(schema_text)?;
        Ok(Self {
            database: database.to_string(),
            name: name.to_string(),
            schema_text: schema_text.to_string(),
            schema,
            documents: Vec::new(),
        })
    }

    /// Rebuilds a collection from persisted documents.
    ///
    /// Persisted documents are trusted to already carry a `$id`.
    pub(crate) fn restore(
        database: &str,
        name: &str,
        schema_text: &str,
        texts: Vec<String>,
    ) -> StorageResult<Self> {
        let mut collection = Self::new(database, name, schema_text)?;
        for text in texts {
            let value: Value = serde_json::from_str(&text)?;
            let id = value.get(ID_FIELD).cloned().ok_or_else(|| {
                StorageError::Corrupted(format!("stored document without {ID_FIELD}"))
            })?;
            collection.documents.push(StoredDocument { id, text });
        }
        Ok(collection)
    }

    pub(crate) fn schema_text(&self) -> &str {
        &self.schema_text
    }

    pub(crate) fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.text.as_str())
    }

    /// Validates and appends a document, assigning a `$id` when missing.
    ///
    /// Returns the encoded form that was stored.
    pub(crate) fn insert(&mut self, text: &str) -> StorageResult<&str> {
        let mut value: Value = serde_json::from_str(text)?;
        let id = self.prepare(&mut value, None)?;

        if self.documents.iter().any(|d| d.id == id) {
            return Err(StorageError::DuplicateId {
                database: self.database.clone(),
                collection: self.name.clone(),
                id: id.to_string(),
            });
        }

        let text = serde_json::to_string(&value)?;
        self.documents.push(StoredDocument { id, text });
        let stored = self.documents.last().map(|d| d.text.as_str());
        Ok(stored.unwrap_or_default())
    }

    /// Returns every document the filter accepts, in insertion order.
    pub(crate) fn select(&self, filter: &dyn DocumentFilter) -> StorageResult<Vec<String>> {
        let mut selected = Vec::new();
        for doc in &self.documents {
            if filter.matches(&doc.text)? {
                selected.push(doc.text.clone());
            }
        }
        Ok(selected)
    }

    /// Computes the contents left after removing every match.
    pub(crate) fn plan_removal(&self, filter: &dyn DocumentFilter) -> StorageResult<Plan> {
        let verdicts = self.evaluate(filter)?;
        let changed = verdicts.iter().filter(|m| **m).count();
        let documents = self
            .documents
            .iter()
            .zip(verdicts)
            .filter(|(_, matched)| !matched)
            .map(|(doc, _)| doc.clone())
            .collect();
        Ok(Plan { documents, changed })
    }

    /// Computes the contents after replacing every match.
    ///
    /// All replacements are computed and validated before any is applied.
    pub(crate) fn plan_replacement(
        &self,
        filter: &dyn DocumentFilter,
        transform: &dyn DocumentTransform,
    ) -> StorageResult<Plan> {
        let verdicts = self.evaluate(filter)?;

        let mut documents = Vec::with_capacity(self.documents.len());
        let mut changed = 0;
        for (doc, matched) in self.documents.iter().zip(verdicts) {
            if !matched {
                documents.push(doc.clone());
                continue;
            }
            let replaced = transform.transform(&doc.text)?;
            let mut value: Value = serde_json::from_str(&replaced)?;
            let id = self.prepare(&mut value, Some(&doc.id))?;
            documents.push(StoredDocument {
                id,
                text: serde_json::to_string(&value)?,
            });
            changed += 1;
        }

        // Identities must stay unique after the whole batch is applied.
        for (i, doc) in documents.iter().enumerate() {
            if documents[..i].iter().any(|other| other.id == doc.id) {
                return Err(StorageError::DuplicateId {
                    database: self.database.clone(),
                    collection: self.name.clone(),
                    id: doc.id.to_string(),
                });
            }
        }

        Ok(Plan { documents, changed })
    }

    /// Installs a plan and returns how many documents it changed.
    pub(crate) fn apply(&mut self, plan: Plan) -> usize {
        self.documents = plan.documents;
        plan.changed
    }

    fn evaluate(&self, filter: &dyn DocumentFilter) -> StorageResult<Vec<bool>> {
        self.documents
            .iter()
            .map(|doc| filter.matches(&doc.text))
            .collect()
    }

    /// Checks shape and schema, filling in `$id` from `inherit` or a new UUID.
    fn prepare(&self, value: &mut Value, inherit: Option<&Value>) -> StorageResult<Value> {
        let Some(fields) = value.as_object_mut() else {
            return Err(StorageError::InvalidDocument(format!(
                "documents must be JSON objects, got {value}"
            )));
        };

        if !fields.contains_key(ID_FIELD) {
            let id = inherit
                .cloned()
                .unwrap_or_else(|| Value::String(Uuid::new_v4().simple().to_string()));
            fields.insert(ID_FIELD.to_string(), id);
        }
        let id = fields.get(ID_FIELD).cloned().unwrap_or(Value::Null);

        self.schema.validate(value).map_err(|message| {
            StorageError::schema_violation(&self.database, &self.name, message)
        })?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MatchAll;
    use crate::error::CallbackError;
    use proptest::prelude::*;
    use serde_json::json;

    impl StoredCollection {
        fn remove_matching(&mut self, filter: &dyn DocumentFilter) -> StorageResult<usize> {
            let plan = self.plan_removal(filter)?;
            Ok(self.apply(plan))
        }

        fn replace_matching(
            &mut self,
            filter: &dyn DocumentFilter,
            transform: &dyn DocumentTransform,
        ) -> StorageResult<usize> {
            let plan = self.plan_replacement(filter, transform)?;
            Ok(self.apply(plan))
        }
    }

    fn collection() -> StoredCollection {
        StoredCollection::new("db", "people", "{}").unwrap()
    }

    fn by_name(name: &'static str) -> impl Fn(&str) -> Result<bool, CallbackError> {
        move |doc: &str| {
            let value: Value = serde_json::from_str(doc)?;
            Ok(value["name"] == name)
        }
    }

    #[test]
    fn insert_assigns_id() {
        let mut c = collection();
        let stored = c.insert(r#"{"name":"Ada"}"#).unwrap().to_string();
        let value: Value = serde_json::from_str(&stored).unwrap();
        assert!(value[ID_FIELD].is_string());
    }

    #[test]
    fn insert_keeps_given_id_and_rejects_duplicates() {
        let mut c = collection();
        c.insert(r#"{"$id":"a","n":1}"#).unwrap();
        let err = c.insert(r#"{"$id":"a","n":2}"#).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { .. }));
    }

    #[test]
    fn insert_rejects_non_objects() {
        let mut c = collection();
        assert!(matches!(
            c.insert("[1,2]"),
            Err(StorageError::InvalidDocument(_))
        ));
    }

    #[test]
    fn insert_enforces_schema() {
        let mut c = StoredCollection::new("db", "c", r#"{"required":["name"]}"#).unwrap();
        assert!(matches!(
            c.insert(r#"{"age":1}"#),
            Err(StorageError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn select_preserves_insertion_order() {
        let mut c = collection();
        for name in ["c", "a", "b"] {
            c.insert(&json!({ "name": name }).to_string()).unwrap();
        }
        let names: Vec<Value> = c
            .select(&MatchAll)
            .unwrap()
            .iter()
            .map(|t| serde_json::from_str::<Value>(t).unwrap()["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("c"), json!("a"), json!("b")]);
    }

    #[test]
    fn remove_matching_counts() {
        let mut c = collection();
        for name in ["x", "y", "x"] {
            c.insert(&json!({ "name": name }).to_string()).unwrap();
        }
        assert_eq!(c.remove_matching(&by_name("x")).unwrap(), 2);
        assert_eq!(c.select(&MatchAll).unwrap().len(), 1);
    }

    #[test]
    fn failing_filter_leaves_collection_untouched() {
        let mut c = collection();
        c.insert(r#"{"name":"x"}"#).unwrap();
        c.insert(r#"{"name":"y"}"#).unwrap();

        let flaky = |doc: &str| -> Result<bool, CallbackError> {
            if doc.contains("\"y\"") {
                Err("boom".into())
            } else {
                Ok(true)
            }
        };
        assert!(c.remove_matching(&flaky).is_err());
        assert_eq!(c.select(&MatchAll).unwrap().len(), 2);
    }

    #[test]
    fn replace_inherits_missing_id() {
        let mut c = collection();
        c.insert(r#"{"$id":"k","name":"x"}"#).unwrap();

        let drop_id = |_: &str| -> Result<String, CallbackError> { Ok(r#"{"name":"z"}"#.into()) };
        assert_eq!(c.replace_matching(&MatchAll, &drop_id).unwrap(), 1);

        let docs = c.select(&MatchAll).unwrap();
        let value: Value = serde_json::from_str(&docs[0]).unwrap();
        assert_eq!(value, json!({"$id": "k", "name": "z"}));
    }

    #[test]
    fn replace_rejects_colliding_ids() {
        let mut c = collection();
        c.insert(r#"{"$id":"a"}"#).unwrap();
        c.insert(r#"{"$id":"b"}"#).unwrap();

        let collide =
            |_: &str| -> Result<String, CallbackError> { Ok(r#"{"$id":"same"}"#.into()) };
        assert!(matches!(
            c.replace_matching(&MatchAll, &collide),
            Err(StorageError::DuplicateId { .. })
        ));
        assert_eq!(c.select(&MatchAll).unwrap().len(), 2);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Insert(i64),
        Remove { below: i64, fail_at: Option<i64> },
        Bump { below: i64, fail_at: Option<i64> },
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        let bounds = (0i64..20, proptest::option::of(0i64..20));
        prop_oneof![
            2 => (0i64..20).prop_map(Step::Insert),
            1 => bounds.clone().prop_map(|(below, fail_at)| Step::Remove { below, fail_at }),
            1 => bounds.prop_map(|(below, fail_at)| Step::Bump { below, fail_at }),
        ]
    }

    fn number(doc: &str) -> Result<i64, CallbackError> {
        let value: Value = serde_json::from_str(doc)?;
        value["n"].as_i64().ok_or_else(|| "missing n".into())
    }

    proptest! {
        #[test]
        fn callbacks_apply_all_or_nothing(steps in prop::collection::vec(step_strategy(), 1..40)) {
            let mut c = collection();
            let mut model: Vec<i64> = Vec::new();

            for step in steps {
                let before = c.select(&MatchAll).unwrap();
                match step {
                    Step::Insert(n) => {
                        c.insert(&json!({ "n": n }).to_string()).unwrap();
                        model.push(n);
                    }
                    Step::Remove { below, fail_at } => {
                        let filter = move |doc: &str| -> Result<bool, CallbackError> {
                            let n = number(doc)?;
                            if Some(n) == fail_at {
                                return Err("filter failed".into());
                            }
                            Ok(n < below)
                        };
                        let fails = fail_at.is_some_and(|f| model.contains(&f));
                        let matching = model.iter().filter(|n| **n < below).count();
                        match c.remove_matching(&filter) {
                            Ok(removed) => {
                                prop_assert!(!fails);
                                prop_assert_eq!(removed, matching);
                                model.retain(|n| *n >= below);
                            }
                            Err(_) => {
                                prop_assert!(fails);
                                prop_assert_eq!(c.select(&MatchAll).unwrap(), before);
                            }
                        }
                    }
                    Step::Bump { below, fail_at } => {
                        let filter = move |doc: &str| -> Result<bool, CallbackError> {
                            Ok(number(doc)? < below)
                        };
                        let bump = move |doc: &str| -> Result<String, CallbackError> {
                            let mut value: Value = serde_json::from_str(doc)?;
                            let n = number(doc)?;
                            if Some(n) == fail_at {
                                return Err("transform failed".into());
                            }
                            value["n"] = json!(n + 100);
                            Ok(value.to_string())
                        };
                        let fails = fail_at.is_some_and(|f| f < below && model.contains(&f));
                        let matching = model.iter().filter(|n| **n < below).count();
                        match c.replace_matching(&filter, &bump) {
                            Ok(replaced) => {
                                prop_assert!(!fails);
                                prop_assert_eq!(replaced, matching);
                                for n in model.iter_mut().filter(|n| **n < below) {
                                    *n += 100;
                                }
                            }
                            Err(_) => {
                                prop_assert!(fails);
                                prop_assert_eq!(c.select(&MatchAll).unwrap(), before);
                            }
                        }
                    }
                }

                let stored: Vec<i64> = c
                    .select(&MatchAll)
                    .unwrap()
                    .iter()
                    .map(|doc| number(doc).unwrap())
                    .collect();
                prop_assert_eq!(&stored, &model);
            }
        }
    }
}
