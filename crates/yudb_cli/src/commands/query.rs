//! Document selection and patching from command-line arguments.

use clap::Args;
use serde_json::{Map, Value};
use thiserror::Error;
use yudb_core::{id, Document, ID_FIELD};

/// Errors in selector or patch arguments.
#[derive(Debug, Error)]
pub enum QueryError {
    /// `--where` was not of the form `KEY=VALUE`.
    #[error("expected KEY=VALUE, got '{0}'")]
    MalformedWhere(String),

    /// A destructive command was given no selector.
    #[error("select documents with --id, --where or --all")]
    NoSelector,

    /// The patch was not a JSON object.
    #[error("--set expects a JSON object")]
    PatchNotObject,

    /// An argument was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which documents a command applies to.
#[derive(Args, Debug, Default, Clone)]
#[group(multiple = false)]
pub struct Selector {
    /// Match the document with this `$id`
    #[arg(long)]
    pub id: Option<String>,

    /// Match documents whose top-level field equals a value
    #[arg(long = "where", value_name = "KEY=VALUE")]
    pub filter: Option<String>,

    /// Match every document
    #[arg(long)]
    pub all: bool,
}

/// A predicate over documents.
pub type Predicate = Box<dyn Fn(&Document) -> bool>;

impl Selector {
    /// Builds the predicate, matching everything when nothing was selected.
    pub fn predicate_or_all(&self) -> Result<Predicate, QueryError> {
        Ok(self
            .predicate()?
            .unwrap_or_else(|| Box::new(yudb_core::all) as Predicate))
    }

    /// Builds the predicate, refusing an empty selection.
    pub fn require(&self) -> Result<Predicate, QueryError> {
        self.predicate()?.ok_or(QueryError::NoSelector)
    }

    fn predicate(&self) -> Result<Option<Predicate>, QueryError> {
        if let Some(target) = &self.id {
            return Ok(Some(Box::new(id(target.clone()))));
        }
        if let Some(filter) = &self.filter {
            let (key, value) = parse_where(filter)?;
            return Ok(Some(Box::new(move |document: &Document| {
                document.get(&key) == Some(&value)
            })));
        }
        if self.all {
            return Ok(Some(Box::new(yudb_core::all)));
        }
        Ok(None)
    }
}

/// Splits `KEY=VALUE`. The value is read as JSON, falling back to a plain
/// string, so `age=30` matches a number and `name=Ada` a string.
pub fn parse_where(text: &str) -> Result<(String, Value), QueryError> {
    let (key, raw) = text
        .split_once('=')
        .ok_or_else(|| QueryError::MalformedWhere(text.to_string()))?;
    if key.is_empty() {
        return Err(QueryError::MalformedWhere(text.to_string()));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Parses a `--set` argument.
pub fn parse_patch(text: &str) -> Result<Map<String, Value>, QueryError> {
    match serde_json::from_str(text)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(QueryError::PatchNotObject),
    }
}

/// Shallow-merges `patch` into `document`. `$id` is never overwritten.
pub fn merge(mut document: Document, patch: &Map<String, Value>) -> Document {
    if let Value::Object(fields) = &mut document {
        for (key, value) in patch {
            if key != ID_FIELD {
                fields.insert(key.clone(), value.clone());
            }
        }
    }
    document
}
