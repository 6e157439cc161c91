//! Property-based test generators using proptest.
//!
//! Provides strategies for generating names, documents, and namespace
//! operations.

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating names `validate_name` accepts.
pub fn valid_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z_$][A-Za-z0-9_$]{0,15}").expect("Invalid regex")
}

/// Strategy for generating names `validate_name` rejects.
pub fn invalid_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        prop::string::string_regex("[0-9][A-Za-z0-9_$]{0,8}").expect("Invalid regex"),
        prop::string::string_regex("[A-Za-z_$]{1,4}[-. /!@#%^&*()+=]{1,3}[A-Za-z]{0,4}")
            .expect("Invalid regex"),
        prop::string::string_regex("[a-z]{0,3}[éßü日本][a-z]{0,3}").expect("Invalid regex"),
    ]
}

/// Strategy for generating JSON scalars.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,12}")
            .expect("Invalid regex")
            .prop_map(Value::String),
    ]
}

/// Strategy for generating documents: objects without `$id` whose fields
/// hold scalars or short arrays of scalars.
pub fn document_strategy() -> impl Strategy<Value = Value> {
    let field = prop_oneof![
        3 => scalar_strategy(),
        1 => prop::collection::vec(scalar_strategy(), 0..4).prop_map(Value::Array),
    ];
    prop::collection::btree_map(
        prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
        field,
        0..6,
    )
    .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>()))
}

/// An operation on the namespace.
#[derive(Debug, Clone)]
pub enum NamespaceOperation {
    /// Create a database
    CreateDatabase {
        /// Database name
        database: String,
    },
    /// Create a collection
    CreateCollection {
        /// Database name
        database: String,
        /// Collection name
        collection: String,
    },
    /// Remove a database
    RemoveDatabase {
        /// Database name
        database: String,
    },
    /// Remove a collection
    RemoveCollection {
        /// Database name
        database: String,
        /// Collection name
        collection: String,
    },
}

/// Strategy for generating namespace operations over a small name pool,
/// so sequences hit existing and missing entities alike.
pub fn namespace_operation_strategy() -> impl Strategy<Value = NamespaceOperation> {
    let database = prop::sample::select(vec!["a", "b", "c", "9bad"]).prop_map(String::from);
    let collection = prop::sample::select(vec!["x", "y", "bad-name"]).prop_map(String::from);
    prop_oneof![
        3 => database.clone().prop_map(|database| NamespaceOperation::CreateDatabase { database }),
        3 => (database.clone(), collection.clone()).prop_map(|(database, collection)| {
            NamespaceOperation::CreateCollection { database, collection }
        }),
        1 => database.clone().prop_map(|database| NamespaceOperation::RemoveDatabase { database }),
        1 => (database, collection).prop_map(|(database, collection)| {
            NamespaceOperation::RemoveCollection { database, collection }
        }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<NamespaceOperation>> {
    prop::collection::vec(namespace_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
