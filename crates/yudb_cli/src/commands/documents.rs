//! Document commands.

use super::print_json;
use super::query::{merge, parse_patch, Selector};
use yudb_core::{Collection, Document, Shell};

fn collection<'a>(
    shell: &'a Shell,
    database: &str,
    name: &str,
) -> Result<&'a Collection, Box<dyn std::error::Error>> {
    shell
        .collection(database, name)
        .ok_or_else(|| format!("Collection {database}/{name} does not exist").into())
}

/// Add documents given as JSON text.
pub fn add(
    shell: &Shell,
    database: &str,
    name: &str,
    documents: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let target = collection(shell, database, name)?;
    let documents = documents
        .iter()
        .map(|text| serde_json::from_str(text))
        .collect::<Result<Vec<Document>, _>>()?;
    print_json(&target.add(&documents)?)
}

/// Print matching documents.
pub fn read(
    shell: &Shell,
    database: &str,
    name: &str,
    selector: &Selector,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = collection(shell, database, name)?;
    print_json(&target.read(selector.predicate_or_all()?)?)
}

/// Delete matching documents.
pub fn delete(
    shell: &Shell,
    database: &str,
    name: &str,
    selector: &Selector,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = collection(shell, database, name)?;
    print_json(&target.delete(selector.require()?)?)
}

/// Merge a JSON object into every matching document.
pub fn update(
    shell: &Shell,
    database: &str,
    name: &str,
    selector: &Selector,
    set: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = collection(shell, database, name)?;
    let patch = parse_patch(set)?;
    let updated = target.update(selector.require()?, |document| merge(document, &patch))?;
    print_json(&updated)
}
