//! Query terms of the document store's JSON protocol
//!
//! A term is `[code, [args..], {optargs}]`. Objects are sent as plain JSON,
//! arrays have to be wrapped in a `MAKE_ARRAY` term.

use serde_json::{json, Map, Value};

pub const MAKE_ARRAY: u64 = 2;
pub const DB: u64 = 14;
pub const TABLE: u64 = 15;
pub const GET: u64 = 16;
pub const INSERT: u64 = 56;
pub const DB_CREATE: u64 = 57;
pub const DB_LIST: u64 = 59;
pub const TABLE_CREATE: u64 = 60;
pub const TABLE_LIST: u64 = 62;

/// Query types
pub const START: u64 = 1;
pub const CONTINUE: u64 = 2;

/// Encode a JSON value as a datum term
pub fn datum(value: &Value) -> Value {
    match value {
        Value::Array(items) => json!([MAKE_ARRAY, items.iter().map(datum).collect::<Vec<_>>()]),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), datum(value)))
                .collect::<Map<_, _>>(),
        ),
        other => other.clone(),
    }
}

pub fn db(name: &str) -> Value {
    json!([DB, [name]])
}

pub fn table(db_name: &str, table: &str) -> Value {
    json!([TABLE, [db(db_name), table]])
}

pub fn db_list() -> Value {
    json!([DB_LIST, []])
}

pub fn db_create(name: &str) -> Value {
    json!([DB_CREATE, [name]])
}

pub fn table_list(db_name: &str) -> Value {
    json!([TABLE_LIST, [db(db_name)]])
}

pub fn table_create(db_name: &str, table: &str, primary_key: &str, shards: u32, replicas: u32) -> Value {
    json!([
        TABLE_CREATE,
        [db(db_name), table],
        {"primary_key": primary_key, "shards": shards, "replicas": replicas}
    ])
}

pub fn get(db_name: &str, table_name: &str, key: &str) -> Value {
    json!([GET, [table(db_name, table_name), key]])
}

/// Insert one document, replacing any document with the same primary key
pub fn insert_replace(db_name: &str, table_name: &str, document: &Value) -> Value {
    json!([
        INSERT,
        [table(db_name, table_name), datum(document)],
        {"conflict": "replace"}
    ])
}

/// `[START, term, {}]`
pub fn start(term: Value) -> Value {
    json!([START, term, {}])
}

pub fn continue_query() -> Value {
    json!([CONTINUE])
}
