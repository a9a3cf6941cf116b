#![allow(dead_code)]

use data_processing::{Data, DataError};

use std::collections::BTreeMap;
use thiserror::Error;

/// Error raised by the test transforms below.
#[derive(Debug, PartialEq, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

/// Builds a record `{"id": id, "shape": [rows, cols]}`.
pub fn make_record(id: i64, rows: i64, cols: i64) -> Data {
    Data::Dict(BTreeMap::from([
        ("id".to_string(), Data::Int(id)),
        (
            "shape".to_string(),
            Data::List(vec![Data::Int(rows), Data::Int(cols)]),
        ),
    ]))
}

/// Transposes a record's shape. Only 2-d shapes are accepted.
pub fn transpose(record: Data) -> Result<Data, TransformError> {
    let mut fields = record
        .into_dict()
        .map_err(|e| TransformError(e.to_string()))?;

    let dims = fields
        .remove("shape")
        .ok_or_else(|| TransformError("missing shape".into()))?
        .into_list()
        .map_err(|e: DataError| TransformError(e.to_string()))?;

    if dims.len() != 2 {
        return Err(TransformError("bad shape".into()));
    }

    let mut dims = dims.into_iter();
    let (rows, cols) = (dims.next(), dims.next());
    fields.insert(
        "shape".to_string(),
        Data::List(cols.into_iter().chain(rows).collect()),
    );
    Ok(Data::Dict(fields))
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
