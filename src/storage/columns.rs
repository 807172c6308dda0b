use arrow::array::{Array, Float64Array, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use tracing::error;
use crate::{Error, Result};

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str, kind: &str) -> Result<&'a A> {
    let idx = batch.schema().index_of(name).map_err(|e| {
        error!("Failed to get {} column index: {}", name, e);
        Error::Arrow(format!("Missing column {}: {}", name, e))
    })?;

    batch
        .column(idx)
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| {
            error!("Failed to cast {} column to {}", name, kind);
            Error::Arrow(format!("Column {} is not a {}", name, kind))
        })
}

pub fn get_string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    column(batch, name, "StringArray")
}

pub fn get_uint64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt64Array> {
    column(batch, name, "UInt64Array")
}

pub fn get_float64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    column(batch, name, "Float64Array")
}
