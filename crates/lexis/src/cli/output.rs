//! JSON envelopes printed by every command

use lexis::{ErrorKind, Failure, LexisError};
use serde::Serialize;
use serde_json::{json, Value};

/// Print `{"data": data}`.
pub fn print_data<T: Serialize>(data: &T) -> anyhow::Result<()> {
    print_json(&json!({ "data": data }))
}

/// Print `{"data": data, "meta": meta}`.
pub fn print_data_with_meta<T: Serialize>(data: &T, meta: Value) -> anyhow::Result<()> {
    print_json(&json!({ "data": data, "meta": meta }))
}

/// Print `{"error": ..., "code": ...}` for a failed command.
///
/// Errors that did not come from a Lexis operation are reported as internal.
pub fn print_error(err: &anyhow::Error) {
    let failure = failure_for(err);
    if let Err(json_err) = print_json(&json!(failure)) {
        eprintln!("{:#} ({})", err, json_err);
    }
}

fn failure_for(err: &anyhow::Error) -> Failure {
    match err.downcast_ref::<LexisError>() {
        Some(lexis_err) => lexis_err.to_failure(),
        None => Failure {
            error: format!("{:#}", err),
            code: ErrorKind::Internal.code(),
        },
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
