//! JSON I/O handling for CLI
//!
//! - Input: a single JSON document on stdin
//! - Output: a single JSON object on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&input)?;
    Ok(value)
}

/// Success envelope around `data`
pub fn ok_envelope(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope
pub fn error_envelope(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&ok_envelope(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = ok_envelope(serde_json::json!({"rows": 2}));
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["data"]["rows"], 2);

        let err = error_envelope("SAVKIT_CLI_IO_ERROR", "Empty input");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "SAVKIT_CLI_IO_ERROR");
        assert_eq!(err["message"], "Empty input");
    }
}
