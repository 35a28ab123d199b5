//! CLI command implementations
//!
//! Every command writes one JSON envelope to stdout. Failures are also
//! returned so `main` exits non-zero.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::config::Config;
use crate::dictionary::{MissingValues, Variable, VariableKind};
use crate::document::{AccessMode, Document};
use crate::engine;
use crate::observability::Logger;
use crate::table::DataTable;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = load_config(cli.config.as_deref()).and_then(|config| run_command(cli.command, &config));
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config: &Config) -> CliResult<()> {
    match cmd {
        Command::Dict { file } => describe(&file),
        Command::Dump { file } => dump(&file),
        Command::Import { table, out } => import(&table, &out, config),
        Command::CopyDict { source, out } => copy_dictionary(&source, &out),
    }
}

/// Explicit config file, else the environment.
///
/// An explicit file also configures the engine, which must happen before
/// any document is touched.
fn load_config(path: Option<&Path>) -> CliResult<Config> {
    match path {
        Some(path) => {
            let config = Config::from_json_file(path).map_err(|e| CliError::config_error(e.to_string()))?;
            config.apply_log_level();
            if !engine::configure(&config) {
                let path = path.display().to_string();
                Logger::warn("ENGINE_CONFIG_IGNORED", &[("path", &path)]);
            }
            Ok(config)
        }
        None => Ok(Config::from_env()),
    }
}

/// Describe the variables of `file`
pub fn describe(file: &Path) -> CliResult<()> {
    let mut document = Document::open(file, AccessMode::Read)?;
    let variables = document
        .variables()
        .iter()
        .map(variable_json)
        .collect::<CliResult<Vec<Value>>>()?;
    let rows = document.cases()?.count()?;
    let compressed = document.is_compressed();
    document.close()?;

    write_response(json!({
        "compressed": compressed,
        "rows": rows,
        "variables": variables,
    }))
}

/// Print variables and rows of `file` as a table
pub fn dump(file: &Path) -> CliResult<()> {
    let mut document = Document::open(file, AccessMode::Read)?;
    let table = document.to_data_table()?;
    document.close()?;
    write_response(serde_json::to_value(&table)?)
}

/// Write the JSON table at `table_path` ("-" for stdin) to a new file at `out`
pub fn import(table_path: &Path, out: &Path, config: &Config) -> CliResult<()> {
    let request = if table_path == Path::new("-") {
        read_request()?
    } else {
        let content = fs::read_to_string(table_path)
            .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", table_path.display(), e)))?;
        serde_json::from_str(&content)?
    };
    let table: DataTable = serde_json::from_value(request)?;

    let mut document = Document::create_with_config(out, config)?;
    let rows = document.import_data(&table, &table.rows)?;
    let variables = document.variables().names().into_iter().map(String::from).collect::<Vec<_>>();
    document.close()?;

    write_response(json!({
        "rows": rows,
        "variables": variables,
    }))
}

/// Create `out` with the dictionary of `source` and no rows
pub fn copy_dictionary(source: &Path, out: &Path) -> CliResult<()> {
    let mut document = Document::create_from_dictionary(out, source)?;
    let count = document.variables().len();
    document.close()?;
    write_response(json!({ "variables": count }))
}

fn variable_json(variable: &Variable) -> CliResult<Value> {
    let mut entry = json!({
        "name": variable.name(),
        "label": variable.label(),
        "kind": variable.kind().name(),
        "spss_type": variable.spss_type(),
        "column_width": variable.column_width()?,
        "measurement_level": variable.measurement_level()?,
        "alignment": variable.alignment()?,
    });

    let details = match variable.kind() {
        VariableKind::Numeric(numeric) => json!({
            "print_format": numeric.print_format().to_string(),
            "write_format": numeric.write_format().to_string(),
            "missing": missing_json(numeric.missing_values()),
            "value_labels": numeric
                .value_labels()
                .iter()
                .map(|(value, label)| json!({ "value": value, "label": label }))
                .collect::<Vec<_>>(),
        }),
        VariableKind::String(string) => json!({
            "length": string.length(),
            "missing": string.missing_values(),
            "value_labels": string
                .value_labels()
                .iter()
                .map(|(value, label)| json!({ "value": value, "label": label }))
                .collect::<Vec<_>>(),
        }),
        VariableKind::Date(date) => json!({
            "format": date.format().to_string(),
            "missing": date
                .missing_values()
                .iter()
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
                .collect::<Vec<_>>(),
        }),
    };

    if let (Some(entry), Value::Object(details)) = (entry.as_object_mut(), details) {
        entry.extend(details);
    }
    Ok(entry)
}

fn missing_json(missing: &MissingValues) -> Value {
    match missing {
        MissingValues::None => Value::Null,
        MissingValues::Discrete(values) => json!({ "values": values }),
        MissingValues::Range { low, high } => json!({ "low": low, "high": high }),
        MissingValues::RangeAndValue { low, high, value } => {
            json!({ "low": low, "high": high, "value": value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_json() {
        assert_eq!(missing_json(&MissingValues::None), Value::Null);
        let range = missing_json(&MissingValues::Range { low: 1.0, high: 2.0 });
        assert_eq!(range["low"], 1.0);
        assert_eq!(range["high"], 2.0);
    }

    #[test]
    fn test_variable_json_detached_numeric() {
        let mut variable = Variable::numeric("age").unwrap();
        variable.set_label("Age in years").unwrap();
        variable.numeric_mut().unwrap().add_value_label(99.0, "Refused").unwrap();

        let entry = variable_json(&variable).unwrap();
        assert_eq!(entry["name"], "age");
        assert_eq!(entry["kind"], "numeric");
        assert_eq!(entry["spss_type"], 0);
        assert_eq!(entry["print_format"], "F8.2");
        assert_eq!(entry["measurement_level"], "scale");
        assert_eq!(entry["value_labels"][0]["label"], "Refused");
    }

    #[test]
    fn test_variable_json_string() {
        let variable = Variable::string("city", 12).unwrap();
        let entry = variable_json(&variable).unwrap();
        assert_eq!(entry["kind"], "string");
        assert_eq!(entry["length"], 12);
        assert_eq!(entry["spss_type"], 12);
        assert_eq!(entry["alignment"], "left");
    }

    #[test]
    fn test_import_then_copy_dictionary() {
        let dir = TempDir::new().unwrap();
        let table_path = dir.path().join("table.json");
        fs::write(
            &table_path,
            r#"{"columns": [{"name": "age", "type": "integer"}, {"name": "city", "type": "text", "max_length": 8}],
                "rows": [[30, "Oslo"], [null, "Lima"]]}"#,
        )
        .unwrap();

        let out = dir.path().join("out.sav");
        import(&table_path, &out, &Config::default()).unwrap();

        let mut document = Document::open(&out, AccessMode::Read).unwrap();
        assert_eq!(document.variables().names(), vec!["age", "city"]);
        assert_eq!(document.cases().unwrap().count().unwrap(), 2);
        document.close().unwrap();

        let copy = dir.path().join("copy.sav");
        copy_dictionary(&out, &copy).unwrap();
        let mut copied = Document::open(&copy, AccessMode::Read).unwrap();
        assert_eq!(copied.variables().len(), 2);
        assert_eq!(copied.cases().unwrap().count().unwrap(), 0);
    }

    #[test]
    fn test_load_config_reads_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("savkit.json");
        fs::write(&path, r#"{"compression": false, "sync_each_case": true}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.compression);
        assert!(config.sync_each_case);
        // The binding exists now, whether or not this call created it
        assert!(!engine::configure(&config));
    }

    #[test]
    fn test_load_config_bad_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code_str(), "SAVKIT_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_import_missing_table_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = import(&dir.path().join("none.json"), &dir.path().join("o.sav"), &Config::default()).unwrap_err();
        assert_eq!(err.code_str(), "SAVKIT_CLI_IO_ERROR");
    }
}
