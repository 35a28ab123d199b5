//! Table import and export tests
//!
//! Covers:
//! - Column types map to variable kinds and back
//! - Over-long column names are shortened consistently
//! - Column headers with spaces or leading digits become valid names
//! - Value labels on short strings only
//! - Non-finite labels and missing values never reach the file
//! - Corrupted files fail explicitly

use chrono::NaiveDate;
use savkit::observability::{Event, Logger, Severity};
use savkit::{
    generate_column_name, AccessMode, ColumnType, DataColumn, DataTable, Document, MissingValues, SavErrorCode,
    SavResult, Value, Variable,
};
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn long_name() -> String {
    format!("{}{}", "a".repeat(40), "z".repeat(40))
}

fn sample_table() -> DataTable {
    let mut table = DataTable::new();
    table.add_column("id", ColumnType::Integer);
    table.add_column("name", ColumnType::Text { max_length: Some(10) });
    table.add_column("joined", ColumnType::DateTime);
    table.add_column("active", ColumnType::Boolean);
    table.add_column(long_name(), ColumnType::Number);

    let joined = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap().and_hms_opt(9, 30, 0).unwrap();
    table
        .add_row(vec![
            Value::from(1),
            Value::from("Ana"),
            Value::from(joined),
            Value::from(true),
            Value::from(0.5),
        ])
        .unwrap();
    table
        .add_row(vec![
            Value::from(2),
            Value::Null,
            Value::from("2023-02-01T00:00:00"),
            Value::from(false),
            Value::Null,
        ])
        .unwrap();
    table
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn test_import_then_export() {
    let dir = create_temp_dir();
    let path = dir.path().join("import.sav");
    let table = sample_table();

    {
        let mut doc = Document::create(&path).unwrap();
        let written = doc.import_data(&table, &table.rows).unwrap();
        assert_eq!(written, 2);
        doc.close().unwrap();
    }

    let mut doc = Document::open(&path, AccessMode::Read).unwrap();
    let exported = doc.to_data_table().unwrap();

    let shortened = generate_column_name(&long_name());
    assert_eq!(
        exported.columns,
        vec![
            DataColumn::new("id", ColumnType::Number),
            DataColumn::new("name", ColumnType::Text { max_length: Some(10) }),
            DataColumn::new("joined", ColumnType::DateTime),
            DataColumn::new("active", ColumnType::Number),
            DataColumn::new(shortened, ColumnType::Number),
        ]
    );

    let joined = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap().and_hms_opt(9, 30, 0).unwrap();
    assert_eq!(
        exported.rows[0],
        vec![
            Value::Number(1.0),
            Value::Text("Ana".to_string()),
            Value::DateTime(joined),
            Value::Number(1.0),
            Value::Number(0.5),
        ]
    );

    let second_joined = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert_eq!(exported.rows[1][1], Value::Text(String::new()));
    assert_eq!(exported.rows[1][2], Value::DateTime(second_joined));
    assert_eq!(exported.rows[1][3], Value::Number(0.0));
    assert_eq!(exported.rows[1][4], Value::Null);
}

#[test]
fn test_import_callback_adjusts_variables() {
    let dir = create_temp_dir();
    let path = dir.path().join("callback.sav");
    let table = sample_table();

    let mut seen = Vec::new();
    let mut callback = |variable: &mut Variable, column: &DataColumn| -> SavResult<()> {
        seen.push(column.name.clone());
        variable.set_label(&format!("Column {}", column.name.len()))
    };

    let mut doc = Document::create(&path).unwrap();
    doc.import_data_with(&table, &table.rows[..1], &mut callback).unwrap();
    doc.close().unwrap();
    assert_eq!(seen.len(), 5);

    let doc = Document::open(&path, AccessMode::Read).unwrap();
    assert_eq!(doc.variables().get("id").unwrap().label(), "Column 2");
}

#[test]
fn test_import_into_read_document_fails() {
    let dir = create_temp_dir();
    let path = dir.path().join("readonly.sav");
    let table = sample_table();
    {
        let mut doc = Document::create(&path).unwrap();
        doc.import_data(&table, &[]).unwrap();
        doc.close().unwrap();
    }

    let mut doc = Document::open(&path, AccessMode::Read).unwrap();
    let err = doc.import_data(&table, &table.rows).unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidOperation);
}

#[test]
fn test_import_appends_to_existing_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("append.sav");
    let table = sample_table();
    {
        let mut doc = Document::create(&path).unwrap();
        doc.import_data(&table, &table.rows[..1]).unwrap();
        doc.close().unwrap();
    }
    {
        let mut doc = Document::open(&path, AccessMode::Append).unwrap();
        doc.import_data(&table, &table.rows[1..]).unwrap();
        doc.close().unwrap();
    }

    let mut doc = Document::open(&path, AccessMode::Read).unwrap();
    assert_eq!(doc.cases().unwrap().count().unwrap(), 2);
}

#[test]
fn test_generated_names_may_collide() {
    let a = format!("{}{}{}", "p".repeat(32), "middle-one", "s".repeat(32));
    let b = format!("{}{}{}", "p".repeat(32), "middle-two", "s".repeat(32));
    assert_eq!(generate_column_name(&a), generate_column_name(&b));
    assert_eq!(generate_column_name(&a).chars().count(), 64);
    assert_eq!(generate_column_name("short"), "short");
}

#[test]
fn test_import_sanitizes_column_headers() {
    let dir = create_temp_dir();
    let path = dir.path().join("headers.sav");
    let mut table = DataTable::new();
    table.add_column("first name", ColumnType::Text { max_length: Some(8) });
    table.add_column("2nd score", ColumnType::Number);
    table.add_row(vec![Value::from("Ana"), Value::from(7.5)]).unwrap();

    {
        let mut doc = Document::create(&path).unwrap();
        assert_eq!(doc.import_data(&table, &table.rows).unwrap(), 1);
        assert_eq!(doc.variables().names(), vec!["first_name", "_2nd_score"]);
        doc.close().unwrap();
    }

    let mut doc = Document::open(&path, AccessMode::Read).unwrap();
    let exported = doc.to_data_table().unwrap();
    assert_eq!(exported.rows[0][0], Value::from("Ana"));
    assert_eq!(exported.rows[0][1], Value::from(7.5));
}

// =============================================================================
// Value Labels
// =============================================================================

#[test]
fn test_value_labels_keep_insertion_order() {
    let dir = create_temp_dir();
    let path = dir.path().join("labels.sav");
    {
        let mut doc = Document::create(&path).unwrap();
        let mut code = Variable::string("code", 8).unwrap();
        let labels = code.string_mut().unwrap();
        labels.add_value_label("z", "Last letter").unwrap();
        labels.add_value_label("a", "First letter").unwrap();
        doc.variables_mut().add(code).unwrap();
        doc.commit_dictionary().unwrap();
        doc.close().unwrap();
    }

    let doc = Document::open(&path, AccessMode::Read).unwrap();
    let code = doc.variables().get("code").unwrap().as_string().unwrap();
    let values: Vec<&str> = code.value_labels().iter().map(|(v, _)| v.as_str()).collect();
    assert_eq!(values, vec!["z", "a"]);
}

#[test]
fn test_long_strings_refuse_value_labels() {
    let mut long = Variable::string("comment", 9).unwrap();
    let err = long.string_mut().unwrap().add_value_label("x", "X").unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidOperation);

    let mut short = Variable::string("code", 8).unwrap();
    short.string_mut().unwrap().add_value_label("x", "X").unwrap();
}

#[test]
fn test_non_finite_dictionary_values_rejected_before_write() {
    let dir = create_temp_dir();
    let path = dir.path().join("finite.sav");
    {
        let mut doc = Document::create(&path).unwrap();
        let mut score = Variable::numeric("score").unwrap();
        let numeric = score.numeric_mut().unwrap();

        let err = numeric
            .set_missing_values(MissingValues::Range {
                low: f64::NEG_INFINITY,
                high: 0.0,
            })
            .unwrap_err();
        assert_eq!(err.code(), SavErrorCode::InvalidArgument);
        let err = numeric.add_value_label(f64::INFINITY, "inf").unwrap_err();
        assert_eq!(err.code(), SavErrorCode::InvalidArgument);

        numeric
            .set_missing_values(MissingValues::Range { low: -f64::MAX, high: 0.0 })
            .unwrap();
        numeric.add_value_label(1.0, "One").unwrap();
        doc.variables_mut().add(score).unwrap();
        doc.commit_dictionary().unwrap();
        doc.close().unwrap();
    }

    let doc = Document::open(&path, AccessMode::Read).unwrap();
    let score = doc.variables().get("score").unwrap().as_numeric().unwrap();
    assert_eq!(
        score.missing_values(),
        &MissingValues::Range { low: -f64::MAX, high: 0.0 }
    );
    assert_eq!(score.value_labels().get(&1.0), Some("One"));
    assert_eq!(score.value_labels().len(), 1);
}

// =============================================================================
// Corruption and Logging
// =============================================================================

#[test]
fn test_corrupted_file_fails_to_open() {
    let dir = create_temp_dir();
    let path = dir.path().join("corrupt.sav");
    {
        let table = sample_table();
        let mut doc = Document::create(&path).unwrap();
        doc.import_data(&table, &table.rows).unwrap();
        doc.close().unwrap();
    }

    let mut contents = fs::read(&path).unwrap();
    let last = contents.len() - 3;
    contents[last] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = Document::open(&path, AccessMode::Read).unwrap_err();
    assert_eq!(err.code(), SavErrorCode::EngineFailure);
    assert_eq!(err.operation(), Some("open_read"));
}

#[test]
fn test_log_line_is_json() {
    let line = Logger::render(
        Severity::Info,
        Event::DocumentOpen.as_str(),
        &[("path", "C:\\data\\\"x\".sav"), ("mode", "read")],
    );
    let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(parsed["event"], "DOCUMENT_OPEN");
    assert_eq!(parsed["severity"], "INFO");
    assert_eq!(parsed["path"], "C:\\data\\\"x\".sav");
    assert_eq!(parsed["mode"], "read");
}
