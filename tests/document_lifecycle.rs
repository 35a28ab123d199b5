//! Document lifecycle tests
//!
//! Covers:
//! - Authoring -> Committed -> Closed transitions
//! - Dictionary edits refused after commit
//! - Case-insensitive naming and rename collisions
//! - Name rules enforced before anything reaches the engine
//! - Native type codes of the three variable kinds

use savkit::{AccessMode, Document, DocumentState, SavErrorCode, Variable};
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn sav_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_created_document_starts_authoring() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "new.sav")).unwrap();

    assert_eq!(doc.state(), DocumentState::Authoring);
    assert_eq!(doc.mode(), AccessMode::Create);
    assert!(doc.is_compressed());

    let err = doc.cases().err().unwrap();
    assert_eq!(err.code(), SavErrorCode::InvalidOperation);
}

#[test]
fn test_commit_moves_to_committed() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "c.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("x").unwrap()).unwrap();
    doc.commit_dictionary().unwrap();

    assert_eq!(doc.state(), DocumentState::Committed);
    assert!(doc.variables().is_committed());
    assert!(doc.variables().get("x").unwrap().handle().is_some());

    let err = doc.commit_dictionary().unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidOperation);
}

#[test]
fn test_commit_with_empty_dictionary_fails() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "empty.sav")).unwrap();

    let err = doc.commit_dictionary().unwrap_err();
    assert_eq!(err.code(), SavErrorCode::EngineFailure);
    assert_eq!(err.operation(), Some("commit_header"));
    assert!(doc.is_authoring());
}

#[test]
fn test_close_is_idempotent() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "close.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("x").unwrap()).unwrap();
    doc.commit_dictionary().unwrap();

    doc.close().unwrap();
    doc.close().unwrap();
    assert_eq!(doc.state(), DocumentState::Closed);
    assert_eq!(doc.cases().err().unwrap().code(), SavErrorCode::InvalidOperation);
}

#[test]
fn test_open_in_create_mode_is_rejected() {
    let dir = create_temp_dir();
    let err = Document::open(sav_path(&dir, "x.sav"), AccessMode::Create).unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidArgument);
}

#[test]
fn test_open_missing_file_fails() {
    let dir = create_temp_dir();
    let err = Document::open(sav_path(&dir, "missing.sav"), AccessMode::Read).unwrap_err();
    assert_eq!(err.code(), SavErrorCode::EngineFailure);
    assert_eq!(err.operation(), Some("open_read"));
}

#[test]
fn test_compression_fixed_after_commit() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "comp.sav")).unwrap();
    doc.set_compressed(false).unwrap();
    assert!(!doc.is_compressed());

    doc.variables_mut().add(Variable::numeric("x").unwrap()).unwrap();
    doc.commit_dictionary().unwrap();
    assert_eq!(doc.set_compressed(true).unwrap_err().code(), SavErrorCode::InvalidOperation);
    doc.close().unwrap();

    let reopened = Document::open(sav_path(&dir, "comp.sav"), AccessMode::Read).unwrap();
    assert!(!reopened.is_compressed());
}

// =============================================================================
// Dictionary Freezing
// =============================================================================

#[test]
fn test_add_and_remove_after_commit_fail() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "frozen.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("x").unwrap()).unwrap();
    doc.commit_dictionary().unwrap();

    let add = doc.variables_mut().add(Variable::numeric("y").unwrap()).unwrap_err();
    assert_eq!(add.code(), SavErrorCode::InvalidOperation);

    let remove = doc.variables_mut().remove("x").unwrap_err();
    assert_eq!(remove.code(), SavErrorCode::InvalidOperation);
    assert_eq!(doc.variables().len(), 1);
}

#[test]
fn test_committed_variable_settings_frozen() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "frozen2.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("x").unwrap()).unwrap();
    doc.commit_dictionary().unwrap();

    let variable = doc.variables_mut().get_mut("x").unwrap();
    assert_eq!(variable.set_column_width(12).unwrap_err().code(), SavErrorCode::InvalidOperation);
    assert_eq!(variable.numeric_mut().unwrap_err().code(), SavErrorCode::InvalidOperation);
}

#[test]
fn test_opened_dictionary_is_frozen() {
    let dir = create_temp_dir();
    let path = sav_path(&dir, "opened.sav");
    {
        let mut doc = Document::create(&path).unwrap();
        doc.variables_mut().add(Variable::numeric("x").unwrap()).unwrap();
        doc.commit_dictionary().unwrap();
        doc.close().unwrap();
    }

    let mut doc = Document::open(&path, AccessMode::Append).unwrap();
    assert_eq!(doc.state(), DocumentState::Committed);
    let err = doc.variables_mut().add(Variable::numeric("y").unwrap()).unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidOperation);
}

// =============================================================================
// Naming
// =============================================================================

#[test]
fn test_lookup_is_case_insensitive() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "names.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("Income").unwrap()).unwrap();

    assert!(doc.variables().contains("INCOME"));
    assert_eq!(doc.variables().get("income").unwrap().name(), "Income");

    let err = doc.variables_mut().add(Variable::numeric("income").unwrap()).unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidArgument);
}

#[test]
fn test_rename_collision_keeps_old_name() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "rename.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("a").unwrap()).unwrap();
    doc.variables_mut().add(Variable::numeric("b").unwrap()).unwrap();

    let err = doc.variables_mut().rename("b", "A").unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidArgument);
    assert_eq!(err.details(), Some("old_name: b, new_name: A"));
    assert_eq!(doc.variables().names(), vec!["a", "b"]);

    doc.variables_mut().rename("b", "B").unwrap();
    assert_eq!(doc.variables().names(), vec!["a", "B"]);
}

#[test]
fn test_invalid_names_rejected_before_commit() {
    let dir = create_temp_dir();
    let path = sav_path(&dir, "badnames.sav");
    let mut doc = Document::create(&path).unwrap();

    let err = Variable::numeric("first name").unwrap_err();
    assert_eq!(err.code(), SavErrorCode::InvalidArgument);
    doc.variables_mut().add(Variable::numeric("ok").unwrap()).unwrap();
    assert!(doc.variables_mut().rename("ok", "1st").is_err());

    // Nothing reached the engine, so the commit still succeeds
    doc.commit_dictionary().unwrap();
    doc.close().unwrap();
    let reopened = Document::open(&path, AccessMode::Read).unwrap();
    assert_eq!(reopened.variables().names(), vec!["ok"]);
}

#[test]
fn test_attached_variable_cannot_rename_itself() {
    let dir = create_temp_dir();
    let mut doc = Document::create(sav_path(&dir, "attached.sav")).unwrap();
    doc.variables_mut().add(Variable::numeric("a").unwrap()).unwrap();

    let variable = doc.variables_mut().get_mut("a").unwrap();
    assert_eq!(variable.set_name("z").unwrap_err().code(), SavErrorCode::InvalidOperation);
}

// =============================================================================
// Native Types
// =============================================================================

#[test]
fn test_native_type_codes_survive_reopen() {
    let dir = create_temp_dir();
    let path = sav_path(&dir, "types.sav");
    {
        let mut doc = Document::create(&path).unwrap();
        let vars = doc.variables_mut();
        vars.add(Variable::numeric("n").unwrap()).unwrap();
        vars.add(Variable::string("s", 12).unwrap()).unwrap();
        vars.add(Variable::date("d").unwrap()).unwrap();
        doc.commit_dictionary().unwrap();
        doc.close().unwrap();
    }

    let doc = Document::open(&path, AccessMode::Read).unwrap();
    let types: Vec<i32> = doc.variables().iter().map(|v| v.spss_type()).collect();
    assert_eq!(types, vec![0, 12, 0]);
    assert!(doc.variables().get("d").unwrap().as_date().is_some());
    assert!(doc.variables().get("n").unwrap().as_numeric().is_some());
}

#[test]
fn test_create_from_dictionary_copies_variables() {
    let dir = create_temp_dir();
    let source = sav_path(&dir, "source.sav");
    {
        let mut doc = Document::create(&source).unwrap();
        let mut age = Variable::numeric("age").unwrap();
        age.set_label("Age in years").unwrap();
        age.numeric_mut().unwrap().add_value_label(99.0, "Refused").unwrap();
        doc.variables_mut().add(age).unwrap();
        doc.variables_mut().add(Variable::string("city", 20).unwrap()).unwrap();
        doc.commit_dictionary().unwrap();
        doc.close().unwrap();
    }

    let target = sav_path(&dir, "target.sav");
    let mut copy = Document::create_from_dictionary(&target, &source).unwrap();
    assert_eq!(copy.state(), DocumentState::Committed);
    copy.close().unwrap();

    let reopened = Document::open(&target, AccessMode::Read).unwrap();
    assert_eq!(reopened.variables().names(), vec!["age", "city"]);
    let age = reopened.variables().get("age").unwrap();
    assert_eq!(age.label(), "Age in years");
    assert_eq!(age.as_numeric().unwrap().value_labels().get(&99.0), Some("Refused"));
}
