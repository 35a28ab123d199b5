//! savkit - read and write SPSS-style data files
//!
//! # Layers
//!
//! - [`engine`]: the native engine binding; one process-wide instance
//!   behind the [`engine::Engine`] trait
//! - [`dictionary`]: variables, value labels and the variable collection
//! - [`cases`]: row access for committed documents
//! - [`document`]: the file lifecycle tying the layers together
//! - [`table`]: the in-memory table used for import and export
//!
//! # Example
//!
//! ```ignore
//! use savkit::{Document, Variable};
//!
//! let mut doc = Document::create("survey.sav")?;
//! doc.variables_mut().add(Variable::numeric("age")?)?;
//! doc.variables_mut().add(Variable::string("city", 20)?)?;
//! doc.commit_dictionary()?;
//!
//! let mut cases = doc.cases()?;
//! let mut case = cases.new_case()?;
//! case.set("age", 42.0)?;
//! case.set("city", "Lisbon")?;
//! case.commit()?;
//! doc.close()?;
//! ```

pub mod cases;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod document;
pub mod engine;
pub mod errors;
pub mod observability;
pub mod table;

pub use cases::{Case, CaseCollection, Rows};
pub use config::Config;
pub use dictionary::{
    generate_column_name, DateVariable, MissingValues, NumericVariable, StringVariable, Value, ValueLabels, Variable,
    VariableCollection, VariableKind,
};
pub use document::{AccessMode, Document, DocumentState};
pub use errors::{SavError, SavErrorCode, SavResult, Severity};
pub use table::{ColumnType, DataColumn, DataRow, DataTable};
