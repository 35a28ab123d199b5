//! Dictionary subsystem: variables and their collection
//!
//! # Model
//!
//! - [`Variable`]: name, label, display attributes and one of three kinds
//!   ([`VariableKind`]): numeric, string or date
//! - [`ValueLabels`]: ordered value → label map owned by a variable
//! - [`VariableCollection`]: the ordered, case-insensitively indexed list
//!   of a document's variables
//!
//! # Lifecycle
//!
//! A variable is built detached, attached by adding it to a collection,
//! and committed when the owning document commits its dictionary. From
//! then on its handle is set and its settings are frozen.

mod collection;
mod date;
mod numeric;
mod string;
mod value;
mod value_labels;
mod variable;

pub use collection::{generate_column_name, ColumnCallback, VariableCollection};
pub use date::{decode_datetime, encode_datetime, DateVariable};
pub use numeric::{MissingValues, NumericVariable};
pub use string::StringVariable;
pub use value::Value;
pub use value_labels::{LabelKey, ValueLabels};
pub use variable::{Variable, VariableKind};
