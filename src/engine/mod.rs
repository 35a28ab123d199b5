//! Engine binding subsystem for savkit
//!
//! The engine performs the actual file I/O, one primitive per operation.
//! Everything above this module talks to the engine only through the
//! process-wide binding returned by [`binding`].
//!
//! # Initialization
//!
//! The binding is created lazily on first use, exactly once, even when the
//! first uses race on several threads. After that it is read-only shared
//! state. A custom engine can be installed with [`install`], or the default
//! one built from an explicit [`Config`] with [`configure`], before first use.
//!
//! # Result codes
//!
//! Primitives report failure as a [`ReturnCode`]. [`check`] turns any such
//! code into a [`SavError`] naming the failing operation; [`check_allowing`]
//! first maps a call site's benign codes to an empty result.

mod binding;
mod codes;
mod convert;
pub mod file;
mod types;

pub use binding::{Engine, EngineResult};
pub use codes::ReturnCode;
pub use file::FileEngine;
pub use types::{
    Alignment, FileHandle, FormatSpec, FormatType, MeasurementLevel, VarHandle, MAX_LONG_STRING,
    MAX_MISSING_VALUES, MAX_SHORT_STRING, MAX_VALLABEL, MAX_VARLABEL, MAX_VARNAME, MISSING_NONE,
    MISSING_RANGE, MISSING_RANGE_AND_VALUE, SYSTEM_MISSING,
};

use std::sync::OnceLock;

use crate::config::Config;
use crate::errors::{SavError, SavResult};
use crate::observability::{log_event_with_fields, Event};

static BINDING: OnceLock<Box<dyn Engine>> = OnceLock::new();

/// Returns the process-wide engine binding, creating the default
/// [`FileEngine`] on first use.
pub fn binding() -> &'static dyn Engine {
    BINDING.get_or_init(|| file_engine(&Config::from_env())).as_ref()
}

/// Creates the default binding from `config` rather than the environment.
///
/// Returns `false`, leaving the binding unchanged, once one exists.
pub fn configure(config: &Config) -> bool {
    let mut created = false;
    BINDING.get_or_init(|| {
        created = true;
        file_engine(config)
    });
    created
}

fn file_engine(config: &Config) -> Box<dyn Engine> {
    log_event_with_fields(
        Event::EngineInit,
        &[("engine", "file"), ("sync_each_case", bool_str(config.sync_each_case))],
    );
    Box::new(FileEngine::with_config(config))
}

/// Installs a custom engine binding.
///
/// Fails, handing the engine back, once a binding exists.
pub fn install(engine: Box<dyn Engine>) -> Result<(), Box<dyn Engine>> {
    BINDING.set(engine)?;
    log_event_with_fields(Event::EngineInit, &[("engine", "custom")]);
    Ok(())
}

/// Converts an engine result into a savkit result, wrapping any code.
pub(crate) fn check<T>(operation: &'static str, result: EngineResult<T>) -> SavResult<T> {
    result.map_err(|code| {
        log_event_with_fields(
            Event::EngineFailure,
            &[("operation", operation), ("result", code.name())],
        );
        SavError::engine(operation, code)
    })
}

/// Like [`check`], but treats the listed codes as an empty success.
pub(crate) fn check_allowing<T: Default>(
    operation: &'static str,
    result: EngineResult<T>,
    benign: &[ReturnCode],
) -> SavResult<T> {
    match result {
        Err(code) if benign.contains(&code) => Ok(T::default()),
        other => check(operation, other),
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SavErrorCode;

    #[test]
    fn test_binding_is_initialized_once() {
        let first = binding() as *const dyn Engine as *const ();
        let second = binding() as *const dyn Engine as *const ();
        assert_eq!(first, second);
    }

    #[test]
    fn test_install_after_first_use_is_rejected() {
        let _ = binding();
        assert!(install(Box::new(FileEngine::new())).is_err());
    }

    #[test]
    fn test_configure_after_first_use_keeps_binding() {
        let first = binding() as *const dyn Engine as *const ();
        let config = Config {
            sync_each_case: true,
            ..Config::default()
        };
        assert!(!configure(&config));
        assert_eq!(binding() as *const dyn Engine as *const (), first);
    }

    #[test]
    fn test_concurrent_first_use_yields_one_binding() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| binding() as *const dyn Engine as *const () as usize))
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_check_wraps_code_with_operation() {
        let err = check::<()>("commit_header", Err(ReturnCode::DictEmpty)).unwrap_err();
        assert_eq!(err.code(), SavErrorCode::EngineFailure);
        assert_eq!(err.operation(), Some("commit_header"));
        assert_eq!(err.return_code(), Some(ReturnCode::DictEmpty));
    }

    #[test]
    fn test_check_allowing_whitelists_benign_codes() {
        let labels: Vec<f64> = check_allowing(
            "numeric_value_labels",
            Err(ReturnCode::NoLabels),
            &[ReturnCode::NoLabels],
        )
        .unwrap();
        assert!(labels.is_empty());

        let err = check_allowing::<Vec<f64>>(
            "numeric_value_labels",
            Err(ReturnCode::VarNotFound),
            &[ReturnCode::NoLabels],
        )
        .unwrap_err();
        assert_eq!(err.return_code(), Some(ReturnCode::VarNotFound));
    }
}
