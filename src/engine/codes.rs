//! Engine result codes
//!
//! Every engine primitive reports one code from this closed set:
//! - zero: success
//! - negative: warning (the call did something, possibly less than asked)
//! - positive: error (the call did nothing)

use std::fmt;

/// Result code returned by an engine primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,

    // Warnings
    /// Variable label was truncated
    ExcVarLabel = -2,
    /// Value label was truncated
    ExcValLabel = -4,
    /// No more cases to read
    FileEnd = -5,
    /// Variable has no value labels
    NoLabels = -8,
    /// Value has no label
    NoLabel = -9,

    // Errors
    FileOpenError = 1,
    FileWriteError = 2,
    FileReadError = 3,
    InvalidHandle = 5,
    InvalidFile = 6,
    /// Operation needs a file opened for writing
    OpenReadMode = 8,
    /// Operation needs a file opened for reading
    OpenWriteMode = 9,
    InvalidVarName = 10,
    DictEmpty = 11,
    VarNotFound = 12,
    DupVar = 13,
    NumericExpected = 14,
    StringExpected = 15,
    ShortStringExpected = 16,
    InvalidVarType = 17,
    InvalidMissingFormat = 18,
    InvalidPrintFormat = 20,
    InvalidWriteFormat = 21,
    InvalidDate = 22,
    InvalidTime = 23,
    DupValue = 27,
    /// Dictionary already committed
    DictCommitted = 30,
    /// Dictionary not yet committed
    DictNotCommitted = 31,
    /// String value longer than the variable
    ExcStrValue = 47,
    InvalidCase = 50,
    InvalidMeasureLevel = 56,
    InvalidVarHandle = 58,
    InvalidAlignment = 59,
}

impl ReturnCode {
    const ALL: [ReturnCode; 34] = [
        ReturnCode::Ok,
        ReturnCode::ExcVarLabel,
        ReturnCode::ExcValLabel,
        ReturnCode::FileEnd,
        ReturnCode::NoLabels,
        ReturnCode::NoLabel,
        ReturnCode::FileOpenError,
        ReturnCode::FileWriteError,
        ReturnCode::FileReadError,
        ReturnCode::InvalidHandle,
        ReturnCode::InvalidFile,
        ReturnCode::OpenReadMode,
        ReturnCode::OpenWriteMode,
        ReturnCode::InvalidVarName,
        ReturnCode::DictEmpty,
        ReturnCode::VarNotFound,
        ReturnCode::DupVar,
        ReturnCode::NumericExpected,
        ReturnCode::StringExpected,
        ReturnCode::ShortStringExpected,
        ReturnCode::InvalidVarType,
        ReturnCode::InvalidMissingFormat,
        ReturnCode::InvalidPrintFormat,
        ReturnCode::InvalidWriteFormat,
        ReturnCode::InvalidDate,
        ReturnCode::InvalidTime,
        ReturnCode::DupValue,
        ReturnCode::DictCommitted,
        ReturnCode::DictNotCommitted,
        ReturnCode::ExcStrValue,
        ReturnCode::InvalidCase,
        ReturnCode::InvalidMeasureLevel,
        ReturnCode::InvalidVarHandle,
        ReturnCode::InvalidAlignment,
    ];

    /// Returns the numeric code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Looks up a code, `None` if it is not part of the closed set
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Returns the symbolic name
    pub fn name(self) -> &'static str {
        match self {
            ReturnCode::Ok => "SPSS_OK",
            ReturnCode::ExcVarLabel => "SPSS_EXC_VARLABEL",
            ReturnCode::ExcValLabel => "SPSS_EXC_VALLABEL",
            ReturnCode::FileEnd => "SPSS_FILE_END",
            ReturnCode::NoLabels => "SPSS_NO_LABELS",
            ReturnCode::NoLabel => "SPSS_NO_LABEL",
            ReturnCode::FileOpenError => "SPSS_FILE_OERROR",
            ReturnCode::FileWriteError => "SPSS_FILE_WERROR",
            ReturnCode::FileReadError => "SPSS_FILE_RERROR",
            ReturnCode::InvalidHandle => "SPSS_INVALID_HANDLE",
            ReturnCode::InvalidFile => "SPSS_INVALID_FILE",
            ReturnCode::OpenReadMode => "SPSS_OPEN_RDMODE",
            ReturnCode::OpenWriteMode => "SPSS_OPEN_WRMODE",
            ReturnCode::InvalidVarName => "SPSS_INVALID_VARNAME",
            ReturnCode::DictEmpty => "SPSS_DICT_EMPTY",
            ReturnCode::VarNotFound => "SPSS_VAR_NOTFOUND",
            ReturnCode::DupVar => "SPSS_DUP_VAR",
            ReturnCode::NumericExpected => "SPSS_NUME_EXP",
            ReturnCode::StringExpected => "SPSS_STR_EXP",
            ReturnCode::ShortStringExpected => "SPSS_SHORTSTR_EXP",
            ReturnCode::InvalidVarType => "SPSS_INVALID_VARTYPE",
            ReturnCode::InvalidMissingFormat => "SPSS_INVALID_MISSFOR",
            ReturnCode::InvalidPrintFormat => "SPSS_INVALID_PRFOR",
            ReturnCode::InvalidWriteFormat => "SPSS_INVALID_WRFOR",
            ReturnCode::InvalidDate => "SPSS_INVALID_DATE",
            ReturnCode::InvalidTime => "SPSS_INVALID_TIME",
            ReturnCode::DupValue => "SPSS_DUP_VALUE",
            ReturnCode::DictCommitted => "SPSS_DICT_COMMIT",
            ReturnCode::DictNotCommitted => "SPSS_DICT_NOTCOMMIT",
            ReturnCode::ExcStrValue => "SPSS_EXC_STRVALUE",
            ReturnCode::InvalidCase => "SPSS_INVALID_CASE",
            ReturnCode::InvalidMeasureLevel => "SPSS_INVALID_MEASURELEVEL",
            ReturnCode::InvalidVarHandle => "SPSS_INVALID_VARHANDLE",
            ReturnCode::InvalidAlignment => "SPSS_INVALID_ALIGNMENT",
        }
    }

    /// Returns whether this is a warning
    pub fn is_warning(self) -> bool {
        self.code() < 0
    }

    /// Returns whether this is an error
    pub fn is_error(self) -> bool {
        self.code() > 0
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_classifies_codes() {
        assert!(!ReturnCode::Ok.is_warning());
        assert!(!ReturnCode::Ok.is_error());
        assert!(ReturnCode::NoLabels.is_warning());
        assert!(ReturnCode::FileEnd.is_warning());
        assert!(ReturnCode::InvalidHandle.is_error());
        assert!(ReturnCode::DupVar.is_error());
    }

    #[test]
    fn test_from_code_round_trips_closed_set() {
        for code in ReturnCode::ALL {
            assert_eq!(ReturnCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ReturnCode::from_code(9999), None);
    }

    #[test]
    fn test_display_names_code() {
        assert_eq!(ReturnCode::NoLabels.to_string(), "SPSS_NO_LABELS (-8)");
    }
}
