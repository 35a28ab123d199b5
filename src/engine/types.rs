//! Handle, format and display-attribute types shared by the engine and the
//! dictionary layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a variable name
pub const MAX_VARNAME: usize = 64;

/// Maximum length of a variable label
pub const MAX_VARLABEL: usize = 256;

/// Maximum length of a value label
pub const MAX_VALLABEL: usize = 120;

/// Longest string variable that may carry value labels
pub const MAX_SHORT_STRING: u32 = 8;

/// Longest string variable
pub const MAX_LONG_STRING: u32 = 32767;

/// Number of discrete missing value slots
pub const MAX_MISSING_VALUES: usize = 3;

/// Reserved numeric value meaning "no value"
pub const SYSTEM_MISSING: f64 = -f64::MAX;

/// Missing-value format tag: no missing values
pub const MISSING_NONE: i32 = 0;
/// Missing-value format tag: low..=high range
pub const MISSING_RANGE: i32 = -2;
/// Missing-value format tag: range plus one discrete value
pub const MISSING_RANGE_AND_VALUE: i32 = -3;

/// Handle to an open engine file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(pub i32);

/// Handle to a committed variable within one open file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarHandle(pub u32);

/// Print/write format codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum FormatType {
    A = 1,
    Ahex = 2,
    Comma = 3,
    Dollar = 4,
    F = 5,
    Ib = 6,
    PibHex = 7,
    P = 8,
    Pib = 9,
    Pk = 10,
    Rb = 11,
    RbHex = 12,
    Z = 15,
    N = 16,
    E = 17,
    Date = 20,
    Time = 21,
    DateTime = 22,
    ADate = 23,
    JDate = 24,
    DTime = 25,
    WkDay = 26,
    Month = 27,
    MoYr = 28,
    QYr = 29,
    WkYr = 30,
    Pct = 31,
    Dot = 32,
    Cca = 33,
    Ccb = 34,
    Ccc = 35,
    Ccd = 36,
    Cce = 37,
    EDate = 38,
    SDate = 39,
}

impl FormatType {
    const ALL: [FormatType; 35] = [
        FormatType::A,
        FormatType::Ahex,
        FormatType::Comma,
        FormatType::Dollar,
        FormatType::F,
        FormatType::Ib,
        FormatType::PibHex,
        FormatType::P,
        FormatType::Pib,
        FormatType::Pk,
        FormatType::Rb,
        FormatType::RbHex,
        FormatType::Z,
        FormatType::N,
        FormatType::E,
        FormatType::Date,
        FormatType::Time,
        FormatType::DateTime,
        FormatType::ADate,
        FormatType::JDate,
        FormatType::DTime,
        FormatType::WkDay,
        FormatType::Month,
        FormatType::MoYr,
        FormatType::QYr,
        FormatType::WkYr,
        FormatType::Pct,
        FormatType::Dot,
        FormatType::Cca,
        FormatType::Ccb,
        FormatType::Ccc,
        FormatType::Ccd,
        FormatType::Cce,
        FormatType::EDate,
        FormatType::SDate,
    ];

    /// Returns the numeric format code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Looks up a format code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }

    /// Returns the format keyword
    pub fn keyword(self) -> &'static str {
        match self {
            FormatType::A => "A",
            FormatType::Ahex => "AHEX",
            FormatType::Comma => "COMMA",
            FormatType::Dollar => "DOLLAR",
            FormatType::F => "F",
            FormatType::Ib => "IB",
            FormatType::PibHex => "PIBHEX",
            FormatType::P => "P",
            FormatType::Pib => "PIB",
            FormatType::Pk => "PK",
            FormatType::Rb => "RB",
            FormatType::RbHex => "RBHEX",
            FormatType::Z => "Z",
            FormatType::N => "N",
            FormatType::E => "E",
            FormatType::Date => "DATE",
            FormatType::Time => "TIME",
            FormatType::DateTime => "DATETIME",
            FormatType::ADate => "ADATE",
            FormatType::JDate => "JDATE",
            FormatType::DTime => "DTIME",
            FormatType::WkDay => "WKDAY",
            FormatType::Month => "MONTH",
            FormatType::MoYr => "MOYR",
            FormatType::QYr => "QYR",
            FormatType::WkYr => "WKYR",
            FormatType::Pct => "PCT",
            FormatType::Dot => "DOT",
            FormatType::Cca => "CCA",
            FormatType::Ccb => "CCB",
            FormatType::Ccc => "CCC",
            FormatType::Ccd => "CCD",
            FormatType::Cce => "CCE",
            FormatType::EDate => "EDATE",
            FormatType::SDate => "SDATE",
        }
    }

    /// Date and time-of-day formats; only date variables may use them
    pub fn is_date(self) -> bool {
        matches!(
            self,
            FormatType::Date
                | FormatType::Time
                | FormatType::DateTime
                | FormatType::ADate
                | FormatType::JDate
                | FormatType::DTime
                | FormatType::WkDay
                | FormatType::Month
                | FormatType::MoYr
                | FormatType::QYr
                | FormatType::WkYr
                | FormatType::EDate
                | FormatType::SDate
        )
    }

    /// Character formats; only string variables may use them
    pub fn is_string(self) -> bool {
        matches!(self, FormatType::A | FormatType::Ahex)
    }
}

impl From<FormatType> for i32 {
    fn from(format: FormatType) -> i32 {
        format.code()
    }
}

impl TryFrom<i32> for FormatType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        FormatType::from_code(code).ok_or_else(|| format!("unknown format code {}", code))
    }
}

/// A complete print or write format: type, field width, decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub format: FormatType,
    pub width: u32,
    pub decimals: u32,
}

impl FormatSpec {
    pub fn new(format: FormatType, width: u32, decimals: u32) -> Self {
        Self {
            format,
            width,
            decimals,
        }
    }

    /// F8.2, the default numeric format
    pub fn numeric_default() -> Self {
        Self::new(FormatType::F, 8, 2)
    }

    /// DATETIME23.3, wide enough to show milliseconds
    pub fn date_default() -> Self {
        Self::new(FormatType::DateTime, 23, 3)
    }

    /// A-format sized to a string variable
    pub fn string(length: u32) -> Self {
        Self::new(FormatType::A, length, 0)
    }

    /// Checks width/decimals bounds shared by every numeric-like format
    pub fn is_well_formed(&self) -> bool {
        (1..=40).contains(&self.width) && self.decimals <= 16 && self.decimals < self.width
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals > 0 {
            write!(f, "{}{}.{}", self.format.keyword(), self.width, self.decimals)
        } else {
            write!(f, "{}{}", self.format.keyword(), self.width)
        }
    }
}

/// Statistical measurement level of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementLevel {
    Unknown,
    Nominal,
    Ordinal,
    Scale,
}

impl MeasurementLevel {
    pub fn code(self) -> i32 {
        match self {
            MeasurementLevel::Unknown => 0,
            MeasurementLevel::Nominal => 1,
            MeasurementLevel::Ordinal => 2,
            MeasurementLevel::Scale => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(MeasurementLevel::Unknown),
            1 => Some(MeasurementLevel::Nominal),
            2 => Some(MeasurementLevel::Ordinal),
            3 => Some(MeasurementLevel::Scale),
            _ => None,
        }
    }
}

/// Column alignment in data views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Center,
}

impl Alignment {
    pub fn code(self) -> i32 {
        match self {
            Alignment::Left => 0,
            Alignment::Right => 1,
            Alignment::Center => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Alignment::Left),
            1 => Some(Alignment::Right),
            2 => Some(Alignment::Center),
            _ => None,
        }
    }
}
