//! Value converters: canonical literal forms for declarations and argument lists.
//!
//! Every semantic value that reaches generated code goes through this module:
//! - `Address`: quoted string literal, casing preserved.
//! - `Amount`: base-10 integer literal, never fractional, never exponent notation.
//! - `Timestamp`: Unix epoch seconds.
//! - `bool`: passthrough.
//!
//! The inverse direction (`parse_literal`) mirrors the runtime parser emitted into
//! the deployment script, so `parse_literal(ty, &lit.render()) == lit` for every
//! literal this module produces.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ─── Error type ──────────────────────────────────────────────────────

/// Errors raised while converting or parsing literal values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("unrecognized parameter type tag: {0}")]
    UnknownType(String),
    #[error("not an unsigned integer: {0:?}")]
    InvalidUint(String),
    #[error("value has fractional digits: {0:?}")]
    Fractional(String),
    #[error("integer does not fit in 128 bits: {0:?}")]
    Overflow(String),
    #[error("number {0} is too large to be exact as a float; write it as a string")]
    InexactFloat(String),
    #[error("not an address literal: {0:?}")]
    InvalidAddress(String),
    #[error("not a boolean literal: {0:?}")]
    InvalidBool(String),
    #[error("not a recognised date: {0:?}")]
    InvalidDate(String),
    #[error("date precedes the Unix epoch: {0}")]
    BeforeEpoch(i64),
    #[error("expected {expected} deployment arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: Box<ConvertError>,
    },
}

// ─── ParamType ───────────────────────────────────────────────────────

/// Constructor parameter type tag. Closed: the module registry can only name these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Uint,
    Address,
    Bool,
}

impl ParamType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uint => "uint",
            Self::Address => "address",
            Self::Bool => "bool",
        }
    }

    /// Name of the deployment-script function that reverses this type's conversion.
    pub const fn parse_fn(self) -> &'static str {
        match self {
            Self::Uint => "parseUint",
            Self::Address => "parseAddress",
            Self::Bool => "parseBool",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint" | "uint256" => Ok(Self::Uint),
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            other => Err(ConvertError::UnknownType(other.to_string())),
        }
    }
}

// ─── Address ─────────────────────────────────────────────────────────

/// Account or contract address. Stored verbatim; casing is never normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Amount ──────────────────────────────────────────────────────────

/// Monetary or ratio quantity with integer semantics (wei, token units, caps).
///
/// Deserializes from integers, integral floats, or decimal strings (exponent
/// notation allowed, e.g. `"1.5e18"`). Serializes as a decimal string so values
/// beyond `u64` survive JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Int(u64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match AmountRepr::deserialize(deserializer)? {
            AmountRepr::Int(v) => Ok(v as u128),
            AmountRepr::Float(v) => parse_float_amount(v),
            AmountRepr::Text(s) => parse_amount(&s),
        };
        parsed.map(Amount).map_err(serde::de::Error::custom)
    }
}

/// Largest magnitude below which every integral `f64` is exact (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Numbers past `u64` reach us as `f64` and may already have lost digits.
fn parse_float_amount(v: f64) -> Result<u128, ConvertError> {
    if v.abs() >= MAX_EXACT_FLOAT {
        return Err(ConvertError::InexactFloat(v.to_string()));
    }
    // f64 Display never uses exponent notation.
    parse_amount(&v.to_string())
}

/// Parse a decimal integer, optionally written with a fraction and exponent
/// (`"1.5e18"`), into an exact `u128`. Any non-zero fractional remainder is rejected.
pub fn parse_amount(raw: &str) -> Result<u128, ConvertError> {
    let text = raw.trim();
    let invalid = || ConvertError::InvalidUint(raw.to_string());

    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => {
            let exp = text[pos + 1..].parse::<i64>().map_err(|_| invalid())?;
            (&text[..pos], exp)
        }
        None => (text, 0),
    };
    let mantissa = mantissa.strip_prefix('+').unwrap_or(mantissa);

    let (int_digits, frac_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_digits) || !all_digits(frac_digits) {
        return Err(invalid());
    }

    let digits = format!("{int_digits}{frac_digits}");
    let scale = i64::try_from(frac_digits.len())
        .ok()
        .and_then(|len| exponent.checked_sub(len))
        .ok_or_else(invalid)?;

    let kept = if scale < 0 {
        let cut = scale.unsigned_abs() as usize;
        let (kept, dropped) = digits.split_at(digits.len().saturating_sub(cut));
        if dropped.bytes().any(|b| b != b'0') {
            return Err(ConvertError::Fractional(raw.to_string()));
        }
        kept
    } else {
        digits.as_str()
    };

    let overflow = || ConvertError::Overflow(raw.to_string());
    let mut value: u128 = 0;
    for b in kept.bytes() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u128::from(b - b'0')))
            .ok_or_else(overflow)?;
    }
    if value != 0 {
        for _ in 0..scale.max(0) {
            value = value.checked_mul(10).ok_or_else(overflow)?;
        }
    }
    Ok(value)
}

// ─── Timestamp ───────────────────────────────────────────────────────

/// Calendar instant expressed as Unix epoch seconds (UTC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const fn epoch_seconds(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Seconds(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TimestampRepr::deserialize(deserializer)? {
            TimestampRepr::Seconds(s) => Ok(Timestamp(s)),
            TimestampRepr::Text(s) => parse_timestamp(&s)
                .map(Timestamp)
                .map_err(serde::de::Error::custom),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parse epoch seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (UTC).
pub fn parse_timestamp(raw: &str) -> Result<u64, ConvertError> {
    let text = raw.trim();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .map_err(|_| ConvertError::InvalidDate(raw.to_string()));
    }

    let seconds = if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        dt.timestamp()
    } else if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        dt.and_utc().timestamp()
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| ConvertError::InvalidDate(raw.to_string()))?
    };

    u64::try_from(seconds).map_err(|_| ConvertError::BeforeEpoch(seconds))
}

// ─── Literal ─────────────────────────────────────────────────────────

/// A resolved value in canonical form, ready to be written into generated code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LiteralRepr", into = "LiteralRepr")]
pub enum Literal {
    Uint(u128),
    Address(Address),
    Bool(bool),
}

impl Literal {
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Uint(_) => ParamType::Uint,
            Self::Address(_) => ParamType::Address,
            Self::Bool(_) => ParamType::Bool,
        }
    }

    /// Canonical source form: `1000`, `"0xAbC…"`, `true`.
    pub fn render(&self) -> String {
        match self {
            Self::Uint(v) => v.to_string(),
            Self::Address(a) => format!("\"{}\"", a.0),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn raw_value(&self) -> String {
        match self {
            Self::Uint(v) => v.to_string(),
            Self::Address(a) => a.0.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<Amount> for Literal {
    fn from(value: Amount) -> Self {
        Self::Uint(value.0)
    }
}

impl From<Timestamp> for Literal {
    fn from(value: Timestamp) -> Self {
        Self::Uint(u128::from(value.0))
    }
}

impl From<u64> for Literal {
    fn from(value: u64) -> Self {
        Self::Uint(u128::from(value))
    }
}

impl From<Address> for Literal {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[derive(Serialize, Deserialize)]
struct LiteralRepr {
    #[serde(rename = "type")]
    ty: ParamType,
    value: String,
}

impl From<Literal> for LiteralRepr {
    fn from(lit: Literal) -> Self {
        Self {
            ty: lit.param_type(),
            value: lit.raw_value(),
        }
    }
}

impl TryFrom<LiteralRepr> for Literal {
    type Error = ConvertError;

    fn try_from(repr: LiteralRepr) -> Result<Self, Self::Error> {
        parse_literal(repr.ty, &repr.value)
    }
}

/// Reverse a conversion: parse a (possibly externally supplied) value by type.
///
/// Accepts both canonical renderings and bare values, so a quoted address and
/// an unquoted one parse to the same literal.
pub fn parse_literal(ty: ParamType, raw: &str) -> Result<Literal, ConvertError> {
    let text = raw.trim();
    match ty {
        ParamType::Uint => parse_amount(text).map(Literal::Uint),
        ParamType::Address => {
            let inner = text
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(text);
            if inner.is_empty() || inner.contains('"') || inner.contains(char::is_whitespace) {
                return Err(ConvertError::InvalidAddress(raw.to_string()));
            }
            Ok(Literal::Address(Address::new(inner)))
        }
        ParamType::Bool => match text {
            "true" => Ok(Literal::Bool(true)),
            "false" => Ok(Literal::Bool(false)),
            _ => Err(ConvertError::InvalidBool(raw.to_string())),
        },
    }
}
