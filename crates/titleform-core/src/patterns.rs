//! Regex patterns shared by the title registry and the date parser

use lazy_static::lazy_static;
use regex::Regex;

/// 17 alphanumerics; registered case-insensitive
pub const VIN: &str = r"^[A-Z0-9]{17}$";

// `\d` is Unicode-aware in `regex`; form digits are ASCII only

/// Five-digit US ZIP code
pub const ZIP5: &str = r"^[0-9]{5}$";

/// Ten-digit phone number, digits only
pub const PHONE10: &str = r"^[0-9]{10}$";

/// Single `@`, single dot in the domain
pub const EMAIL: &str = r"^[^\s@]+@[^\s@.]+\.[^\s@.]+$";

/// Nine-digit federal employer identification number, optional dash
pub const FEIN: &str = r"^[0-9]{2}-?[0-9]{7}$";

/// Two-letter state abbreviation
pub const STATE_CODE: &str = r"^[A-Za-z]{2}$";

/// Whole dollar or cents amount
pub const MONEY: &str = r"^[0-9]+(\.[0-9]{2})?$";

/// Non-negative whole number of up to seven digits
pub const WHOLE_NUMBER: &str = r"^[0-9]{1,7}$";

lazy_static! {
    /// MM-DD-YYYY shape, checked before calendar validation
    pub static ref DATE_SHAPE: Regex = Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{4}$").unwrap();
}
