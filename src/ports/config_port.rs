//! Configuration access port.

use rust_decimal::Decimal;

/// Typed lookups into a sectioned key/value configuration. Every getter
/// except `get_string` falls back to `default` on a missing or malformed key;
/// validation is responsible for rejecting malformed values up front.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Monetary values are parsed straight from text so no binary rounding
    /// enters the ledger.
    fn get_decimal(&self, section: &str, key: &str, default: Decimal) -> Decimal;

    /// Every key/value pair of a section, sorted by key. Empty when the
    /// section is absent.
    fn get_section(&self, section: &str) -> Vec<(String, String)>;
}
