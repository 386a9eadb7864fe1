//! iCalendar payload validation and parsing.
//!
//! Payloads are validated before parsing so that error pages and truncated
//! downloads surface as validation failures rather than parse errors.

mod parse;
mod validate;

pub use parse::parse_definitions;
pub use validate::validate_ics_payload;
