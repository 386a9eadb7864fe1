//! Source converters.
//!
//! Each source has its own record shape. These functions normalize them into
//! canonical [`crate::Event`]s tagged with the owning calendar.

mod google;
mod ical;
mod local;
mod notion;

pub use google::{GoogleEventRow, google_rows_to_events};
pub use ical::{expand_definitions, ical_to_events};
pub use local::{StoredEvent, local_to_event, rehydrate_date};
pub use notion::{NotionPage, notion_to_event, notion_to_events, parse_database_id};
