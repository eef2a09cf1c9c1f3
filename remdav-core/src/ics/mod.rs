//! iCalendar conversion for single events.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_event;
