//! Turning confirmation email text into calendar event requests.
//!
//! [`extract`] finds the "`<class> on <M/D/YYYY> at <H:MM><am|pm>`" sentence in a
//! body and [`EventTemplate::build`] turns the result into an [`EventRequest`].

mod event;
mod extractor;

pub use event::{build_event, EventRequest, EventTemplate, EventTime};
pub use extractor::{extract, ParsedRegistration};
