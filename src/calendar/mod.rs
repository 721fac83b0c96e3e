pub mod client;
pub mod models;
pub mod token;

pub use client::{CalendarClient, GOOGLE_CALENDAR_API, PRIMARY_CALENDAR_ID};
pub use models::{CalendarConfig, CalendarEvent, CalendarListEntry};
pub use token::GOOGLE_TOKEN_URL;
