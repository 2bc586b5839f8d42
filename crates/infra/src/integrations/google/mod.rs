//! Google Calendar integration

pub mod client;

pub use client::GoogleCalendarClient;
