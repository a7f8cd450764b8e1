//! learnhub-report: HTML rendering for attempt reviews and quiz reports.

pub mod html;
