//! casesync - keeps hosted COVID-19 feature layers in step with the Maine CDC
//! case count page.
//!
//! Each cycle fetches the page, parses the statewide and county tables into a
//! [`models::ScrapeSnapshot`], overwrites the totals and county layers, and
//! appends to or corrects the daily time-series table.

pub mod cli;
pub mod config;
pub mod cycle;
pub mod http_client;
pub mod models;
pub mod reconcile;
pub mod scheduler;
pub mod source;
pub mod store;
