//! Bas Play Scraper API Library
//!
//! This library scrapes the Bas Play movie/TV catalog site and exposes
//! browse, search, detail, episode and video data through REST API endpoints.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod parser;
pub mod routes;
pub mod scraper;
