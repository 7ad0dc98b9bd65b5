//! Newsdesk - a news publishing REST API
//!
//! This library provides the core functionality for the newsdesk service:
//! news, authors, tags and comments with filtering, sorting, pagination
//! and hypermedia links.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod search;
pub mod services;
