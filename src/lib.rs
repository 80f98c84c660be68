//! Employee attendance: check-in/check-out capture, record storage and the
//! password-gated admin review, served over actix-web.

pub mod admin;
pub mod api;
pub mod capture;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod location;
pub mod model;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod workflow;
