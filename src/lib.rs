// Library for tests to access modules

pub mod aggregation;
pub mod archive_db;
pub mod config;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod reconcile;
pub mod report;
pub mod runner;
