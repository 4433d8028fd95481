//! Finance Tracker
//!
//! Personal finance records (expenses, income, credits, notes, tasks, budgets,
//! savings goals and trading-party ledgers) kept in flat JSON files and served
//! over a small REST API.

pub mod api;
pub mod auth;
pub mod book;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;
