pub mod archive;
pub mod bot;
pub mod config;
pub mod engine;
pub mod extract;
pub mod humanize;
pub mod item;
pub mod ledger;
pub mod observability;
pub mod platform;
pub mod reply;
