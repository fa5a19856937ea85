//! CLI command handlers

pub mod commands;

pub use commands::{
    categories, export, export_schedules, import, import_schedules, resolve_attribute, schedules,
    ReportOptions,
};
