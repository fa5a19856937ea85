//! ParamSync - element parameters ⇄ Excel workbooks
//!
//! Exports typed element attributes from a host document to color-coded
//! worksheets and imports edited sheets back, writing only cells whose color
//! marks them as editable.
//!
//! # Features
//!
//! - Three-tier attribute resolution (instance, type, built-in)
//! - Text/integer/Yes-No/number/element-link value codec with display units
//! - Category sheets and schedule snapshots, each with a color legend
//! - Partial-failure imports: bad rows are reported, good rows are applied
//!
//! # Example
//!
//! ```no_run
//! use royalbit_paramsync::config::SyncConfig;
//! use royalbit_paramsync::host::Scope;
//! use royalbit_paramsync::parser::parse_document;
//! use royalbit_paramsync::sync::Coordinator;
//! use std::path::Path;
//!
//! # async fn run() -> royalbit_paramsync::SyncResult<()> {
//! let mut doc = parse_document(Path::new("project.yaml"))?;
//! let mut coordinator = Coordinator::new(&mut doc, SyncConfig::default());
//! coordinator
//!     .export_categories(
//!         Path::new("walls.xlsx"),
//!         &["Walls".to_string()],
//!         &["Mark".to_string(), "Height".to_string()],
//!         &Scope::Document,
//!         |percent| println!("{}%", percent),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod host;
pub mod parser;
pub mod sync;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{ErrorRecord, SyncError, SyncResult};
pub use host::{HostDocument, MemoryDocument};
pub use types::{EntityId, ResolvedSlot, Tier, ValueKind};
