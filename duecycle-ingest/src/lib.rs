//! duecycle-ingest: bulk task import from plain-text lists.

pub mod parsers;
pub mod types;

pub use parsers::line_list::parse_task_lines;
pub use types::{ImportError, ImportReport, ImportedTask};
