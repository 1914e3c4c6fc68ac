//! Data collaborators: where item snapshots come from and where commits go.

pub mod csv_import;
pub mod file;

use crate::model::RawItem;

pub use csv_import::CsvItemSource;
pub use file::{load_item_file, save_item_file, FileCommitSink, FileItemSource, ItemFile};

/// The read side of the data collaborator.
///
/// Every call returns a full replacement snapshot; records are validated by the
/// view, not by the source.
pub trait ItemSource {
    fn load_items(&self) -> anyhow::Result<Vec<RawItem>>;
}
