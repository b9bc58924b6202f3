pub mod catalog;
pub mod importer;
pub mod statistics;
pub mod users;

pub use catalog::{MovieCatalog, MovieServiceCatalog};
pub use importer::{LetterboxdImporter, WatchImporter};
pub use statistics::compute_statistics;
