mod entry;
mod rename;
mod store;
#[cfg(test)]
mod tests;

pub use entry::{CatalogEntry, MediaKind, ALLOWED_EXTENSIONS};
pub use rename::{validate_file_name, RenameRequest};
pub use store::MediaCatalog;
