pub mod file;
pub mod memory;
pub mod provider;

pub use file::FileCatalog;
pub use memory::MemoryCatalog;
pub use provider::CatalogProvider;
