pub mod document_locator;

pub use document_locator::{DocumentLocator, ExportDocument, LocatedDocuments};
