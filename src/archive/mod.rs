pub mod zip_unpacker;

pub use zip_unpacker::{validate_entry_path, UnpackReport, ZipUnpacker};
