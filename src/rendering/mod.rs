pub mod document;

pub use document::build_document;
