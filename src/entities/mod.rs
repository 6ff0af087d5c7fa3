pub mod prelude;

pub mod show_documents;
