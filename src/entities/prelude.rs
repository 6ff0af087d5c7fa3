pub use super::show_documents::Entity as ShowDocuments;
