pub mod fuzzy;

pub use fuzzy::{FuzzyTitleMatcher, query_words};
