//! World model: the entity-containment graph and the operations on it.
//!
//! The arena in [`registry`] owns every entity; [`movement`] is the only
//! module that changes item ownership; [`passage`] runs the exit/door state
//! machine; [`notify`] fans messages out to rooms and wiretaps. Everything
//! else is queries.

pub mod describe;
pub mod errors;
pub mod hints;
pub mod movement;
pub mod notify;
pub mod passage;
pub mod registry;
pub mod seed;
pub mod types;

pub use errors::WorldError;
pub use registry::{CatalogEntry, World};
pub use types::*;

/// Uppercase the first character, for sentence-leading titles.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::capitalize;

    #[test]
    fn capitalize_first_char_only() {
        assert_eq!(capitalize("laish the town crier"), "Laish the town crier");
        assert_eq!(capitalize(""), "");
    }
}
