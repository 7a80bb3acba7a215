pub mod domain;
pub mod error;
pub mod uri;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
