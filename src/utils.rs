//! Utility functions and helpers.

pub mod general;
pub mod preflight;
pub mod settings;

pub use general::{read_content, read_piped, restore_file, write_atomically};
pub use preflight::check_unresolved_path;
pub use settings::{get_env_var, Settings};
