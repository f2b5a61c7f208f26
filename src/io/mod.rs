//! File input and report output.

pub mod input;
pub mod output;

use std::path::Path;

pub use input::load_records;
pub use output::{create_writer, OutputFormat, OutputWriter, Report};

pub fn read_file(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

pub fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)
}
