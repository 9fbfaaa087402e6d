use std::path::Path;

pub mod passwd;

/// Producers are evaluated on blocking worker threads, so reads are
/// synchronous.
pub trait Reader: Send + Sync {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct FsReader {}

impl FsReader {
    pub fn new() -> Self {
        Self {}
    }
}

impl Reader for FsReader {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}
