use crate::areas::repository::Repository;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Create a fresh repository at `path` and report where it landed.
    pub fn init_at(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let repository = Self::init(path, writer)?;

        writeln!(
            repository.writer(),
            "Initialized empty kit repository in {}",
            repository.kit_path().display()
        )?;

        Ok(repository)
    }
}
