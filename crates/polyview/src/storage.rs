use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Result;

#[derive(Debug, Clone)]
pub struct DataPath {
    base: PathBuf,
}

impl DataPath {
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref().to_path_buf();
        Self { base }
    }

    pub fn default_base() -> Option<PathBuf> {
        dirs::data_local_dir().map(|pb| pb.join("polyview"))
    }

    pub fn default_base_or_cwd() -> PathBuf {
        Self::default_base().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn rel_path(&self, typ: DataPathType) -> PathBuf {
        match typ {
            DataPathType::Log => PathBuf::from("logs"),
            DataPathType::Downloads => PathBuf::from("downloads"),
            DataPathType::Profiles => PathBuf::from("profiles"),
        }
    }

    pub fn path(&self, typ: DataPathType) -> PathBuf {
        self.base.join(self.rel_path(typ))
    }
}

impl Default for DataPath {
    fn default() -> Self {
        Self::new(Self::default_base_or_cwd())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPathType {
    Log,
    Downloads,
    Profiles,
}

/// Write `data` to `directory/file_name`, creating the directory if needed.
pub fn write_file(directory: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    if !directory.exists() {
        fs::create_dir_all(directory)?
    }

    let path = directory.join(file_name);
    fs::write(&path, data)?;
    Ok(path)
}
