use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

/// A user-supplied file whose bytes can be read asynchronously.
///
/// Reads are the suspension points of a load, everything else runs
/// synchronously on the event loop.
#[async_trait(?Send)]
pub trait FileSource {
    /// Display name used in error reports and logs
    fn name(&self) -> &str;

    async fn read_bytes(&self) -> io::Result<Vec<u8>>;
}

/// File contents that are already in memory, e.g. from a drop event.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[async_trait(?Send)]
impl FileSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct PathSource {
    path: PathBuf,
    name: String,
}

impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait(?Send)]
impl FileSource for PathSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

pub fn sources_from_paths(paths: &[impl AsRef<Path>]) -> Vec<Box<dyn FileSource>> {
    paths
        .iter()
        .map(|path| Box::new(PathSource::new(path.as_ref())) as Box<dyn FileSource>)
        .collect()
}

/// Every `.dcm` file directly inside `path`, sorted by path.
pub fn sources_from_directory(path: impl AsRef<Path>) -> io::Result<Vec<Box<dyn FileSource>>> {
    let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
        })
        .collect();
    paths.sort();

    Ok(sources_from_paths(&paths))
}
