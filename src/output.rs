use formatx::formatx;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub trait Output: Debug {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

impl<T: Output> Output for &T {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        (**self).writer_for_location_key(location_key, file_extension)
    }

    fn is_noop(&self) -> bool {
        (**self).is_noop()
    }
}

/// Writes each location key to its own file in a directory. The file template takes the
/// location key and then the file extension, e.g. `"premises__{}.{}"`.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    fn file_name(&self, location_key: &str, file_extension: &str) -> anyhow::Result<String> {
        formatx!(&self.file_template, location_key, file_extension)
            .map_err(|err| anyhow::anyhow!("bad output file template '{}': {err:?}", self.file_template))
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let path = self
            .directory_path
            .join(self.file_name(location_key, file_extension)?);
        Ok(BufWriter::new(File::create(path)?))
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(
        &self,
        _location_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Collects everything written, keyed by `"{location_key}.{file_extension}"`.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    buffers: RefCell<IndexMap<String, Vec<u8>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.buffers.borrow().keys().cloned().collect()
    }

    pub fn contents(&self, key: &str) -> Option<String> {
        self.buffers
            .borrow()
            .get(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl Output for MemoryOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let key = format!("{location_key}.{file_extension}");
        self.buffers.borrow_mut().insert(key.clone(), vec![]);
        Ok(MemoryWriter {
            key,
            buffers: &self.buffers,
        })
    }
}

struct MemoryWriter<'a> {
    key: String,
    buffers: &'a RefCell<IndexMap<String, Vec<u8>>>,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffers
            .borrow_mut()
            .entry(self.key.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
