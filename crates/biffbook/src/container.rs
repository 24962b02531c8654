//! Compound-document containers for the finished workbook stream.
//!
//! A [`Container`] receives the BIFF stream in pieces and either stores all
//! of it or reports an error. Both implementations here write an OLE2
//! compound file with a single stream through the `cfb` crate.

use std::io::{self, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::{XlsError, XlsResult};

/// Sink for the workbook stream.
pub trait Container {
    /// In-progress stream.
    type Handle;

    /// Start a stream named `stream_name`.
    fn open(&mut self, stream_name: &str) -> XlsResult<Self::Handle>;

    /// Append bytes to the stream.
    fn append(&mut self, handle: &mut Self::Handle, bytes: &[u8]) -> XlsResult<()>;

    /// Store the stream. Nothing is stored unless this succeeds.
    fn commit(&mut self, handle: Self::Handle) -> XlsResult<()>;
}

/// Stream contents buffered until commit.
#[derive(Debug)]
pub struct StreamHandle {
    name: String,
    data: Vec<u8>,
}

impl StreamHandle {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Write a compound file holding one stream into `inner`.
fn write_compound<F: Read + Write + Seek>(inner: F, stream: &StreamHandle) -> io::Result<F> {
    let mut compound = cfb::CompoundFile::create(inner)?;
    {
        let mut out = compound.create_stream(format!("/{}", stream.name))?;
        out.write_all(&stream.data)?;
        out.flush()?;
    }
    compound.flush()?;
    Ok(compound.into_inner())
}

fn container_error(target: &Path, err: impl std::fmt::Display) -> XlsError {
    XlsError::ContainerWrite(format!("{}: {err}", target.display()))
}

/// Writes the compound file to a path.
///
/// The file is built in a temporary file next to the target and renamed over
/// it once complete, so a failed commit never leaves a partial file behind.
#[derive(Debug, Clone)]
pub struct CfbFileContainer {
    path: PathBuf,
}

impl CfbFileContainer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Container for CfbFileContainer {
    type Handle = StreamHandle;

    fn open(&mut self, stream_name: &str) -> XlsResult<StreamHandle> {
        Ok(StreamHandle::new(stream_name))
    }

    fn append(&mut self, handle: &mut StreamHandle, bytes: &[u8]) -> XlsResult<()> {
        handle.data.extend_from_slice(bytes);
        Ok(())
    }

    fn commit(&mut self, handle: StreamHandle) -> XlsResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| container_error(&self.path, e))?;
        write_compound(tmp.as_file_mut(), &handle).map_err(|e| container_error(&self.path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| container_error(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| container_error(&self.path, e.error))?;

        log::info!(
            "wrote {} ({} byte {} stream)",
            self.path.display(),
            handle.data.len(),
            handle.name
        );
        Ok(())
    }
}

/// Builds the compound file in memory.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    bytes: Option<Vec<u8>>,
    stream: Option<StreamHandle>,
    commits: usize,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compound file produced by the last commit.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        self.bytes
    }

    /// The raw stream of the last commit.
    pub fn stream(&self) -> Option<&[u8]> {
        self.stream.as_ref().map(|s| s.data.as_slice())
    }

    pub fn stream_name(&self) -> Option<&str> {
        self.stream.as_ref().map(StreamHandle::name)
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl Container for MemoryContainer {
    type Handle = StreamHandle;

    fn open(&mut self, stream_name: &str) -> XlsResult<StreamHandle> {
        Ok(StreamHandle::new(stream_name))
    }

    fn append(&mut self, handle: &mut StreamHandle, bytes: &[u8]) -> XlsResult<()> {
        handle.data.extend_from_slice(bytes);
        Ok(())
    }

    fn commit(&mut self, handle: StreamHandle) -> XlsResult<()> {
        let cursor = write_compound(Cursor::new(Vec::new()), &handle)
            .map_err(|e| XlsError::ContainerWrite(e.to_string()))?;

        log::info!(
            "built {} byte compound file ({} byte {} stream)",
            cursor.get_ref().len(),
            handle.data.len(),
            handle.name
        );
        self.bytes = Some(cursor.into_inner());
        self.stream = Some(handle);
        self.commits += 1;
        Ok(())
    }
}
