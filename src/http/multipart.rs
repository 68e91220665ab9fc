use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::{Bytes, BytesMut};
use futures::stream;
use multer::{Constraints, Field, Multipart, SizeLimit};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::http::{error::BodyError, params::MultiMap, protocol::charset::Charset};

/// Parts larger than this are spilled to the upload repository
pub const DEFAULT_SIZE_THRESHOLD: usize = 64 * 1024;
/// Ceiling on the whole multipart body
pub const DEFAULT_SIZE_MAX: u64 = 10 * 1024 * 1024;
/// Directory name used under the system temp dir when none is configured
pub const DEFAULT_REPOSITORY_DIR: &str = "rebody-file-upload";

// --- [UploadRepository] ---

/// Directory holding parts spilled to disk. Created once, up front, by
/// whoever builds the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRepository {
    dir: PathBuf,
}

impl UploadRepository {
    pub fn init(path: impl Into<PathBuf>) -> Result<Self, BodyError> {
        let dir = path.into();
        std::fs::create_dir_all(&dir).map_err(BodyError::storage)?;
        info!("multipart upload repository ready at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn default_dir() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_REPOSITORY_DIR)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

// --- [MultipartConfig] ---

#[derive(Debug, Clone)]
pub struct MultipartConfig {
    pub repository: UploadRepository,
    pub size_threshold: usize,
    pub size_max: u64,
}

impl MultipartConfig {
    pub fn new(repository: UploadRepository) -> Self {
        Self {
            repository,
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            size_max: DEFAULT_SIZE_MAX,
        }
    }

    pub fn with_size_threshold(mut self, size_threshold: usize) -> Self {
        self.size_threshold = size_threshold;
        self
    }

    pub fn with_size_max(mut self, size_max: u64) -> Self {
        self.size_max = size_max;
        self
    }
}

// --- [FileItem] ---

#[derive(Debug)]
enum Storage {
    Memory(Bytes),
    Disk(NamedTempFile),
}

impl Storage {
    async fn read(&self) -> Result<Bytes, BodyError> {
        match self {
            Storage::Memory(data) => Ok(data.clone()),
            Storage::Disk(file) => tokio::fs::read(file.path())
                .await
                .map(Bytes::from)
                .map_err(BodyError::storage),
        }
    }
}

#[derive(Debug)]
struct FileItemInner {
    field_name: String,
    file_name: String,
    content_type: Option<String>,
    size: u64,
    storage: Storage,
}

/// Handle to an uploaded file part. Cheap to clone; a spilled file is
/// removed from the repository when the last handle drops.
#[derive(Debug, Clone)]
pub struct FileItem {
    inner: Arc<FileItemInner>,
}

impl FileItem {
    pub fn field_name(&self) -> &str {
        &self.inner.field_name
    }

    pub fn file_name(&self) -> &str {
        &self.inner.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.inner.content_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.inner.size
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.inner.storage, Storage::Memory(_))
    }

    /// Location of the spilled content, `None` while held in memory.
    pub fn path(&self) -> Option<&Path> {
        match &self.inner.storage {
            Storage::Disk(file) => Some(file.path()),
            Storage::Memory(_) => None,
        }
    }

    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        self.inner.storage.read().await
    }
}

impl fmt::Display for FileItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.file_name)
    }
}

// --- [MultipartDispatcher] ---

/// Runs a buffered `multipart/form-data` body through `multer` and folds the
/// parts into a [`MultiMap`]: parts without a filename become text values,
/// the rest become [`FileItem`]s.
#[derive(Debug, Clone)]
pub struct MultipartDispatcher {
    config: Arc<MultipartConfig>,
}

impl MultipartDispatcher {
    pub fn new(config: MultipartConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MultipartConfig {
        &self.config
    }

    /// Bodies over `size_max` fail with [`BodyError::SizeLimitExceeded`]
    /// from multer's whole-stream limit.
    pub async fn dispatch(
        &self,
        body: Bytes,
        content_type: &str,
        charset: Charset,
    ) -> Result<MultiMap, BodyError> {
        let boundary = multer::parse_boundary(content_type)?;
        let constraints =
            Constraints::new().size_limit(SizeLimit::new().whole_stream(self.config.size_max));
        let source = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
        let mut multipart = Multipart::with_constraints(source, boundary, constraints);

        let mut params = MultiMap::new();
        while let Some(mut field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());
            let (storage, size) = self.store(&mut field).await?;

            match file_name {
                None => {
                    let raw = storage.read().await?;
                    params.add(field_name, charset.decode(&raw)?);
                }
                Some(file_name) => {
                    let item = FileItem {
                        inner: Arc::new(FileItemInner {
                            field_name: field_name.clone(),
                            file_name,
                            content_type,
                            size,
                            storage,
                        }),
                    };
                    params.add(field_name, item);
                }
            }
        }
        Ok(params)
    }

    /// Drains one part, keeping it in memory up to the threshold and
    /// streaming it into the repository past that.
    async fn store(&self, field: &mut Field<'_>) -> Result<(Storage, u64), BodyError> {
        let mut buffer = BytesMut::new();
        let mut spill: Option<(NamedTempFile, tokio::fs::File)> = None;
        let mut size: u64 = 0;

        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            if let Some((_, file)) = spill.as_mut() {
                file.write_all(&chunk).await.map_err(BodyError::storage)?;
                continue;
            }

            buffer.extend_from_slice(&chunk);
            if buffer.len() > self.config.size_threshold {
                let temp = NamedTempFile::new_in(self.config.repository.path())
                    .map_err(BodyError::storage)?;
                let handle = temp.as_file().try_clone().map_err(BodyError::storage)?;
                let mut file = tokio::fs::File::from_std(handle);
                file.write_all(&buffer).await.map_err(BodyError::storage)?;
                debug!(
                    field = field.name().unwrap_or_default(),
                    path = %temp.path().display(),
                    "multipart part spilled to disk"
                );
                buffer.clear();
                spill = Some((temp, file));
            }
        }

        match spill {
            Some((temp, mut file)) => {
                file.flush().await.map_err(BodyError::storage)?;
                Ok((Storage::Disk(temp), size))
            }
            None => Ok((Storage::Memory(buffer.freeze()), size)),
        }
    }
}
