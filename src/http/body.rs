use std::{
    io::Cursor,
    sync::atomic::{AtomicBool, Ordering},
};

use bytes::Bytes;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::{Mutex, OnceCell},
};
use tracing::{debug, warn};

use crate::http::{
    error::BodyError,
    form::decode_url_string,
    multipart::{FileItem, MultipartDispatcher},
    params::{MultiMap, ParamValue, ParameterMap},
    protocol::{charset::Charset, content_type::is_multipart_form_data},
};

const READ_CHUNK: usize = 8 * 1024;

/// Where a body is in its one-way initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// The source together with what has been drained from it so far. It
/// outlives any single initializer, so a re-run after a cancelled one
/// continues the read instead of starting over.
struct Pending<S> {
    source: S,
    partial: Vec<u8>,
    raw: Option<Bytes>,
}

#[derive(Debug)]
struct Buffered {
    raw: Bytes,
    charset: Charset,
    params: MultiMap,
}

/// A request body that can be read any number of times.
///
/// The first accessor drains `source` into memory and decodes the form
/// parameters (URL-encoded or multipart, by content type). Concurrent first
/// callers wait on that single initialization. If the caller driving it is
/// dropped, the next waiter takes over and resumes the read. Its outcome,
/// including a failure, is kept for the lifetime of the body: the source is
/// never read twice, so a failed body keeps reporting the same error.
pub struct RereadableBody<S> {
    pending: Mutex<Pending<S>>,
    content_type: Option<String>,
    character_encoding: Option<String>,
    multipart: MultipartDispatcher,
    started: AtomicBool,
    state: OnceCell<Result<Buffered, BodyError>>,
}

impl<S> RereadableBody<S>
where
    S: AsyncRead + Unpin + Send,
{
    pub fn new(
        source: S,
        content_type: Option<String>,
        character_encoding: Option<String>,
        multipart: MultipartDispatcher,
    ) -> Self {
        Self {
            pending: Mutex::new(Pending {
                source,
                partial: Vec::new(),
                raw: None,
            }),
            content_type,
            character_encoding,
            multipart,
            started: AtomicBool::new(false),
            state: OnceCell::new(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn state(&self) -> BodyState {
        match self.state.get() {
            Some(Ok(_)) => BodyState::Ready,
            Some(Err(_)) => BodyState::Failed,
            None if self.started.load(Ordering::Acquire) => BodyState::Initializing,
            None => BodyState::Uninitialized,
        }
    }

    // --- byte and character views ---

    /// Fresh cursor over the buffered bytes.
    pub async fn input_stream(&self) -> Result<Cursor<Bytes>, BodyError> {
        Ok(Cursor::new(self.bytes().await?))
    }

    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        Ok(self.buffered().await?.raw.clone())
    }

    /// Fresh cursor over the body decoded with the resolved charset.
    ///
    /// Bytes that do not decode fail this call only; the body itself stays
    /// readable through [`Self::input_stream`].
    pub async fn reader(&self) -> Result<Cursor<Bytes>, BodyError> {
        let text = self.text().await?;
        Ok(Cursor::new(Bytes::from(text.into_bytes())))
    }

    pub async fn text(&self) -> Result<String, BodyError> {
        let buffered = self.buffered().await?;
        buffered.charset.decode(&buffered.raw)
    }

    pub async fn character_encoding(&self) -> Result<Charset, BodyError> {
        Ok(self.buffered().await?.charset)
    }

    // --- parameters ---

    pub async fn params(&self) -> Result<&MultiMap, BodyError> {
        Ok(&self.buffered().await?.params)
    }

    /// First value of `name`, files rendered as their file name.
    pub async fn parameter(&self, name: &str) -> Result<Option<String>, BodyError> {
        Ok(self.params().await?.value(name).map(ToString::to_string))
    }

    pub async fn parameter_values(&self, name: &str) -> Result<Vec<String>, BodyError> {
        Ok(self
            .params()
            .await?
            .values(name)
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    pub async fn parameter_names(&self) -> Result<Vec<String>, BodyError> {
        Ok(self.params().await?.keys().map(str::to_string).collect())
    }

    pub async fn parameter_map(&self) -> Result<ParameterMap, BodyError> {
        Ok(self.params().await?.as_map())
    }

    pub async fn value(&self, name: &str) -> Result<Option<ParamValue>, BodyError> {
        Ok(self.params().await?.value(name).cloned())
    }

    /// First file uploaded under `name`.
    pub async fn file(&self, name: &str) -> Result<Option<FileItem>, BodyError> {
        Ok(self.files(name).await?.into_iter().next())
    }

    pub async fn files(&self, name: &str) -> Result<Vec<FileItem>, BodyError> {
        Ok(self
            .params()
            .await?
            .values(name)
            .iter()
            .filter_map(ParamValue::as_file)
            .cloned()
            .collect())
    }

    // --- initialization ---

    async fn buffered(&self) -> Result<&Buffered, BodyError> {
        self.state
            .get_or_init(|| self.initialize())
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    async fn initialize(&self) -> Result<Buffered, BodyError> {
        self.started.store(true, Ordering::Release);
        let result = self.buffer_and_decode().await;
        if let Err(e) = &result {
            warn!(error = %e, "request body initialization failed");
        }
        result
    }

    async fn buffer_and_decode(&self) -> Result<Buffered, BodyError> {
        let mut guard = self.pending.lock().await;
        let pending = &mut *guard;

        let raw = match pending.raw.clone() {
            Some(raw) => raw,
            None => {
                loop {
                    pending.partial.reserve(READ_CHUNK);
                    let n = pending
                        .source
                        .read_buf(&mut pending.partial)
                        .await
                        .map_err(BodyError::read)?;
                    if n == 0 {
                        break;
                    }
                }
                let raw = Bytes::from(std::mem::take(&mut pending.partial));
                pending.raw = Some(raw.clone());
                raw
            }
        };

        let charset = self.resolve_charset()?;
        let content_type = self.content_type.as_deref().unwrap_or("");
        debug!(
            bytes = raw.len(),
            content_type,
            charset = %charset,
            "request body buffered"
        );

        let params = if is_multipart_form_data(content_type) {
            self.multipart
                .dispatch(raw.clone(), content_type, charset)
                .await?
        } else {
            let text = charset.decode(&raw)?;
            decode_url_string(&text, charset)?
        };

        Ok(Buffered {
            raw,
            charset,
            params,
        })
    }

    fn resolve_charset(&self) -> Result<Charset, BodyError> {
        match self.character_encoding.as_deref() {
            None => Ok(Charset::default()),
            Some(name) => {
                Charset::from_name(name).ok_or_else(|| BodyError::UnsupportedCharset(name.to_string()))
            }
        }
    }
}
