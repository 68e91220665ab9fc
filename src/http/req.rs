use std::{collections::HashMap, io::Cursor, time::Duration};

use anyhow::{Context, bail};
use bytes::Bytes;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, Take},
    time::timeout,
};

use crate::http::{
    body::RereadableBody,
    error::BodyError,
    meta::HttpMetadata,
    multipart::{FileItem, MultipartDispatcher},
    params::{ParamValue, ParameterMap},
    protocol::{
        content_type::{ContentType, is_multipart_form_data},
        header::HeaderKey,
        method::HttpMethod,
        version::HttpVersion,
    },
};

pub const MAX_CAPACITY: usize = 1024;
pub const TIME_LIMIT: u64 = 500;

/// An inbound request whose body can be re-read and whose form parameters
/// are decoded on first use.
pub struct Request<'a, R> {
    pub meta: HttpMetadata,
    body: RereadableBody<Take<&'a mut R>>,
}

impl<'a, R> Request<'a, R>
where
    R: AsyncRead + AsyncBufRead + Unpin + Send,
{
    /// Reads the request line and headers; the body is left on `reader`
    /// until something asks for it.
    ///
    /// A multipart request whose `Content-Length` exceeds the dispatcher's
    /// ceiling fails with a [`BodyError::SizeLimitExceeded`] inside the
    /// returned error.
    pub async fn parse(reader: &'a mut R, multipart: MultipartDispatcher) -> anyhow::Result<Self> {
        // 1. Request line
        let line = read_line_with_limit(reader).await?;
        let line_str = std::str::from_utf8(&line).context("Request line not UTF-8")?;
        let mut parts = line_str.split_whitespace();

        let method_str = parts.next().context("Missing method")?;
        let path = parts.next().context("Missing path")?.to_string();
        let version = parts.next().context("Missing version")?;

        let method = HttpMethod::from_str(method_str).context("Unknown method")?;
        let version = HttpVersion::from_str(version).context("Unknown HTTP version")?;

        // 2. Headers
        let headers = parse_headers_from_reader(reader).await?;

        let length = match headers.get(&HeaderKey::ContentLength) {
            Some(s) => s.trim().parse::<usize>().context("Invalid Content-Length")?,
            None => 0,
        };

        let is_chunked = headers
            .get(&HeaderKey::TransferEncoding)
            .map(|te| te.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        if is_chunked {
            bail!("Chunked request bodies are not supported");
        }

        // An oversized multipart body is refused before any of it is read.
        let limit = multipart.config().size_max;
        let raw_content_type = headers.get(&HeaderKey::ContentType);
        let is_multipart = raw_content_type.is_some_and(|ct| is_multipart_form_data(ct));
        if is_multipart && length as u64 > limit {
            return Err(BodyError::SizeLimitExceeded { limit }.into());
        }

        let content_type = raw_content_type.map(|s| ContentType::parse(s));

        let meta = HttpMetadata {
            method,
            path,
            version,
            headers,
            content_type,
            length,
        };

        let body = RereadableBody::new(
            reader.take(length as u64),
            meta.raw_content_type().map(str::to_string),
            meta.character_encoding().map(str::to_string),
            multipart,
        );

        Ok(Self { meta, body })
    }

    // --- request data ---

    pub fn method(&self) -> HttpMethod {
        self.meta.method
    }

    pub fn path(&self) -> &str {
        &self.meta.path
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.meta.header(key)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.meta.raw_content_type()
    }

    pub fn body(&self) -> &RereadableBody<Take<&'a mut R>> {
        &self.body
    }

    // --- forwarded to the body ---

    pub async fn parameter(&self, name: &str) -> Result<Option<String>, BodyError> {
        self.body.parameter(name).await
    }

    pub async fn parameter_values(&self, name: &str) -> Result<Vec<String>, BodyError> {
        self.body.parameter_values(name).await
    }

    pub async fn parameter_names(&self) -> Result<Vec<String>, BodyError> {
        self.body.parameter_names().await
    }

    pub async fn parameter_map(&self) -> Result<ParameterMap, BodyError> {
        self.body.parameter_map().await
    }

    pub async fn value(&self, name: &str) -> Result<Option<ParamValue>, BodyError> {
        self.body.value(name).await
    }

    pub async fn file(&self, name: &str) -> Result<Option<FileItem>, BodyError> {
        self.body.file(name).await
    }

    pub async fn files(&self, name: &str) -> Result<Vec<FileItem>, BodyError> {
        self.body.files(name).await
    }

    pub async fn input_stream(&self) -> Result<Cursor<Bytes>, BodyError> {
        self.body.input_stream().await
    }

    pub async fn reader(&self) -> Result<Cursor<Bytes>, BodyError> {
        self.body.reader().await
    }

    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        self.body.bytes().await
    }

    pub async fn text(&self) -> Result<String, BodyError> {
        self.body.text().await
    }
}

async fn read_line_with_limit<R>(reader: &mut R) -> anyhow::Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(MAX_CAPACITY);
    let n = timeout(
        Duration::from_millis(TIME_LIMIT),
        reader.read_until(b'\n', &mut buf),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Read timeout"))??;

    if n == 0 {
        bail!("Connection closed");
    }
    Ok(buf)
}

async fn parse_headers_from_reader<R>(reader: &mut R) -> anyhow::Result<HashMap<HeaderKey, String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut map = HashMap::new();
    loop {
        let line_bytes = read_line_with_limit(reader).await?;
        let line = std::str::from_utf8(&line_bytes)?.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(pos) = line.find(':') {
            if let Some(key) = HeaderKey::from_str(&line[..pos]) {
                map.insert(key, line[pos + 1..].trim().to_string());
            }
        }
    }
    Ok(map)
}
