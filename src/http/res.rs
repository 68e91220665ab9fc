use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::{
    error::BodyError,
    protocol::{header::HeaderKey, status::StatusCode, version::HttpVersion},
};

pub const SERVER_NAME: &str = "rebody";

pub struct Response<'a, W> {
    pub writer: &'a mut W,
    pub status: StatusCode,
    pub version: HttpVersion,
    pub headers: Vec<(HeaderKey, String)>,
    pub body: Vec<u8>,
}

impl<'a, W> Response<'a, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            status: StatusCode::Ok,
            version: HttpVersion::Http11,
            headers: vec![(HeaderKey::Server, SERVER_NAME.to_string())],
            body: Vec::new(),
        }
    }

    pub fn json(&mut self, body: Vec<u8>) -> &mut Self {
        self.headers
            .push((HeaderKey::ContentType, "application/json".to_string()));
        self.body = body;
        self
    }

    pub async fn send(&mut self) -> anyhow::Result<()> {
        let w = &mut *self.writer;
        w.write_all(
            format!(
                "{} {} {}\r\n",
                self.version, self.status as u16, self.status.to_str()
            )
            .as_bytes(),
        )
        .await?;
        for (k, v) in &self.headers {
            w.write_all(format!("{}: {}\r\n", k, v).as_bytes()).await?;
        }
        w.write_all(format!("{}: {}\r\n", HeaderKey::ContentLength, self.body.len()).as_bytes())
            .await?;
        w.write_all(format!("{}: close\r\n\r\n", HeaderKey::Connection).as_bytes())
            .await?;
        w.write_all(&self.body).await?;
        w.flush().await?;

        Ok(())
    }

    /// Answers with the status the error maps to and its message as plain text.
    pub async fn send_failure(&mut self, err: &BodyError) -> anyhow::Result<()> {
        self.send_error(err.status(), &err.to_string()).await
    }

    pub async fn send_error(&mut self, status: StatusCode, message: &str) -> anyhow::Result<()> {
        self.status = status;
        self.headers
            .push((HeaderKey::ContentType, "text/plain; charset=utf-8".to_string()));
        self.body = format!("Error: {}", message).into_bytes();
        self.send().await
    }
}
