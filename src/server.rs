use std::net::SocketAddr;

use serde_json::json;
use tokio::io::{BufReader, BufWriter};
use tokio::net::{
    TcpListener, TcpStream,
    tcp::{OwnedReadHalf, OwnedWriteHalf},
};
use tracing::{debug, info, warn};

use crate::http::{
    error::BodyError, multipart::MultipartDispatcher, protocol::status::StatusCode, req::Request,
    res::Response,
};

/// Echo server: answers every request with its decoded form parameters.
pub struct BodyServer {
    pub addr: SocketAddr,
    pub multipart: MultipartDispatcher,
}

impl BodyServer {
    pub fn new(addr: SocketAddr, multipart: MultipartDispatcher) -> Self {
        Self { addr, multipart }
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Accept loop over an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        info!("[rebody] listening on {}", listener.local_addr()?);

        loop {
            let (socket, peer_addr) = listener.accept().await?;
            let multipart = self.multipart.clone();

            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(socket, multipart).await {
                    warn!(%peer_addr, error = %e, "connection failed");
                }
            });
        }
    }

    async fn handle_connection(
        socket: TcpStream,
        multipart: MultipartDispatcher,
    ) -> anyhow::Result<()> {
        let (reader, writer) = socket.into_split();
        let mut reader = BufReader::new(reader);
        let mut writer = BufWriter::new(writer);
        Self::handle_http(&mut reader, &mut writer, multipart).await
    }

    async fn handle_http(
        reader: &mut BufReader<OwnedReadHalf>,
        writer: &mut BufWriter<OwnedWriteHalf>,
        multipart: MultipartDispatcher,
    ) -> anyhow::Result<()> {
        let mut res = Response::new(writer);

        let req = match Request::parse(reader, multipart).await {
            Ok(req) => req,
            Err(e) => {
                if let Some(body_err) = e.downcast_ref::<BodyError>() {
                    debug!(error = %body_err, "rejecting request body up front");
                    return res.send_failure(body_err).await;
                }
                debug!(error = %e, "rejecting malformed request");
                return res.send_error(StatusCode::BadRequest, &e.to_string()).await;
            }
        };

        match Self::describe(&req).await {
            Ok(body) => res.json(body).send().await,
            Err(e) => res.send_failure(&e).await,
        }
    }

    async fn describe(req: &Request<'_, BufReader<OwnedReadHalf>>) -> Result<Vec<u8>, BodyError> {
        let params = req.body().params().await?;
        let body_length = req.bytes().await?.len();
        let doc = json!({
            "method": req.method().to_str(),
            "path": req.path(),
            "params": params,
            "body_length": body_length,
        });
        Ok(doc.to_string().into_bytes())
    }
}
