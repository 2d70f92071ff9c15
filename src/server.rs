use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::context::RequestContext;
use crate::error::StatusCode;
use crate::model::{
    CreateLaptopRequest, FindLaptopRequest, FindLaptopResponse, SearchLaptopRequest,
};
use crate::protocol::{
    read_frame, write_error, write_frame, write_json, ProtocolError, OP_CREATE, OP_FIND,
    OP_SEARCH, STATUS_END, STATUS_ITEM, STATUS_OK,
};
use crate::service::LaptopService;
use crate::storage::LaptopStore;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`. Port 0 lets the OS pick.
    pub addr: String,

    /// Upper bound on a single search; `None` lets searches run until the
    /// store is exhausted or the client goes away.
    pub search_timeout: Option<Duration>,

    /// Results buffered between the store and the socket.
    pub search_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            search_timeout: Some(Duration::from_secs(5)),
            search_buffer: 16,
        }
    }
}

pub struct LaptopServer<S> {
    service: LaptopService<S>,
    config: ServerConfig,
}

impl<S: LaptopStore + 'static> LaptopServer<S> {
    pub fn new(service: LaptopService<S>, config: ServerConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(&self.config.addr).await
    }

    /// Accept connections until `shutdown` is done. Each connection runs on
    /// its own task and sees a child of `shutdown`.
    pub async fn serve(&self, listener: TcpListener, shutdown: RequestContext) {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.done() => {
                    info!("server shutting down");
                    return;
                }
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((socket, peer)) => {
                    let service = self.service.clone();
                    let config = self.config.clone();
                    let ctx = shutdown.child();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(socket, peer, service, config, ctx).await {
                            // Ignore expected disconnections to keep logs clean
                            if !is_disconnect(&e) {
                                error!(%peer, error = %e, "client error");
                            }
                        }
                    });
                }
                Err(e) => error!(error = %e, "connection failed"),
            }
        }
    }

    pub async fn run(&self, shutdown: RequestContext) -> std::io::Result<()> {
        let listener = self.bind().await?;
        info!(addr = %listener.local_addr()?, "laptop server listening");
        self.serve(listener, shutdown).await;
        Ok(())
    }
}

async fn handle_client<S: LaptopStore>(
    stream: TcpStream,
    peer: SocketAddr,
    service: LaptopService<S>,
    config: ServerConfig,
    ctx: RequestContext,
) -> Result<(), ProtocolError> {
    debug!(%peer, "client connected");
    let (reader, writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(writer);

    loop {
        let frame = tokio::select! {
            _ = ctx.done() => return Ok(()),
            frame = read_frame(&mut reader) => frame?,
        };
        let Some(frame) = frame else {
            debug!(%peer, "client disconnected");
            return Ok(());
        };

        match frame.tag {
            OP_CREATE => handle_create(&mut writer, &frame.body, &service).await?,
            OP_FIND   => handle_find(&mut writer, &frame.body, &service).await?,
            OP_SEARCH => handle_search(&mut writer, &frame.body, &service, &config, &ctx).await?,
            _ => {
                warn!(%peer, "Unknown OpCode: 0x{:02X}", frame.tag);
                return Ok(());
            }
        }
        writer.flush().await?;
    }
}

async fn handle_create<W, S>(writer: &mut W, data: &[u8], service: &LaptopService<S>) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    S: LaptopStore,
{
    let req: CreateLaptopRequest = match serde_json::from_slice(data) {
        Ok(req) => req,
        Err(e) => {
            let message = format!("malformed create request: {e}");
            return write_error(writer, StatusCode::InvalidArgument, &message).await;
        }
    };

    match service.create_laptop(req).await {
        Ok(res) => write_json(writer, STATUS_OK, &res).await,
        Err(e) => write_error(writer, e.code(), &e.to_string()).await,
    }
}

async fn handle_find<W, S>(writer: &mut W, data: &[u8], service: &LaptopService<S>) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    S: LaptopStore,
{
    let req: FindLaptopRequest = match serde_json::from_slice(data) {
        Ok(req) => req,
        Err(e) => {
            let message = format!("malformed find request: {e}");
            return write_error(writer, StatusCode::InvalidArgument, &message).await;
        }
    };

    match service.find_laptop(&req.id).await {
        Ok(laptop) => write_json(writer, STATUS_OK, &FindLaptopResponse { laptop }).await,
        Err(e) => write_error(writer, e.code(), &e.to_string()).await,
    }
}

/// Stream results as ITEM frames, then END or ERROR.
///
/// The store feeds a bounded channel that this handler drains into the
/// socket, so a slow reader slows the search instead of growing a buffer.
async fn handle_search<W, S>(
    writer: &mut W,
    data: &[u8],
    service: &LaptopService<S>,
    config: &ServerConfig,
    conn_ctx: &RequestContext,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    S: LaptopStore,
{
    let req: SearchLaptopRequest = match serde_json::from_slice(data) {
        Ok(req) => req,
        Err(e) => {
            let message = format!("malformed search request: {e}");
            return write_error(writer, StatusCode::InvalidArgument, &message).await;
        }
    };

    let ctx = match config.search_timeout {
        Some(timeout) => conn_ctx.child_with_timeout(timeout),
        None => conn_ctx.child(),
    };

    let (tx, mut rx) = mpsc::channel(config.search_buffer.max(1));
    let produce = service.search_laptop(&ctx, req, tx);

    let out = &mut *writer;
    let forward = async move {
        while let Some(res) = rx.recv().await {
            write_json(out, STATUS_ITEM, &res).await?;
            out.flush().await?;
        }
        Ok::<_, ProtocolError>(())
    };

    let (produced, forwarded) = tokio::join!(produce, forward);

    // A failed write dropped the receiver, which already ended the search.
    forwarded?;

    match produced {
        Ok(()) => write_frame(writer, STATUS_END, &[]).await,
        Err(e) => write_error(writer, e.code(), &e.to_string()).await,
    }
}

fn is_disconnect(e: &ProtocolError) -> bool {
    use std::io::ErrorKind;

    matches!(
        e,
        ProtocolError::Io(io) if matches!(
            io.kind(),
            ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe | ErrorKind::ConnectionReset
        )
    )
}
