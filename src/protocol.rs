//! Wire framing shared by the server and the client.
//!
//! Every message is `[tag u8][length u32 LE][body]`. Requests carry an opcode
//! tag and a JSON body; responses carry a status tag:
//!
//! ```text
//! OK    -> JSON response object
//! ITEM  -> one JSON SearchLaptopResponse (search only, repeated)
//! END   -> empty, closes a search stream
//! ERROR -> [status code u8][utf-8 message]
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::StatusCode;

// --- OpCodes ---
pub const OP_CREATE: u8 = 0x01;
pub const OP_FIND: u8   = 0x02;
pub const OP_SEARCH: u8 = 0x03;

// --- Response status ---
pub const STATUS_OK: u8    = 0x00;
pub const STATUS_ITEM: u8  = 0x01;
pub const STATUS_END: u8   = 0x02;
pub const STATUS_ERROR: u8 = 0x03;

/// 64KB cap on a single body to prevent large-payload DoS.
pub const MAX_PAYLOAD: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload too large: {0} bytes (max {MAX_PAYLOAD})")]
    PayloadTooLarge(usize),

    #[error("unexpected frame tag 0x{0:02X}")]
    UnexpectedTag(u8),

    #[error("connection closed by peer")]
    Closed,

    #[error("{code}: {message}")]
    Status { code: StatusCode, message: String },
}

impl ProtocolError {
    /// Status code reported by the server, if this is a remote failure.
    pub fn code(&self) -> Option<StatusCode> {
        match self {
            ProtocolError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tag: u8,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn an ERROR frame body back into a status error.
    pub fn into_status_error(self) -> ProtocolError {
        let Some((&code, message)) = self.body.split_first() else {
            return ProtocolError::Status { code: StatusCode::Internal, message: String::new() };
        };

        ProtocolError::Status {
            code: StatusCode::from_u8(code).unwrap_or(StatusCode::Internal),
            message: String::from_utf8_lossy(message).into_owned(),
        }
    }
}

/// Read one frame. Returns `Ok(None)` if the peer closed the connection
/// cleanly before a new frame started.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    // 1. Tag
    let mut tag_buf = [0u8; 1];
    match reader.read_exact(&mut tag_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    // 2. Length
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let length = u32::from_le_bytes(len_buf) as usize;
    if length > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge(length));
    }

    // 3. Body
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    Ok(Some(Frame { tag: tag_buf[0], body }))
}

pub async fn write_frame<W>(writer: &mut W, tag: u8, body: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    if body.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge(body.len()));
    }

    writer.write_all(&[tag]).await?;
    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(body).await?;
    Ok(())
}

pub async fn write_json<W, T>(writer: &mut W, tag: u8, value: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(value)?;
    write_frame(writer, tag, &body).await
}

pub async fn write_error<W>(writer: &mut W, code: StatusCode, message: &str) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let mut body = Vec::with_capacity(1 + message.len());
    body.push(code.as_u8());
    body.extend_from_slice(message.as_bytes());
    body.truncate(MAX_PAYLOAD);
    write_frame(writer, STATUS_ERROR, &body).await
}
