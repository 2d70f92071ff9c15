use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::model::{
    CreateLaptopRequest, CreateLaptopResponse, Filter, FindLaptopRequest, FindLaptopResponse,
    Laptop, SearchLaptopRequest, SearchLaptopResponse,
};
use crate::protocol::{
    read_frame, write_json, Frame, ProtocolError, OP_CREATE, OP_FIND, OP_SEARCH, STATUS_END,
    STATUS_ERROR, STATUS_ITEM, STATUS_OK,
};

/// Client for a running laptop server. Requests on one client are sequential.
pub struct LaptopClient {
    stream: BufStream<TcpStream>,
}

impl LaptopClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self { stream: BufStream::new(stream) })
    }

    /// Returns the id the server stored the laptop under.
    pub async fn create_laptop(&mut self, laptop: Laptop) -> Result<String, ProtocolError> {
        self.send(OP_CREATE, &CreateLaptopRequest { laptop }).await?;
        let res: CreateLaptopResponse = self.expect_ok().await?;
        Ok(res.id)
    }

    pub async fn find_laptop(&mut self, id: &str) -> Result<Option<Laptop>, ProtocolError> {
        self.send(OP_FIND, &FindLaptopRequest { id: id.to_string() }).await?;
        let res: FindLaptopResponse = self.expect_ok().await?;
        Ok(res.laptop)
    }

    /// Start a search. The returned stream must be drained before the client
    /// is used again.
    pub async fn search_laptop(&mut self, filter: Filter) -> Result<SearchStream<'_>, ProtocolError> {
        self.send(OP_SEARCH, &SearchLaptopRequest { filter }).await?;
        Ok(SearchStream { client: self, finished: false })
    }

    async fn send<T: serde::Serialize>(&mut self, op: u8, req: &T) -> Result<(), ProtocolError> {
        write_json(&mut self.stream, op, req).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame, ProtocolError> {
        read_frame(&mut self.stream).await?.ok_or(ProtocolError::Closed)
    }

    async fn expect_ok<T: serde::de::DeserializeOwned>(&mut self) -> Result<T, ProtocolError> {
        let frame = self.next_frame().await?;
        match frame.tag {
            STATUS_OK => frame.json(),
            STATUS_ERROR => Err(frame.into_status_error()),
            tag => Err(ProtocolError::UnexpectedTag(tag)),
        }
    }
}

/// Results of one search, read off the connection as they arrive.
pub struct SearchStream<'a> {
    client: &'a mut LaptopClient,
    finished: bool,
}

impl SearchStream<'_> {
    /// Next result, or `Ok(None)` once the server closed the stream.
    pub async fn next(&mut self) -> Result<Option<Laptop>, ProtocolError> {
        if self.finished {
            return Ok(None);
        }

        let frame = self.client.next_frame().await;
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        match frame.tag {
            STATUS_ITEM => {
                let res: SearchLaptopResponse = frame.json()?;
                Ok(Some(res.laptop))
            }
            STATUS_END => {
                self.finished = true;
                Ok(None)
            }
            STATUS_ERROR => {
                self.finished = true;
                Err(frame.into_status_error())
            }
            tag => {
                self.finished = true;
                Err(ProtocolError::UnexpectedTag(tag))
            }
        }
    }

    pub async fn collect(mut self) -> Result<Vec<Laptop>, ProtocolError> {
        let mut laptops = Vec::new();
        while let Some(laptop) = self.next().await? {
            laptops.push(laptop);
        }
        Ok(laptops)
    }
}
