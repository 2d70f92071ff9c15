//! End-to-end tests over a real socket.

mod common;

use std::collections::HashSet;
use std::net::SocketAddr;

use common::*;
use pcbook::client::LaptopClient;
use pcbook::protocol::{self, ProtocolError, OP_CREATE, STATUS_ERROR, STATUS_OK};
use pcbook::server::{LaptopServer, ServerConfig};
use pcbook::{RequestContext, StatusCode};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

/// Serves on an ephemeral port until the returned context is cancelled.
async fn spawn_server() -> (SocketAddr, RequestContext) {
    let config = ServerConfig { addr: "127.0.0.1:0".to_string(), ..ServerConfig::default() };
    let server = LaptopServer::new(new_service(), config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = RequestContext::new();
    let ctx = shutdown.clone();
    tokio::spawn(async move { server.serve(listener, ctx).await });

    (addr, shutdown)
}

#[tokio::test]
async fn create_then_find() {
    let (addr, shutdown) = spawn_server().await;
    let mut client = LaptopClient::connect(addr).await.unwrap();
    let laptop = strong_laptop();

    let id = client.create_laptop(laptop.clone()).await.unwrap();

    assert_eq!(id, laptop.id);
    assert_eq!(client.find_laptop(&id).await.unwrap(), Some(laptop));
    assert_eq!(client.find_laptop("missing").await.unwrap(), None);
    shutdown.cancel();
}

#[tokio::test]
async fn create_assigns_missing_ids() {
    let (addr, shutdown) = spawn_server().await;
    let mut client = LaptopClient::connect(addr).await.unwrap();

    let id = client.create_laptop(LaptopBuilder::new().without_id().build()).await.unwrap();

    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(client.find_laptop(&id).await.unwrap().is_some());
    shutdown.cancel();
}

#[tokio::test]
async fn create_errors_carry_status_codes() {
    let (addr, shutdown) = spawn_server().await;
    let mut client = LaptopClient::connect(addr).await.unwrap();
    let laptop = strong_laptop();
    client.create_laptop(laptop.clone()).await.unwrap();

    let dup = client.create_laptop(laptop).await.unwrap_err();
    assert_eq!(dup.code(), Some(StatusCode::AlreadyExists));

    let invalid = client.create_laptop(LaptopBuilder::new().id("abc").build()).await.unwrap_err();
    assert_eq!(invalid.code(), Some(StatusCode::InvalidArgument));

    // The connection survives failed requests
    assert!(client.create_laptop(strong_laptop()).await.is_ok());
    shutdown.cancel();
}

#[tokio::test]
async fn search_streams_matches_and_the_connection_is_reusable() {
    let (addr, shutdown) = spawn_server().await;
    let mut client = LaptopClient::connect(addr).await.unwrap();

    let mut expected = HashSet::new();
    for _ in 0..4 {
        expected.insert(client.create_laptop(strong_laptop()).await.unwrap());
    }
    client.create_laptop(low_ram_laptop()).await.unwrap();
    client.create_laptop(LaptopBuilder::new().build()).await.unwrap();

    let found = client.search_laptop(demo_filter()).await.unwrap().collect().await.unwrap();
    let ids: HashSet<_> = found.into_iter().map(|l| l.id).collect();
    assert_eq!(ids, expected);

    // A second search on the same connection
    let none = pcbook::Filter { max_price_usd: 1.0, ..demo_filter() };
    let found = client.search_laptop(none).await.unwrap().collect().await.unwrap();
    assert!(found.is_empty());

    let id = expected.iter().next().unwrap();
    assert!(client.find_laptop(id).await.unwrap().is_some());
    shutdown.cancel();
}

#[tokio::test]
async fn malformed_json_is_invalid_argument() {
    let (addr, shutdown) = spawn_server().await;
    let mut stream = BufStream::new(TcpStream::connect(addr).await.unwrap());

    protocol::write_frame(&mut stream, OP_CREATE, b"{not json").await.unwrap();
    stream.flush().await.unwrap();

    let frame = protocol::read_frame(&mut stream).await.unwrap().unwrap();
    assert_eq!(frame.tag, STATUS_ERROR);
    assert_eq!(frame.into_status_error().code(), Some(StatusCode::InvalidArgument));

    // Still usable afterwards
    let req = pcbook::model::CreateLaptopRequest { laptop: strong_laptop() };
    protocol::write_json(&mut stream, OP_CREATE, &req).await.unwrap();
    stream.flush().await.unwrap();
    let frame = protocol::read_frame(&mut stream).await.unwrap().unwrap();
    assert_eq!(frame.tag, STATUS_OK);
    shutdown.cancel();
}

#[tokio::test]
async fn unknown_opcode_closes_the_connection() {
    let (addr, shutdown) = spawn_server().await;
    let mut stream = BufStream::new(TcpStream::connect(addr).await.unwrap());

    protocol::write_frame(&mut stream, 0x7f, b"{}").await.unwrap();
    stream.flush().await.unwrap();

    assert!(protocol::read_frame(&mut stream).await.unwrap().is_none());
    shutdown.cancel();
}

#[tokio::test]
async fn oversized_frame_is_rejected_by_the_reader() {
    let (addr, shutdown) = spawn_server().await;
    let mut stream = BufStream::new(TcpStream::connect(addr).await.unwrap());

    let mut header = vec![OP_CREATE];
    header.extend_from_slice(&((protocol::MAX_PAYLOAD as u32) + 1).to_le_bytes());
    stream.write_all(&header).await.unwrap();
    stream.flush().await.unwrap();

    // The server drops the connection without answering
    let res = protocol::read_frame(&mut stream).await;
    assert!(matches!(res, Ok(None) | Err(ProtocolError::Io(_))), "{res:?}");
    shutdown.cancel();
}

#[tokio::test]
async fn laptop_too_large_to_return_is_refused_and_search_stays_complete() {
    let (addr, shutdown) = spawn_server().await;
    let mut stream = BufStream::new(TcpStream::connect(addr).await.unwrap());

    // Small on the wire, but every empty GPU expands with its defaults
    let body = serde_json::json!({
        "laptop": {
            "price_usd": 100.0,
            "cpu": { "number_cores": 8, "min_ghz": 3.0 },
            "ram": { "value": 16, "unit": "GIGABYTE" },
            "gpus": vec![serde_json::json!({}); 1000],
        }
    });
    let body = serde_json::to_vec(&body).unwrap();
    assert!(body.len() < protocol::MAX_PAYLOAD);

    protocol::write_frame(&mut stream, OP_CREATE, &body).await.unwrap();
    stream.flush().await.unwrap();
    let frame = protocol::read_frame(&mut stream).await.unwrap().unwrap();
    assert_eq!(frame.tag, STATUS_ERROR);
    assert_eq!(frame.into_status_error().code(), Some(StatusCode::InvalidArgument));

    let mut client = LaptopClient::connect(addr).await.unwrap();
    let id = client.create_laptop(strong_laptop()).await.unwrap();

    let found = client.search_laptop(demo_filter()).await.unwrap().collect().await.unwrap();
    let ids: Vec<_> = found.into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![id]);
    shutdown.cancel();
}

#[tokio::test]
async fn ids_are_unique_regardless_of_spelling() {
    let (addr, shutdown) = spawn_server().await;
    let mut client = LaptopClient::connect(addr).await.unwrap();
    let laptop = strong_laptop();

    let upper = laptop.id.to_uppercase();
    let stored = client.create_laptop(LaptopBuilder::new().id(upper).build()).await.unwrap();
    assert_eq!(stored, laptop.id);

    let dup = client.create_laptop(laptop).await.unwrap_err();
    assert_eq!(dup.code(), Some(StatusCode::AlreadyExists));
    shutdown.cancel();
}
