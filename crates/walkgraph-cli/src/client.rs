//! Minimal protocol client over one TCP connection.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::net::TcpStream;
use tokio::time::timeout;

use walkgraph_service_shared::codec::decode_json;
use walkgraph_service_shared::{read_frame, write_json, Request, Response, DEFAULT_MAX_FRAME_BYTES};

/// A connected client. Requests are answered in the order they are sent.
#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    timeout: Duration,
}

impl Client {
    /// Connect to a service at `addr` (`host:port`).
    pub async fn connect(addr: &str, request_timeout: Duration) -> Result<Self> {
        let stream = timeout(request_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| anyhow!("timed out connecting to {addr}"))?
            .with_context(|| format!("failed to connect to {addr}"))?;
        stream.set_nodelay(true).ok();
        Ok(Self {
            stream,
            timeout: request_timeout,
        })
    }

    /// Send one request and wait for its reply.
    pub async fn send(&mut self, request: &Request) -> Result<Response> {
        let kind = request.kind();
        timeout(self.timeout, self.round_trip(request))
            .await
            .map_err(|_| anyhow!("timed out waiting for the {kind} reply"))?
            .with_context(|| format!("{kind} request failed"))
    }

    async fn round_trip(&mut self, request: &Request) -> Result<Response> {
        write_json(&mut self.stream, request).await?;
        let payload = read_frame(&mut self.stream, DEFAULT_MAX_FRAME_BYTES)
            .await?
            .ok_or_else(|| anyhow!("service closed the connection"))?;
        Ok(decode_json(&payload)?)
    }
}
