//! TCP transport.

use std::io;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::core::Transport;

/// Transport over a plain TCP connection.
///
/// `target` is a `host:port` address. There is no discovery process, so
/// [`Transport::cancel_discovery`] keeps its no-op default.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

impl Transport for TcpTransport {
    type Reader = BufReader<OwnedReadHalf>;
    type Writer = OwnedWriteHalf;

    async fn open(&self, target: &str) -> io::Result<(Self::Reader, Self::Writer)> {
        let stream = TcpStream::connect(target).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(%target, "tcp stream connected");
        let (read, write) = stream.into_split();
        Ok((BufReader::new(read), write))
    }
}
