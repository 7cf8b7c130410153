use std::future::Future;
use std::io;
use std::pin::Pin;

use futures::sink::SinkExt;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{FramedWrite, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::decode::TextDecoder;
use crate::error::{ClientError, Result};

/// Outcome of one receive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Received,
    RemoteClosed,
}

/// How a session ended. Every variant is terminal.
#[derive(Debug)]
pub enum SessionEnd {
    ClosedByRemote,
    /// The operator interrupted or ran out of input.
    ClosedByInterrupt,
    ClosedByError(ClientError),
}

impl SessionEnd {
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionEnd::ClosedByRemote | SessionEnd::ClosedByInterrupt => 0,
            SessionEnd::ClosedByError(_) => 1,
        }
    }
}

/// An open connection to the remote endpoint.
///
/// The socket is closed when the session is dropped.
pub struct Session {
    peer: String,
    reader: OwnedReadHalf,
    writer: FramedWrite<OwnedWriteHalf, LinesCodec>,
    buffer: Vec<u8>,
    decoder: TextDecoder,
}

impl Session {
    pub async fn connect(config: &Config) -> Result<Session> {
        let addr = config.addr();
        debug!("connecting to {}", addr);

        let connect = TcpStream::connect((config.host.as_str(), config.port));
        let stream = match timeout(config.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ClientError::Connect { addr, source }),
            Err(_) => {
                return Err(ClientError::ConnectTimeout {
                    addr,
                    timeout: config.connect_timeout,
                })
            }
        };

        info!("connected to {}", addr);
        let (reader, writer) = stream.into_split();

        Ok(Session {
            peer: addr,
            reader,
            writer: FramedWrite::new(writer, LinesCodec::new()),
            buffer: vec![0; config.chunk_size],
            decoder: TextDecoder::new(),
        })
    }

    /// Performs one bounded read and shows whatever arrived.
    ///
    /// Undecodable bytes are shown replaced and then returned as a
    /// `ClientError::Decode`; the connection is still usable afterwards.
    /// A code point cut off by the remote closing is reported here, since
    /// no later step will see it.
    pub async fn receive<O>(&mut self, out: &mut O) -> Result<Step>
    where
        O: AsyncWrite + Unpin,
    {
        let n = self
            .reader
            .read(&mut self.buffer)
            .await
            .map_err(ClientError::Receive)?;

        let decoded = if n == 0 {
            self.decoder.finish()
        } else {
            debug!(bytes = n, "received");
            self.decoder.decode(&self.buffer[..n])
        };
        if !decoded.text.is_empty() {
            out.write_all(decoded.text.as_bytes())
                .await
                .map_err(ClientError::Output)?;
            out.flush().await.map_err(ClientError::Output)?;
        }

        match (n, decoded.error) {
            (0, Some(e)) => {
                let e = ClientError::from(e);
                warn!("{}", e);
                report(out, "[-] error: ", &e.to_string()).await;
                Ok(Step::RemoteClosed)
            }
            (0, None) => Ok(Step::RemoteClosed),
            (_, Some(e)) => Err(e.into()),
            (_, None) => Ok(Step::Received),
        }
    }

    /// Sends `line` followed by a single `\n`.
    pub async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.send(line).await?;
        debug!(bytes = line.len() + 1, "sent");
        Ok(())
    }

    async fn drive<S, O, F>(
        mut self,
        input: &mut S,
        out: &mut O,
        mut interrupt: Pin<&mut F>,
    ) -> SessionEnd
    where
        S: Stream<Item = io::Result<String>> + Unpin,
        O: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        loop {
            let step = tokio::select! {
                biased;
                _ = interrupt.as_mut() => return SessionEnd::ClosedByInterrupt,
                step = self.receive(out) => step,
            };
            match step {
                Ok(Step::Received) => {}
                Ok(Step::RemoteClosed) => return SessionEnd::ClosedByRemote,
                Err(e) if e.is_recoverable() => {
                    warn!("{}", e);
                    report(out, "[-] error: ", &e.to_string()).await;
                }
                Err(e) => return SessionEnd::ClosedByError(e),
            }

            let line = tokio::select! {
                biased;
                _ = interrupt.as_mut() => return SessionEnd::ClosedByInterrupt,
                line = input.next() => line,
            };
            let line = match line {
                Some(Ok(line)) => line,
                Some(Err(e)) => return SessionEnd::ClosedByError(ClientError::Input(e)),
                None => {
                    debug!("input ended");
                    return SessionEnd::ClosedByInterrupt;
                }
            };

            let sent = tokio::select! {
                biased;
                _ = interrupt.as_mut() => return SessionEnd::ClosedByInterrupt,
                sent = self.send(&line) => sent,
            };
            if let Err(e) = sent {
                return SessionEnd::ClosedByError(e);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("closing connection to {}", self.peer);
    }
}

/// Connects to `config` and alternates between showing what the server
/// sent and sending one line of `input`, until the server closes, an
/// error ends the session, input runs out or `interrupt` resolves.
///
/// Status lines are written to `out` alongside the relayed text. The
/// connection is released before this returns.
pub async fn run<S, O, F>(config: &Config, mut input: S, out: &mut O, interrupt: F) -> SessionEnd
where
    S: Stream<Item = io::Result<String>> + Unpin,
    O: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    let connected = tokio::select! {
        biased;
        _ = interrupt.as_mut() => None,
        connected = Session::connect(config) => Some(connected),
    };

    let end = match connected {
        None => SessionEnd::ClosedByInterrupt,
        Some(Err(e)) => SessionEnd::ClosedByError(e),
        Some(Ok(session)) => {
            report(out, "[+] connected to ", &config.addr()).await;
            session.drive(&mut input, out, interrupt.as_mut()).await
        }
    };

    match &end {
        SessionEnd::ClosedByRemote => {
            info!("connection closed by server");
            report(out, "[-] ", "connection closed by server").await;
        }
        SessionEnd::ClosedByInterrupt => {
            info!("disconnected");
            report(out, "\n[!] ", "disconnected").await;
        }
        SessionEnd::ClosedByError(e) => {
            error!("{}", e);
            report(out, "[-] error: ", &e.to_string()).await;
        }
    }
    end
}

async fn report<O>(out: &mut O, prefix: &str, message: &str)
where
    O: AsyncWrite + Unpin,
{
    let line = format!("{}{}\n", prefix, message);
    let written = async {
        out.write_all(line.as_bytes()).await?;
        out.flush().await
    };
    if let Err(e) = written.await {
        warn!("failed to write status line: {}", e);
    }
}
