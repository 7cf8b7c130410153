//! Operator input.
//!
//! Reading a terminal blocks, so lines are read on a dedicated thread and
//! handed to the session through a channel. The thread is detached: once
//! the session ends nobody waits for it, and it dies with the process.

use std::io::{self, BufRead};
use std::thread;

use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

type Tx = mpsc::UnboundedSender<io::Result<String>>;

/// Lines typed on stdin, without their terminator.
pub fn stdin_lines() -> io::Result<impl Stream<Item = io::Result<String>> + Unpin> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || forward_lines(io::stdin().lock(), tx))?;

    Ok(stream::poll_fn(move |cx| rx.poll_recv(cx)))
}

/// Sends every line of `reader` until it ends, fails, or nobody listens.
fn forward_lines<R: BufRead>(reader: R, tx: Tx) {
    for line in reader.lines() {
        let failed = line.is_err();
        if let Err(e) = &line {
            warn!("stdin read failed: {}", e);
        }
        if tx.send(line).is_err() {
            debug!("session gone, stopping stdin reader");
            return;
        }
        if failed {
            return;
        }
    }
    debug!("stdin closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_lines_without_terminators() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_lines(&b"hello\r\nworld\n"[..], tx);

        assert_eq!(rx.try_recv().unwrap().unwrap(), "hello");
        assert_eq!(rx.try_recv().unwrap().unwrap(), "world");
        // sender dropped once input ran out
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stops_after_the_first_read_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_lines(&b"\xff\xfe\nlater\n"[..], tx);

        assert!(rx.try_recv().unwrap().is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stops_when_the_receiver_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        forward_lines(&b"one\ntwo\n"[..], tx);
    }
}
