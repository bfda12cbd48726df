use std::fmt::{self, Display, Formatter};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Size of the copy buffer used by each relay direction.
pub const RELAY_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// client -> backend
    Upstream,
    /// backend -> client
    Downstream,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upstream => f.write_str("客户端到目标"),
            Direction::Downstream => f.write_str("目标到客户端"),
        }
    }
}

/// What a finished bridge moved, and which side stopped first.
#[derive(Debug, Clone, Copy)]
pub struct BridgeStats {
    pub upstream: u64,
    pub downstream: u64,
    /// `None` only if both relay tasks died without reporting
    pub first_closed: Option<Direction>,
}

/// Relays bytes between `front` and `back` until either direction stops.
///
/// Each direction runs as its own task and reports on a shared channel when
/// it ends. The first report starts teardown: the other task is aborted,
/// which drops its halves and closes both streams. The function then waits
/// for both tasks to be gone before returning.
pub async fn bridge<F, B>(front: F, back: B) -> BridgeStats
where
    F: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let (front_read, front_write) = tokio::io::split(front);
    let (back_read, back_write) = tokio::io::split(back);

    let upstream_bytes = Arc::new(AtomicU64::new(0));
    let downstream_bytes = Arc::new(AtomicU64::new(0));
    let (done_tx, mut done_rx) = mpsc::channel(2);

    let upstream = tokio::spawn(relay(
        front_read,
        back_write,
        Direction::Upstream,
        Arc::clone(&upstream_bytes),
        done_tx.clone(),
    ));
    let downstream = tokio::spawn(relay(
        back_read,
        front_write,
        Direction::Downstream,
        Arc::clone(&downstream_bytes),
        done_tx,
    ));

    // 任一方向结束即开始拆除
    let first_closed = done_rx.recv().await;
    if let Some(direction) = first_closed {
        debug!("{}的数据传输先结束", direction);
    }
    upstream.abort();
    downstream.abort();

    // 确认两个方向都已退出
    for (direction, handle) in [
        (Direction::Upstream, upstream),
        (Direction::Downstream, downstream),
    ] {
        if let Err(e) = handle.await {
            if e.is_panic() {
                error!("{}的转发任务崩溃: {}", direction, e);
            }
        }
    }

    BridgeStats {
        upstream: upstream_bytes.load(Ordering::Relaxed),
        downstream: downstream_bytes.load(Ordering::Relaxed),
        first_closed,
    }
}

async fn relay<R, W>(
    mut reader: R,
    mut writer: W,
    direction: Direction,
    transferred: Arc<AtomicU64>,
    done: mpsc::Sender<Direction>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; RELAY_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                log_relay_error(direction, "读取", &e);
                break;
            }
        };
        if let Err(e) = writer.write_all(&buf[..n]).await {
            log_relay_error(direction, "写入", &e);
            break;
        }
        transferred.fetch_add(n as u64, Ordering::Relaxed);
    }

    // 容量为 2, 不会阻塞
    let _ = done.send(direction).await;
}

/// Errors a socket reports once its peer or the session has already closed
/// it. These are the normal way a relay direction ends during teardown.
fn is_closed(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}

fn log_relay_error(direction: Direction, op: &str, err: &io::Error) {
    if is_closed(err) {
        debug!("{}{}时连接已关闭: {}", direction, op, err);
    } else {
        warn!("{}{}出错: {}", direction, op, err);
    }
}
