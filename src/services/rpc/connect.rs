//! Local Channel
//!
//! Opens the local duplex channel the streaming application listens on: a
//! named pipe on Windows, a Unix domain socket elsewhere.

use std::io;

#[cfg(unix)]
pub type LocalStream = tokio::net::UnixStream;

#[cfg(windows)]
pub type LocalStream = tokio::net::windows::named_pipe::NamedPipeClient;

/// Default endpoint of the streaming application's control channel.
#[cfg(unix)]
pub const DEFAULT_ENDPOINT: &str = "/tmp/slobs.sock";

#[cfg(windows)]
pub const DEFAULT_ENDPOINT: &str = r"\\.\pipe\slobs";

/// Open the channel at `endpoint`.
#[cfg(unix)]
pub async fn open(endpoint: &str) -> io::Result<LocalStream> {
    tokio::net::UnixStream::connect(endpoint).await
}

/// Open the pipe at `endpoint`, waiting while every pipe instance is busy.
///
/// The caller bounds the total wait with its connect timeout.
#[cfg(windows)]
pub async fn open(endpoint: &str) -> io::Result<LocalStream> {
    use tokio::net::windows::named_pipe::ClientOptions;
    use tokio::time::{sleep, Duration};

    const ERROR_PIPE_BUSY: i32 = 231;

    loop {
        match ClientOptions::new().open(endpoint) {
            Ok(client) => return Ok(client),
            Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                sleep(Duration::from_millis(50)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
