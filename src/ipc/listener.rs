//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"SnapFocused":{"subdivisions":true}}
//! {"MoveFocusedToZone":1}
//! {"Justify":"space-between"}
//! {"ApplyLayer":{"name":"Coding","animate":false}}
//! "TogglePin"
//! "Save"
//! ```
//!
//! From a shell: `echo '"NextLayer"' | socat - UNIX-CONNECT:$XDG_RUNTIME_DIR/zonetile.sock`.

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited JSON
/// commands.  When the connection closes, the listener waits for the
/// next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do after a connection has been drained.
enum Flow {
    Continue,
    SinkClosed,
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called
    /// and removed again when `run` returns.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forward every command sent over `stream` until it closes.
    fn serve(stream: UnixStream, sink: &mpsc::Sender<Command>) -> Flow {
        debug!("client connected");
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let text = match line {
                Ok(text) => text,
                Err(e) => {
                    error!("read error: {}", e);
                    break;
                }
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match serde_json::from_str::<Command>(text) {
                Ok(cmd) => {
                    debug!("received {:?}", cmd);
                    if sink.send(cmd).is_err() {
                        return Flow::SinkClosed;
                    }
                }
                Err(e) => warn!("ignoring bad command {:?}: {}", text, e),
            }
        }
        debug!("client disconnected");
        Flow::Continue
    }
}

/// Removes the socket file when dropped.
struct SocketFile<'a>(&'a Path);

impl Drop for SocketFile<'_> {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(self.0);
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the command sink is dropped.  Run it on
    /// a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        let _guard = SocketFile(&self.path);
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Flow::SinkClosed = Self::serve(stream, &sink) {
                        info!("sink closed, shutting down");
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Index;
    use crate::grid::JustifyType;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("zonetile-test-{}-{}.sock", std::process::id(), id))
    }

    /// Start a listener on a fresh path and send `lines` over one connection.
    fn send_lines(lines: &[&str]) -> Vec<Command> {
        let path = tmp_socket_path();
        let listen_path = path.clone();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&listen_path);
            let _ = listener.run(tx);
        });

        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            for line in lines {
                writeln!(stream, "{}", line).unwrap();
            }
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        rx.try_iter().collect()
    }

    #[test]
    fn commands_arrive_in_order() {
        let cmds = send_lines(&[
            r#"{"SnapFocused":{"subdivisions":true}}"#,
            r#"{"MoveFocusedToZone":"1"}"#,
            r#"  "Save"  "#,
        ]);
        assert_eq!(
            cmds,
            vec![
                Command::SnapFocused { subdivisions: true },
                Command::MoveFocusedToZone(Index(1)),
                Command::Save,
            ]
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let cmds = send_lines(&["not json at all", "", r#"{"Justify":"center"}"#, r#"{"Justify":"up"}"#]);
        assert_eq!(cmds, vec![Command::Justify(JustifyType::Center)]);
    }

    #[test]
    fn socket_file_is_removed_when_sink_closes() {
        let path = tmp_socket_path();
        let listen_path = path.clone();
        let (tx, rx) = mpsc::channel();
        drop(rx);

        let handle = std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&listen_path);
            listener.run(tx).is_ok()
        });
        std::thread::sleep(Duration::from_millis(150));
        assert!(path.exists());

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#""NextLayer""#).unwrap();
        }
        assert!(handle.join().unwrap());
        assert!(!path.exists());
    }
}
