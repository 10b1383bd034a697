use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// Unix `sockaddr_un.sun_path` is 108 bytes on Linux, 104 on macOS and the BSDs.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

/// Device and inode of the socket file a listener created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SocketIdentity {
    dev: u64,
    ino: u64,
}

impl SocketIdentity {
    /// Identity of the socket currently at `path`, if there is one.
    fn at(path: &Path) -> Option<Self> {
        let metadata = fs::symlink_metadata(path).ok()?;
        metadata.file_type().is_socket().then(|| Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }
}

/// Server side of a domain socket transport, bound to a filesystem path.
///
/// Dropping it removes the socket file, but only if the file at the path is
/// still the one this listener created.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
    identity: Option<SocketIdentity>,
}

impl UnixDomainSocket {
    /// Owner read/write only.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// Bind `path` after clearing any stale entry left there by a previous
    /// run. A directory at `path` is an error and is left alone.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref();
        let len = path.as_os_str().len();
        if len >= MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path: path.to_path_buf(),
                len,
                max: MAX_PATH_LEN,
            });
        }
        clear_stale_entry(path)?;

        let listener = UnixListener::bind(path).map_err(|err| bind_error(path, err))?;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|err| bind_error(path, err))?;
        info!(path = %path.display(), mode = format_args!("{mode:o}"), "domain socket bound");

        Ok(Self {
            listener,
            path: path.to_path_buf(),
            identity: SocketIdentity::at(path),
        })
    }

    pub fn accept(&self) -> Result<IpcStream> {
        let (stream, _) = self.listener.accept().map_err(TransportError::Accept)?;
        Ok(IpcStream::from_unix(stream))
    }

    pub fn connect(path: impl AsRef<Path>) -> Result<IpcStream> {
        let path = path.as_ref();
        match UnixStream::connect(path) {
            Ok(stream) => {
                debug!(path = %path.display(), "domain socket connected");
                Ok(IpcStream::from_unix(stream))
            }
            Err(source) => Err(TransportError::Connect {
                address: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        let current = SocketIdentity::at(&self.path);
        if current.is_some() && current == self.identity {
            let _ = fs::remove_file(&self.path);
            debug!(path = %self.path.display(), "domain socket file removed");
        } else {
            debug!(path = %self.path.display(), "socket file replaced or gone; left in place");
        }
    }
}

/// Remove whatever non-directory entry occupies `path`.
fn clear_stale_entry(path: &Path) -> Result<()> {
    let file_type = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.file_type(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(bind_error(path, err)),
    };

    if file_type.is_dir() {
        let occupied = io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a directory occupies the socket path",
        );
        return Err(bind_error(path, occupied));
    }
    if file_type.is_socket() {
        debug!(path = %path.display(), "clearing stale socket");
    } else {
        warn!(path = %path.display(), "clearing non-socket file at socket path");
    }
    fs::remove_file(path).map_err(|err| bind_error(path, err))
}

fn bind_error(path: &Path, source: io::Error) -> TransportError {
    TransportError::Bind {
        address: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "nudock-uds-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).expect("scratch dir should be creatable");
        dir
    }

    #[test]
    fn bytes_flow_and_file_is_removed_on_drop() {
        let dir = scratch_dir("flow");
        let path = dir.join("flow.sock");
        let listener = UnixDomainSocket::bind(&path).expect("bind should succeed");

        let client_path = path.clone();
        let client = std::thread::spawn(move || {
            let mut stream = UnixDomainSocket::connect(&client_path).expect("connect");
            stream.write_all(b"nudock").expect("write");
        });

        let mut accepted = listener.accept().expect("accept");
        let mut buf = [0u8; 6];
        accepted.read_exact(&mut buf).expect("read");
        assert_eq!(&buf, b"nudock");
        client.join().expect("client thread should finish");

        drop(listener);
        assert!(!path.exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn overlong_path_is_refused() {
        let path = format!("/tmp/{}.sock", "n".repeat(200));
        assert!(matches!(
            UnixDomainSocket::bind(&path),
            Err(TransportError::PathTooLong { .. })
        ));
    }

    #[test]
    fn socket_mode_is_owner_only() {
        let dir = scratch_dir("mode");
        let path = dir.join("mode.sock");
        let _listener = UnixDomainSocket::bind(&path).expect("bind should succeed");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, UnixDomainSocket::DEFAULT_SOCKET_MODE);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_socket_and_leftover_file_are_cleared() {
        let dir = scratch_dir("stale");

        let socket_path = dir.join("old.sock");
        drop(UnixListener::bind(&socket_path).expect("raw bind"));
        assert!(socket_path.exists());
        let _first = UnixDomainSocket::bind(&socket_path).expect("rebind over stale socket");

        let file_path = dir.join("file.sock");
        fs::write(&file_path, b"leftover").expect("write leftover");
        let _second = UnixDomainSocket::bind(&file_path).expect("bind over leftover file");
        assert!(SocketIdentity::at(&file_path).is_some());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_is_never_cleared() {
        let dir = scratch_dir("dir");
        let path = dir.join("taken.sock");
        fs::create_dir_all(&path).expect("create dir");

        assert!(matches!(
            UnixDomainSocket::bind(&path),
            Err(TransportError::Bind { .. })
        ));
        assert!(path.is_dir());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn replaced_file_survives_drop() {
        let dir = scratch_dir("replaced");
        let path = dir.join("replaced.sock");
        let listener = UnixDomainSocket::bind(&path).expect("bind should succeed");

        fs::remove_file(&path).expect("remove");
        fs::write(&path, b"someone else").expect("replace");
        drop(listener);

        assert!(path.exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
