// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client and server talking over a loopback TCP listener

use remotefs_client::{ClientConfig, RemoteFs, TcpTransport};
use remotefs_core::types::{S_IFDIR, S_IFLNK, S_IFREG};
use remotefs_core::{
    Attr, Capabilities, Context, DataFile, DirEntry, File, FsError, FsResult, MemoryFs, Op,
    Owner, PathFs, snapshot,
};
use remotefs_server::{Listener, PathFsServer};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Read-only backend with a single "file.txt" whose content is its own name
struct HelloFs;

impl PathFs for HelloFs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::from_ops([Op::GetAttr, Op::OpenDir, Op::Open])
    }

    fn getattr(&self, name: &str, _ctx: Option<&Context>) -> FsResult<Attr> {
        match name {
            "file.txt" => Ok(Attr {
                mode: S_IFREG | 0o644,
                size: name.len() as u64,
                ..Default::default()
            }),
            "" => Ok(Attr {
                mode: S_IFDIR | 0o755,
                ..Default::default()
            }),
            _ => Err(FsError::NotFound),
        }
    }

    fn opendir(&self, name: &str, _ctx: Option<&Context>) -> FsResult<Vec<DirEntry>> {
        if name.is_empty() {
            Ok(vec![DirEntry::new("file.txt", S_IFREG)])
        } else {
            Err(FsError::NotFound)
        }
    }

    fn open(&self, name: &str, _flags: u32, _ctx: Option<&Context>) -> FsResult<Box<dyn File>> {
        if name == "file.txt" {
            Ok(Box::new(DataFile::new(name.as_bytes().to_vec())))
        } else {
            Err(FsError::NotFound)
        }
    }
}

fn serve(fs: Arc<dyn PathFs>) -> RemoteFs<TcpTransport> {
    let listener = Listener::bind("127.0.0.1:0", PathFsServer::new(fs)).unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = listener.spawn();
    let transport = TcpTransport::connect(ClientConfig::builder(addr.to_string()).build()).unwrap();
    RemoteFs::new(transport)
}

fn read_all(file: &dyn File) -> Vec<u8> {
    snapshot(file).unwrap()
}

#[test]
fn hello_listing_has_single_file() {
    let fs = serve(Arc::new(HelloFs));
    let entries = fs.opendir("", None).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "file.txt");
    assert_eq!(entries[0].mode & S_IFREG, S_IFREG);

    let file = fs.open("file.txt", 0, None).unwrap();
    assert_eq!(read_all(file.as_ref()), b"file.txt");
}

#[test]
fn hello_getattr_reports_exact_mode_and_size() {
    let fs = serve(Arc::new(HelloFs));
    let attr = fs.getattr("file.txt", None).unwrap();
    assert_eq!(attr.mode, S_IFREG | 0o644);
    assert_eq!(attr.size, 8);

    let root = fs.getattr("", None).unwrap();
    assert_eq!(root.mode, S_IFDIR | 0o755);

    assert_eq!(fs.getattr("missing", None), Err(FsError::NotFound));
}

#[test]
fn undeclared_create_is_not_implemented() {
    let fs = serve(Arc::new(HelloFs));
    assert!(matches!(
        fs.create("new.txt", 0, 0o644, None),
        Err(FsError::NotImplemented)
    ));
    assert_eq!(fs.unlink("file.txt", None), Err(FsError::NotImplemented));
    // Connection is still usable afterwards
    assert!(fs.getattr("file.txt", None).is_ok());
}

#[test]
fn diagnostics_are_no_ops_when_undeclared() {
    let fs = serve(Arc::new(HelloFs));
    assert_eq!(fs.identity().unwrap(), "");
    assert_eq!(fs.set_debug(true), Ok(()));
    assert_eq!(fs.statfs(""), Err(FsError::NotImplemented));
}

#[test]
fn opens_are_independent_snapshots() {
    let backend = Arc::new(MemoryFs::new());
    backend.write_file("data", b"version one").unwrap();
    let fs = serve(backend.clone());

    let first = fs.open("data", 0, None).unwrap();
    backend.write_file("data", b"version two").unwrap();
    let second = fs.open("data", 0, None).unwrap();

    assert_eq!(read_all(first.as_ref()), b"version one");
    assert_eq!(read_all(second.as_ref()), b"version two");

    backend.write_file("data", b"version one").unwrap();
    let third = fs.open("data", 0, None).unwrap();
    assert_eq!(read_all(third.as_ref()), read_all(first.as_ref()));
}

#[test]
fn memory_backend_full_surface() {
    let backend = Arc::new(MemoryFs::with_owner(Owner {
        uid: 1000,
        gid: 1000,
    }));
    let fs = serve(backend.clone());
    let ctx = Context {
        pid: 1,
        owner: Some(Owner { uid: 42, gid: 43 }),
    };

    fs.mkdir("dir", 0o750, Some(&ctx)).unwrap();
    let created = fs.create("dir/f", 0, 0o640, Some(&ctx)).unwrap();
    assert!(read_all(created.as_ref()).is_empty());
    assert_eq!(
        fs.getattr("dir/f", None).unwrap().owner,
        Owner { uid: 42, gid: 43 }
    );

    backend.write_file("dir/f", b"abcdef").unwrap();
    fs.truncate("dir/f", 3, None).unwrap();
    let file = fs.open("dir/f", 0, None).unwrap();
    assert_eq!(read_all(file.as_ref()), b"abc");

    fs.chmod("dir/f", 0o600, None).unwrap();
    fs.chown("dir/f", 7, 8, None).unwrap();
    let mtime = UNIX_EPOCH + Duration::new(1_600_000_000, 5);
    fs.utimens("dir/f", None, Some(mtime), None).unwrap();
    let attr = fs.getattr("dir/f", None).unwrap();
    assert_eq!(attr.mode, S_IFREG | 0o600);
    assert_eq!(attr.owner, Owner { uid: 7, gid: 8 });
    assert_eq!(attr.mtime(), mtime);

    let other = Context {
        pid: 2,
        owner: Some(Owner {
            uid: 999,
            gid: 999,
        }),
    };
    assert_eq!(fs.access("dir/f", 4, Some(&other)), Err(FsError::AccessDenied));
    assert_eq!(fs.access("dir/f", 4, None), Ok(()));

    fs.setxattr("dir/f", "user.tag", b"blue", 0, None).unwrap();
    assert_eq!(fs.getxattr("dir/f", "user.tag", None).unwrap(), b"blue");
    assert_eq!(fs.listxattr("dir/f", None).unwrap(), vec!["user.tag"]);
    fs.removexattr("dir/f", "user.tag", None).unwrap();
    assert_eq!(fs.getxattr("dir/f", "user.tag", None), Err(FsError::NoData));

    fs.symlink("dir/f", "link", None).unwrap();
    assert_eq!(fs.readlink("link", None).unwrap(), "dir/f");
    assert_eq!(fs.getattr("link", None).unwrap().file_type(), S_IFLNK);

    fs.mknod("dir/fifo", 0o010644, 0, None).unwrap();
    fs.rename("dir/f", "dir/g", None).unwrap();
    let names: Vec<String> = fs
        .opendir("dir", None)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["fifo", "g"]);

    assert_eq!(fs.link("dir/g", "dir/h", None), Err(FsError::NotImplemented));
    assert_eq!(fs.rmdir("dir", None), Err(FsError::NotEmpty));
    fs.unlink("dir/g", None).unwrap();
    fs.unlink("dir/fifo", None).unwrap();
    fs.rmdir("dir", None).unwrap();

    let stats = fs.statfs("").unwrap().unwrap();
    assert_eq!(stats.name_len, 255);
    assert_eq!(fs.identity().unwrap(), "memoryfs");
    fs.set_debug(true).unwrap();
    assert!(backend.debug_enabled());
}

#[test]
fn concurrent_calls_do_not_serialise() {
    let backend = Arc::new(MemoryFs::new());
    for i in 0..8 {
        backend
            .write_file(&format!("f{}", i), format!("content {}", i).as_bytes())
            .unwrap();
    }
    let fs = Arc::new(serve(backend));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let fs = fs.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let file = fs.open(&format!("f{}", i), 0, None).unwrap();
                    assert_eq!(
                        snapshot(file.as_ref()).unwrap(),
                        format!("content {}", i).as_bytes()
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(fs.transport().idle_connections() >= 1);
}

#[test]
fn timestamps_before_epoch_travel_signed() {
    struct Recorder(std::sync::Mutex<Option<SystemTime>>);
    impl PathFs for Recorder {
        fn capabilities(&self) -> Capabilities {
            Capabilities::none().with(Op::Utimens)
        }
        fn utimens(
            &self,
            _name: &str,
            atime: Option<SystemTime>,
            _mtime: Option<SystemTime>,
            _ctx: Option<&Context>,
        ) -> FsResult<()> {
            *self.0.lock().unwrap() = atime;
            Ok(())
        }
    }

    let recorder = Arc::new(Recorder(std::sync::Mutex::new(None)));
    let fs = serve(recorder.clone());
    let t = UNIX_EPOCH - Duration::new(10, 250);
    fs.utimens("f", Some(t), None, None).unwrap();
    assert_eq!(*recorder.0.lock().unwrap(), Some(t));
}

#[test]
fn dropped_server_connection_surfaces_as_io() {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });
    let fs = RemoteFs::new(
        TcpTransport::connect(ClientConfig::builder(addr.to_string()).build()).unwrap(),
    );
    server.join().unwrap();
    assert_eq!(fs.getattr("file.txt", None), Err(FsError::Io));
}

#[test]
fn file_larger_than_a_frame_reports_range_not_io() {
    let fs = serve(Arc::new(MemoryFs::new()));
    fs.create("big", 0, 0o644, None).unwrap();
    fs.truncate("big", 70 * 1024 * 1024, None).unwrap();

    assert!(matches!(fs.open("big", 0, None), Err(FsError::Range)));
    // the connection survives and keeps answering
    assert_eq!(fs.getattr("big", None).unwrap().size, 70 * 1024 * 1024);
}

#[test]
fn listener_keeps_serving_after_a_broken_connection() {
    use std::io::Write;
    use std::net::TcpStream;

    let listener = Listener::bind("127.0.0.1:0", PathFsServer::new(Arc::new(HelloFs))).unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = listener.spawn();

    // a frame header promising far more than the limit, then a hang-up
    let mut rogue = TcpStream::connect(addr).unwrap();
    rogue.write_all(&u32::MAX.to_le_bytes()).unwrap();
    drop(rogue);

    let fs = RemoteFs::new(
        TcpTransport::connect(ClientConfig::builder(addr.to_string()).build()).unwrap(),
    );
    let entries = fs.opendir("", None).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "file.txt");
}
