use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

/// Registration returned by [`FileWatch::watch`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WatchHandle(pub(crate) usize);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot resolve watched file {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has no file name")]
    NotAFile { path: PathBuf },

    #[error("file watcher: {0}")]
    Notify(#[from] notify::Error),
}

/// Source of "has this file changed since I last asked" answers.
pub trait FileWatch {
    fn watch(&mut self, path: &Path) -> Result<WatchHandle, WatchError>;

    /// True once per batch of modifications; reading the flag clears it.
    fn changed(&mut self, handle: WatchHandle) -> bool;
}

struct Watched {
    dir: PathBuf,
    name: OsString,
    dirty: bool,
}

/// [`FileWatch`] backed by the platform's native watcher.
///
/// The parent directory is watched rather than the file itself so editors that
/// save by writing a new file and renaming it over the old one are still seen.
pub struct NotifyWatch {
    watcher: RecommendedWatcher,
    events: mpsc::Receiver<notify::Event>,
    files: Vec<Watched>,
}

impl NotifyWatch {
    pub fn new() -> Result<Self, WatchError> {
        let (tx, events) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => log::warn!("file watcher error: {e}"),
            }
        })?;

        Ok(Self {
            watcher,
            events,
            files: Vec::new(),
        })
    }

    fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                continue;
            }
            for path in &event.paths {
                for file in self.files.iter_mut() {
                    if path.file_name() == Some(file.name.as_os_str())
                        && path.parent() == Some(file.dir.as_path())
                    {
                        file.dirty = true;
                    }
                }
            }
        }
    }
}

impl FileWatch for NotifyWatch {
    fn watch(&mut self, path: &Path) -> Result<WatchHandle, WatchError> {
        let path = path.canonicalize().map_err(|source| WatchError::Resolve {
            path: path.to_path_buf(),
            source,
        })?;
        let (Some(dir), Some(name)) = (
            path.parent().map(Path::to_path_buf),
            path.file_name().map(OsStr::to_os_string),
        ) else {
            return Err(WatchError::NotAFile { path });
        };

        if !self.files.iter().any(|f| f.dir == dir) {
            self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }
        log::info!("watching {} for changes", path.display());

        self.files.push(Watched {
            dir,
            name,
            dirty: false,
        });
        Ok(WatchHandle(self.files.len() - 1))
    }

    fn changed(&mut self, handle: WatchHandle) -> bool {
        self.drain();
        match self.files.get_mut(handle.0) {
            Some(file) => std::mem::take(&mut file.dirty),
            None => false,
        }
    }
}

/// Per-frame recompile signal for the shader source file.
///
/// Polled by the renderer between frames only, never from a callback, so a
/// recompile cannot land in the middle of a draw sequence.
pub struct ShaderHotReload {
    watch: Box<dyn FileWatch>,
    handle: WatchHandle,
}

impl ShaderHotReload {
    pub fn new(mut watch: Box<dyn FileWatch>, path: &Path) -> Result<Self, WatchError> {
        let handle = watch.watch(path)?;
        Ok(Self { watch, handle })
    }

    /// Watches `path` with the native watcher.
    pub fn for_file(path: &Path) -> Result<Self, WatchError> {
        Self::new(Box::new(NotifyWatch::new()?), path)
    }

    pub fn poll(&mut self) -> bool {
        self.watch.changed(self.handle)
    }
}
