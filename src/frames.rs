use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

/// Ordered frame files of one animation. Shared so the cache can drop its
/// copy without pulling the clip out from under the player.
pub type Clip = Arc<[PathBuf]>;

/// Upper bound on frames per clip (`000.png` .. `999.png`).
const MAX_FRAMES: usize = 1000;

/// Resolves an animation path key to its frames.
pub trait FrameSource {
    /// All frames for `key`, in order. Empty when the animation does not exist.
    fn resolve(&mut self, key: &str) -> Clip;

    /// A single fixed frame, if it exists.
    fn still(&mut self, key: &str, index: usize) -> Option<PathBuf>;

    /// Periodic maintenance hook (cache eviction).
    fn housekeep(&mut self) {}
}

pub fn frame_file(root: &Path, key: &str, index: usize) -> PathBuf {
    root.join(key).join(format!("{index:03}.png"))
}

pub fn empty_clip() -> Clip {
    Arc::from(Vec::new())
}

/// A frame is usable only if its image header decodes.
fn is_decodable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let dims = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::from)
        .and_then(|reader| reader.into_dimensions());
    match dims {
        Ok(_) => true,
        Err(e) => {
            log::debug!("Unreadable frame {}: {e}", path.display());
            false
        }
    }
}

/// Reads `root/<key>/000.png, 001.png, ...` and stops at the first gap or
/// the first frame that does not decode.
pub struct DirFrameSource {
    root: PathBuf,
}

impl DirFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FrameSource for DirFrameSource {
    fn resolve(&mut self, key: &str) -> Clip {
        if key.is_empty() {
            return empty_clip();
        }
        let frames: Vec<PathBuf> = (0..MAX_FRAMES)
            .map(|i| frame_file(&self.root, key, i))
            .take_while(|p| is_decodable(p))
            .collect();
        Arc::from(frames)
    }

    fn still(&mut self, key: &str, index: usize) -> Option<PathBuf> {
        let path = frame_file(&self.root, key, index);
        is_decodable(&path).then_some(path)
    }
}

struct CacheEntry {
    clip: Clip,
    used: bool,
}

/// Memoising wrapper. Entries unused between two `housekeep` passes are
/// dropped.
pub struct FrameCache<S> {
    inner: S,
    entries: HashMap<String, CacheEntry>,
}

impl<S: FrameSource> FrameCache<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: HashMap::new(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl<S: FrameSource> FrameSource for FrameCache<S> {
    fn resolve(&mut self, key: &str) -> Clip {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.used = true;
            return entry.clip.clone();
        }
        let clip = self.inner.resolve(key);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                clip: clip.clone(),
                used: true,
            },
        );
        clip
    }

    fn still(&mut self, key: &str, index: usize) -> Option<PathBuf> {
        if let Some(entry) = self.entries.get(key) {
            return entry.clip.get(index).cloned();
        }
        self.inner.still(key, index)
    }

    fn housekeep(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, e| std::mem::replace(&mut e.used, false));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("Frame cache: evicted {} clips, {} kept", evicted, self.entries.len());
        }
    }
}

/// Totals from a pre-cache pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    pub clips: usize,
    pub frames: usize,
}

/// How often to log pre-cache progress (clips).
const PRECACHE_LOG_EVERY: usize = 10;

/// Warm `cache` with every animation directory under `root` (any directory
/// holding a `000.png`).
pub fn precache<S: FrameSource>(root: &Path, cache: &mut FrameCache<S>) -> PrecacheReport {
    let mut report = PrecacheReport::default();
    if !root.is_dir() {
        log::warn!("Assets folder not found at {}", root.display());
        return report;
    }

    let keys: Vec<String> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == "000.png")
        .filter_map(|e| clip_key(root, e.path()))
        .collect();

    log::info!("Pre-caching {} animations from {}", keys.len(), root.display());

    for key in &keys {
        let clip = cache.resolve(key);
        report.clips += 1;
        report.frames += clip.len();
        if report.clips % PRECACHE_LOG_EVERY == 0 {
            log::info!("Caching: {} ({}/{})", key, report.clips, keys.len());
        }
    }

    log::info!(
        "Pre-cache complete: {} clips, {} frames",
        report.clips,
        report.frames
    );
    report
}

/// `root/a/b/000.png` -> `a/b`, always with forward slashes.
fn clip_key(root: &Path, first_frame: &Path) -> Option<String> {
    let dir = first_frame.parent()?.strip_prefix(root).ok()?;
    let parts: Vec<_> = dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
