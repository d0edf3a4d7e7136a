//! Bounded pool of open backing images.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;
use tracing::debug;

use crate::{AuditError, ImageHandle, ImageOpener, OpenError};

/// Number of backing images kept open by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Open/evict counters of an [`ImageCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub opened: usize,
    pub evicted: usize,
}

/// LRU cache of open image handles keyed by backing file path.
///
/// Handles are only reachable inside [`ImageCache::with_image`]. When the
/// cache is full the least recently used handle is closed before the new
/// image is opened; dropping the cache closes everything still open.
pub struct ImageCache<O: ImageOpener> {
    opener: O,
    handles: LruCache<PathBuf, O::Handle>,
    stats: CacheStats,
}

impl<O: ImageOpener> ImageCache<O> {
    pub fn new(opener: O, capacity: usize) -> Result<Self, AuditError> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            AuditError::InvalidConfig("cache capacity must be at least 1".to_string())
        })?;
        Ok(Self {
            opener,
            handles: LruCache::new(capacity),
            stats: CacheStats::default(),
        })
    }

    /// Run `f` against the image at `path`, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns the opener's error when the image is not cached and cannot be
    /// opened. Nothing is cached in that case, though a full cache has
    /// already closed its least recently used handle.
    pub fn with_image<R, F>(&mut self, path: &Path, f: F) -> Result<R, OpenError>
    where
        F: FnOnce(&O::Handle) -> R,
    {
        if !self.handles.contains(path) {
            if self.handles.len() == self.capacity() {
                if let Some((evicted_path, mut evicted)) = self.handles.pop_lru() {
                    evicted.close();
                    self.stats.evicted += 1;
                    debug!(path = %evicted_path.display(), "evicted least recently used image");
                }
            }
            let handle = self.opener.open(path)?;
            self.stats.opened += 1;
            self.handles.put(path.to_path_buf(), handle);
        }

        match self.handles.get(path) {
            Some(handle) => Ok(f(handle)),
            None => Err(OpenError::Missing {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.handles.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl<O: ImageOpener> Drop for ImageCache<O> {
    fn drop(&mut self) {
        while let Some((_, mut handle)) = self.handles.pop_lru() {
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Capability;
    use cnet_core::FrameExtent;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records open/close events by file name.
    #[derive(Clone, Default)]
    struct Journal(Rc<RefCell<Vec<String>>>);

    impl Journal {
        fn events(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    struct FakeHandle {
        name: String,
        journal: Journal,
    }

    impl ImageHandle for FakeHandle {
        fn extent(&self) -> FrameExtent {
            FrameExtent::new(10, 10)
        }

        fn capability(&self) -> Capability<'_> {
            Capability::Unavailable(crate::ModelUnavailable::NoCameraModel)
        }

        fn close(&mut self) {
            self.journal.0.borrow_mut().push(format!("close {}", self.name));
        }
    }

    struct FakeOpener(Journal);

    impl ImageOpener for FakeOpener {
        type Handle = FakeHandle;

        fn open(&self, path: &Path) -> Result<FakeHandle, OpenError> {
            let name = path.display().to_string();
            if name.starts_with("missing") {
                return Err(OpenError::Missing {
                    path: path.to_path_buf(),
                });
            }
            self.0 .0.borrow_mut().push(format!("open {name}"));
            Ok(FakeHandle {
                name,
                journal: self.0.clone(),
            })
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(ImageCache::new(FakeOpener(Journal::default()), 0).is_err());
    }

    #[test]
    fn hits_do_not_reopen() {
        let journal = Journal::default();
        let mut cache = ImageCache::new(FakeOpener(journal.clone()), 2).unwrap();
        for _ in 0..3 {
            cache.with_image(Path::new("a"), |_| ()).unwrap();
        }
        assert_eq!(journal.events(), ["open a"]);
        assert_eq!(cache.stats(), CacheStats { opened: 1, evicted: 0 });
    }

    #[test]
    fn eviction_closes_least_recently_used() {
        let journal = Journal::default();
        let mut cache = ImageCache::new(FakeOpener(journal.clone()), 2).unwrap();
        cache.with_image(Path::new("a"), |_| ()).unwrap();
        cache.with_image(Path::new("b"), |_| ()).unwrap();
        cache.with_image(Path::new("a"), |_| ()).unwrap();
        cache.with_image(Path::new("c"), |_| ()).unwrap();

        assert_eq!(journal.events(), ["open a", "open b", "close b", "open c"]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evicted, 1);
    }

    #[test]
    fn drop_closes_remaining_handles() {
        let journal = Journal::default();
        {
            let mut cache = ImageCache::new(FakeOpener(journal.clone()), 4).unwrap();
            cache.with_image(Path::new("a"), |_| ()).unwrap();
            cache.with_image(Path::new("b"), |_| ()).unwrap();
        }
        let events = journal.events();
        assert!(events.contains(&"close a".to_string()));
        assert!(events.contains(&"close b".to_string()));
    }

    #[test]
    fn open_failure_leaves_cache_untouched() {
        let journal = Journal::default();
        let mut cache = ImageCache::new(FakeOpener(journal), 2).unwrap();
        let err = cache.with_image(Path::new("missing.json"), |_| ());
        assert!(matches!(err, Err(OpenError::Missing { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn open_handles_never_exceed_capacity() {
        let journal = Journal::default();
        {
            let mut cache = ImageCache::new(FakeOpener(journal.clone()), 3).unwrap();
            for name in ["a", "b", "c", "d", "a", "e", "b", "f", "c"] {
                cache.with_image(Path::new(name), |_| ()).unwrap();
                assert!(cache.len() <= cache.capacity());
            }
        }

        let mut live = 0usize;
        let mut peak = 0usize;
        for event in journal.events() {
            if event.starts_with("open") {
                live += 1;
            } else {
                live -= 1;
            }
            peak = peak.max(live);
        }
        assert_eq!(peak, 3);
        assert_eq!(live, 0);
    }
}
