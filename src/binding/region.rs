use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Global region ID generator
static NEXT_REGION_ID: AtomicU64 = AtomicU64::new(0);

/// Bytes plus upload bookkeeping, guarded by one lock.
#[derive(Debug, Clone)]
pub(crate) struct RegionState {
    pub bytes: Vec<u8>,
    version: u64,
    should_upload: bool,
}

impl RegionState {
    /// Records that the bytes changed and must be re-uploaded.
    #[inline]
    pub fn mark_written(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.should_upload = true;
    }
}

/// The shared byte region of one buffer binding.
///
/// Cloning the handle shares the bytes; [`ByteRegion::duplicate`] deep-copies
/// them into a fresh region.
#[derive(Debug, Clone)]
pub struct ByteRegion {
    id: u64,
    label: Arc<str>,
    inner: Arc<RwLock<RegionState>>,
}

impl PartialEq for ByteRegion {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ByteRegion {}

impl std::hash::Hash for ByteRegion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl ByteRegion {
    /// Zero-filled region of `len` bytes.
    #[must_use]
    pub fn new(len: usize, label: &str) -> Self {
        Self::from_state(
            RegionState {
                bytes: vec![0; len],
                version: 0,
                should_upload: false,
            },
            label.into(),
        )
    }

    fn from_state(state: RegionState, label: Arc<str>) -> Self {
        Self {
            id: NEXT_REGION_ID.fetch_add(1, Ordering::Relaxed),
            label,
            inner: Arc::new(RwLock::new(state)),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bumped on every write that changed the bytes.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// `true` while the bytes hold changes the GPU copy has not seen.
    #[inline]
    #[must_use]
    pub fn should_upload(&self) -> bool {
        self.inner.read().should_upload
    }

    /// Called by the upload collaborator after a successful copy.
    #[inline]
    pub fn clear_should_upload(&self) {
        self.inner.write().should_upload = false;
    }

    /// Read-only view of the bytes. Hold it only for the duration of a copy.
    #[inline]
    pub fn bytes(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        RwLockReadGuard::map(self.inner.read(), |state| state.bytes.as_slice())
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RegionState> {
        self.inner.write()
    }

    /// Deep copy with a new identity; version and upload flag carry over.
    #[must_use]
    pub fn duplicate(&self, label: &str) -> Self {
        let state = self.inner.read().clone();
        Self::from_state(state, label.into())
    }

    /// Non-owning handle, used by offset children to reach their parent.
    #[must_use]
    pub fn downgrade(&self) -> WeakByteRegion {
        WeakByteRegion {
            id: self.id,
            label: Arc::clone(&self.label),
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Weak counterpart of [`ByteRegion`].
#[derive(Debug, Clone)]
pub struct WeakByteRegion {
    id: u64,
    label: Arc<str>,
    inner: Weak<RwLock<RegionState>>,
}

impl WeakByteRegion {
    /// `None` once every strong handle has been dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<ByteRegion> {
        self.inner.upgrade().map(|inner| ByteRegion {
            id: self.id,
            label: Arc::clone(&self.label),
            inner,
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}
