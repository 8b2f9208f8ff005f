// Copyright (C) Microsoft Corporation. All rights reserved.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::*;

/// Table of live objects keyed by handle.
///
/// Each object sits behind its own lock, so a call on one handle does not
/// block calls on another once the entry has been looked up.
pub(crate) struct HandleTable<T> {
    inner: Mutex<Entries<T>>,
}

struct Entries<T> {
    next: u32,
    objects: HashMap<u32, Arc<Mutex<T>>>,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Entries {
                next: 1,
                objects: HashMap::new(),
            }),
        }
    }
}

impl<T> HandleTable<T> {
    /// Stores `object` and returns its new handle.
    pub(crate) fn alloc_handle(&self, object: T) -> Result<CbHandle, CbError> {
        let mut entries = self.inner.lock();

        if entries.objects.len() >= u32::MAX as usize - 1 {
            Err(CbError::Fail)?;
        }

        // Skip zero and anything still in use after wrap-around.
        let mut handle = entries.next;
        while handle == 0 || entries.objects.contains_key(&handle) {
            handle = handle.wrapping_add(1);
        }
        entries.next = handle.wrapping_add(1);
        entries.objects.insert(handle, Arc::new(Mutex::new(object)));

        tracing::trace!(handle, "allocated handle");
        Ok(CbHandle(handle))
    }

    /// Looks up the object behind `handle`.
    pub(crate) fn get(&self, handle: CbHandle) -> Result<Arc<Mutex<T>>, CbError> {
        self.inner
            .lock()
            .objects
            .get(&*handle)
            .cloned()
            .ok_or(CbError::InvalidHandle)
    }

    /// Removes `handle`, returning its object if it was live.
    pub(crate) fn free_handle(&self, handle: CbHandle) -> Option<Arc<Mutex<T>>> {
        let object = self.inner.lock().objects.remove(&*handle);
        if object.is_some() {
            tracing::trace!(handle = *handle, "freed handle");
        }
        object
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }
}
