//! Resource Pool

use crate::error::*;
use std::any::type_name;
use std::ops::{Index, IndexMut};

/// Factory used to construct new pooled instances.
type Factory<T> = Box<dyn Fn() -> Result<T, String> + Send>;

/// Handle to an object checked out of a `ResourcePool`. Valid until the next
/// `reset()`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle(usize);

impl PoolHandle {
    /// Returns the slot index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A growable set of reusable instances of one type.
///
/// `get_object()` hands out the next unused instance, constructing more when
/// the pool runs dry. `reset()` makes every instance available again without
/// dropping or reinitializing it, so callers must overwrite any state they
/// read. Instances are boxed so their addresses stay fixed while the pool
/// grows.
///
/// Not shareable between threads; create one pool per worker.
pub struct ResourcePool<T> {
    /// Backing store. Every slot is constructed.
    objects: Vec<Box<T>>,

    /// Number of objects currently checked out.
    next: usize,

    /// Constructs new instances.
    factory: Factory<T>,
}

impl<T: Default + 'static> ResourcePool<T> {
    /// Returns a new pool that constructs instances with `T::default()`.
    ///
    /// * `capacity` - Number of instances to construct up front.
    pub fn new(capacity: usize) -> Self {
        let mut objects = Vec::with_capacity(capacity);
        objects.resize_with(capacity, || Box::new(T::default()));
        Self {
            objects,
            next: 0,
            factory: Box::new(|| Ok(T::default())),
        }
    }
}

impl<T> ResourcePool<T> {
    /// Returns a new, empty pool that constructs instances with `factory`.
    /// Nothing is constructed until the first `get_object()` so a failing
    /// factory is reported there.
    ///
    /// * `factory` - Constructs a new instance or describes why it cannot.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<T, String> + Send + 'static,
    {
        Self {
            objects: Vec::new(),
            next: 0,
            factory: Box::new(factory),
        }
    }

    /// Checks out the next unused instance, growing the pool if needed.
    pub fn get_object(&mut self) -> Result<PoolHandle, PoolError> {
        if self.next == self.objects.len() {
            self.grow()?;
        }
        let handle = PoolHandle(self.next);
        self.next += 1;
        Ok(handle)
    }

    /// Checks out the next unused instance and returns it directly.
    pub fn get_object_mut(&mut self) -> Result<&mut T, PoolError> {
        let handle = self.get_object()?;
        Ok(&mut self[handle])
    }

    /// Returns every checked out instance to the pool. Contents are left as
    /// they are.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Returns the number of instances currently checked out.
    pub fn in_use(&self) -> usize {
        self.next
    }

    /// Returns the number of constructed instances.
    pub fn capacity(&self) -> usize {
        self.objects.len()
    }

    /// Returns the instance for a handle, if it is currently checked out.
    ///
    /// * `handle` - The handle.
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if handle.0 < self.next {
            self.objects.get(handle.0).map(|b| b.as_ref())
        } else {
            None
        }
    }

    /// Doubles the store (plus one). New slots are constructed eagerly so a
    /// factory failure surfaces on the call that needed it.
    fn grow(&mut self) -> Result<(), PoolError> {
        let new_len = self.objects.len() * 2 + 1;
        self.objects.reserve(new_len - self.objects.len());
        while self.objects.len() < new_len {
            let object = (self.factory)().map_err(|message| PoolError::Construction {
                type_name: type_name::<T>(),
                message,
            })?;
            self.objects.push(Box::new(object));
        }
        Ok(())
    }
}

impl<T> Index<PoolHandle> for ResourcePool<T> {
    type Output = T;

    fn index(&self, handle: PoolHandle) -> &Self::Output {
        debug_assert!(handle.0 < self.next, "stale pool handle");
        &self.objects[handle.0]
    }
}

impl<T> IndexMut<PoolHandle> for ResourcePool<T> {
    fn index_mut(&mut self, handle: PoolHandle) -> &mut Self::Output {
        debug_assert!(handle.0 < self.next, "stale pool handle");
        &mut self.objects[handle.0]
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn addresses(pool: &mut ResourcePool<Vec<u8>>, n: usize) -> Vec<*const Vec<u8>> {
        (0..n)
            .map(|_| {
                let h = pool.get_object().unwrap();
                &pool[h] as *const Vec<u8>
            })
            .collect()
    }

    #[test]
    fn reset_reuses_same_instances_within_capacity() {
        let mut pool = ResourcePool::<Vec<u8>>::new(8);
        let first = addresses(&mut pool, 5);
        pool.reset();
        let second = addresses(&mut pool, 5);
        assert_eq!(first, second);
        assert_eq!(pool.capacity(), 8);
    }

    #[test]
    fn reset_reuses_same_instances_after_growth() {
        let mut pool = ResourcePool::<Vec<u8>>::new(2);
        let first = addresses(&mut pool, 40);
        assert!(pool.capacity() >= 40);
        let capacity = pool.capacity();
        pool.reset();
        let second = addresses(&mut pool, 40);
        assert_eq!(first, second);
        assert_eq!(pool.capacity(), capacity);
    }

    #[test]
    fn contents_survive_reset() {
        let mut pool = ResourcePool::<Vec<u8>>::new(1);
        pool.get_object_mut().unwrap().push(9);
        pool.reset();
        assert_eq!(pool.get_object_mut().unwrap(), &vec![9]);
    }

    #[test]
    fn growth_is_geometric() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let mut pool = ResourcePool::with_factory(move || {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(0u32)
        });
        for _ in 0..100 {
            pool.get_object().unwrap();
        }
        // 1, 3, 7, 15, 31, 63, 127
        assert_eq!(constructed.load(Ordering::Relaxed), 127);
        assert_eq!(pool.in_use(), 100);
    }

    #[test]
    fn factory_failure_surfaces_on_first_get() {
        let mut pool: ResourcePool<u32> = ResourcePool::with_factory(|| Err("no default".to_string()));
        match pool.get_object() {
            Err(PoolError::Construction { type_name, message }) => {
                assert_eq!(type_name, "u32");
                assert_eq!(message, "no default");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn get_rejects_unchecked_out_handles() {
        let mut pool = ResourcePool::<u8>::new(4);
        let h = pool.get_object().unwrap();
        assert!(pool.get(h).is_some());
        pool.reset();
        assert!(pool.get(h).is_none());
    }
}
