//! The endpoint-indexed map: an open-chaining hash table keyed by the raw
//! endpoint handle, sized to a power of two, used for membership tests and
//! for the invalidation sweep at the start of every `select`.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::handle::{hash_key, Handle};
use crate::monitor::Monitor;

const INITIAL_SIZE: usize = 8;
// "the positive integer range shifted right by one"
const MAX_SIZE: usize = (i32::MAX as usize) >> 1;

struct Node<T> {
    handle: Handle,
    monitor: Rc<Monitor<T>>,
    next: Option<Box<Node<T>>>,
}

pub(crate) struct EndpointMap<T> {
    buckets: Vec<Option<Box<Node<T>>>>,
    used: usize,
    mask: usize,
}

impl<T> EndpointMap<T> {
    pub(crate) fn new() -> EndpointMap<T> {
        EndpointMap {
            buckets: (0..INITIAL_SIZE).map(|_| None).collect(),
            used: 0,
            mask: INITIAL_SIZE - 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.used
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.used == 0
    }

    fn bucket_index(&self, handle: Handle) -> usize {
        hash_key(handle) & self.mask
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&Rc<Monitor<T>>> {
        let idx = self.bucket_index(handle);
        let mut node = self.buckets[idx].as_deref();
        while let Some(n) = node {
            if n.handle == handle {
                return Some(&n.monitor);
            }
            node = n.next.as_deref();
        }
        None
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Inserts a new monitor, or replaces the monitor of an existing entry
    /// with the same handle. Grows the table first if the load factor would
    /// exceed 1.
    pub(crate) fn insert(&mut self, handle: Handle, monitor: Rc<Monitor<T>>) -> Result<()> {
        self.grow_if_needed()?;

        let idx = self.bucket_index(handle);
        let mut node = self.buckets[idx].as_deref_mut();
        while let Some(n) = node {
            if n.handle == handle {
                n.monitor = monitor;
                return Ok(());
            }
            node = n.next.as_deref_mut();
        }

        let new_node = Box::new(Node {
            handle,
            monitor,
            next: self.buckets[idx].take(),
        });
        self.buckets[idx] = Some(new_node);
        self.used += 1;
        Ok(())
    }

    pub(crate) fn erase(&mut self, handle: Handle) -> Option<Rc<Monitor<T>>> {
        let idx = self.bucket_index(handle);
        let mut slot = &mut self.buckets[idx];

        loop {
            match slot {
                None => return None,
                Some(node) if node.handle == handle => {
                    let node = slot.take().unwrap();
                    *slot = node.next;
                    self.used -= 1;
                    return Some(node.monitor);
                }
                Some(node) => {
                    slot = &mut node.next;
                }
            }
        }
    }

    fn grow_if_needed(&mut self) -> Result<()> {
        if self.used < self.buckets.len() {
            return Ok(());
        }
        if self.buckets.len() >= MAX_SIZE {
            return Err(Error::AllocFailure);
        }
        let new_size = (self.buckets.len() * 2).min(MAX_SIZE);
        self.resize(new_size)
    }

    fn resize(&mut self, new_size: usize) -> Result<()> {
        let mut new_buckets: Vec<Option<Box<Node<T>>>> = (0..new_size).map(|_| None).collect();
        let new_mask = new_size - 1;

        for head in std::mem::take(&mut self.buckets) {
            let mut node = head;
            while let Some(mut n) = node {
                node = n.next.take();
                let idx = hash_key(n.handle) & new_mask;
                n.next = new_buckets[idx].take();
                new_buckets[idx] = Some(n);
            }
        }

        self.buckets = new_buckets;
        self.mask = new_mask;
        Ok(())
    }

    /// Iterates every (handle, monitor) pair. Bucket-then-chain order; not
    /// defined to callers.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Handle, &Rc<Monitor<T>>)> {
        self.buckets.iter().flatten().flat_map(|head| {
            let mut node = Some(head.as_ref());
            std::iter::from_fn(move || {
                let n = node?;
                node = n.next.as_deref();
                Some((n.handle, &n.monitor))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(endpoint: Handle) -> Rc<Monitor<()>> {
        Rc::new(Monitor::new(
            std::rc::Weak::new(),
            endpoint,
            crate::interest::Interest::NIL,
            (),
        ))
    }

    #[test]
    fn insert_get_erase_round_trip() {
        let mut map = EndpointMap::new();
        map.insert(3, monitor(3)).unwrap();
        assert!(map.contains(3));
        assert_eq!(map.get(3).unwrap().endpoint(), 3);
        let erased = map.erase(3).unwrap();
        assert_eq!(erased.endpoint(), 3);
        assert!(!map.contains(3));
    }

    #[test]
    fn replace_keeps_single_entry() {
        let mut map = EndpointMap::new();
        map.insert(5, monitor(5)).unwrap();
        map.insert(5, monitor(5)).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut map = EndpointMap::new();
        for fd in 0..9 {
            map.insert(fd, monitor(fd)).unwrap();
        }
        assert_eq!(map.len(), 9);
        assert_eq!(map.buckets.len(), 16);
        for fd in 0..9 {
            assert!(map.contains(fd), "missing fd {fd} after resize");
        }
    }

    #[test]
    fn iterates_all_entries() {
        let mut map = EndpointMap::new();
        for fd in 0..20 {
            map.insert(fd, monitor(fd)).unwrap();
        }
        let mut seen: Vec<Handle> = map.iter().map(|(h, _)| h).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }
}
