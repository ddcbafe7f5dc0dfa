//! Single-slot memoization keyed on whatever invalidates the value.
//!
//! Lane packing and the minimap density summary depend only on the full
//! event set and the configuration, so they are keyed on
//! `(dataset version, config revision)` and survive every pan and zoom.

/// Holds at most one computed value together with the key it was built for.
#[derive(Debug)]
pub struct Memo<K, V> {
    name: &'static str,
    entry: Option<(K, V)>,
}

impl<K: PartialEq + std::fmt::Debug, V> Memo<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self { name, entry: None }
    }

    /// Return the cached value for `key`, computing it first when the key
    /// changed since the last call.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        let entry = match self.entry.take() {
            Some((cached, value)) if cached == key => (cached, value),
            _ => {
                log::debug!("recomputing {} for {:?}", self.name, key);
                let value = compute();
                (key, value)
            }
        };
        &self.entry.insert(entry).1
    }
}
