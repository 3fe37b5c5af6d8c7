/// [`Pool`] configuration.
///
/// With the `serde` feature enabled this can be deserialized, e.g. from a
/// configuration file; missing fields fall back to [`PoolConfig::default()`].
///
/// [`Pool`]: super::Pool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Maximum number of objects the [`Pool`] keeps alive at once.
    ///
    /// A value of `0` yields a pool which never creates anything, so every
    /// [`Pool::acquire()`] waits until its context ends.
    ///
    /// [`Pool`]: super::Pool
    /// [`Pool::acquire()`]: super::Pool::acquire
    pub max_size: usize,
}

impl PoolConfig {
    /// Creates a new [`PoolConfig`] with the provided `max_size`.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Default for PoolConfig {
    /// Creates a new [`PoolConfig`] with the `max_size` being set to
    /// `cpu_count * 4` ignoring any logical CPUs (Hyper-Threading).
    fn default() -> Self {
        Self::new(num_cpus::get_physical() * 4)
    }
}
