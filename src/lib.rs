#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]
#![warn(clippy::pedantic)]
#![warn(
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
#![allow(
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::match_same_arms
)]

mod builder;
mod config;
mod context;
mod errors;
mod metrics;
mod object;
mod pool;

pub use self::{
    builder::PoolBuilder,
    config::PoolConfig,
    context::Context,
    errors::{ContextError, PoolError},
    metrics::PoolMetrics,
    object::Object,
    pool::Pool,
};

use std::{fmt, future::Future};

use async_trait::async_trait;

/// The current pool status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    /// The maximum number of live objects.
    pub max_size: usize,

    /// The current number of live objects, idle and in use.
    pub size: usize,

    /// The current number of idle objects.
    pub idle: usize,

    /// The number of callers waiting for an object.
    pub waiting: usize,
}

/// Manager responsible for creating new objects for a [`Pool`].
#[async_trait]
pub trait Manager: Sync + Send {
    /// Type of objects that this [`Manager`] creates.
    type Type;
    /// Error that this [`Manager`] can return when creating objects.
    type Error;

    /// Creates a new instance of [`Manager::Type`].
    ///
    /// `ctx` is the context of the [`Pool::acquire()`] call which triggered
    /// the creation. Long running implementations should give up once it
    /// ends, typically by returning an error built from [`Context::err()`].
    async fn create(&self, ctx: &Context) -> Result<Self::Type, Self::Error>;
}

/// [`Manager`] backed by a closure, see [`manager_fn()`].
#[derive(Clone, Copy)]
pub struct ManagerFn<F>(F);

impl<F> fmt::Debug for ManagerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("ManagerFn { .. }")
    }
}

/// Wraps a constructor closure into a [`Manager`].
///
/// The closure receives a clone of the caller's [`Context`].
///
/// ```rust
/// use std::convert::Infallible;
///
/// use capped_pool::{manager_fn, Pool};
///
/// let pool = Pool::new(2, manager_fn(|_ctx| async { Ok::<_, Infallible>(Vec::<u8>::new()) }));
/// assert_eq!(pool.size(), 0);
/// ```
pub fn manager_fn<F, Fut, T, E>(f: F) -> ManagerFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    ManagerFn(f)
}

#[async_trait]
impl<F, Fut, T, E> Manager for ManagerFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Type = T;
    type Error = E;

    async fn create(&self, ctx: &Context) -> Result<T, E> {
        (self.0)(ctx.clone()).await
    }
}
