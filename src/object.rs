use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Weak},
};

use crate::{pool::PoolInner, Manager, Pool};

/// Wrapper around a pooled object which implements [`Deref`], [`DerefMut`]
/// and [`Drop`] traits.
///
/// Use this object just as if it was of type `T` and upon leaving a scope the
/// [`Drop::drop()`] will take care of returning it to the pool, exactly like
/// [`Pool::release()`] would.
#[must_use]
pub struct Object<M: Manager> {
    /// The actual object
    inner: Option<M::Type>,

    /// Pool to return the pooled object to.
    pool: Weak<PoolInner<M>>,
}

impl<M> fmt::Debug for Object<M>
where
    M: Manager,
    M::Type: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<M: Manager> Object<M> {
    pub(crate) fn new(inner: M::Type, pool: &Arc<PoolInner<M>>) -> Self {
        Self {
            inner: Some(inner),
            pool: Arc::downgrade(pool),
        }
    }

    /// Takes the object out of this guard without returning it to the
    /// [`Pool`].
    ///
    /// The object still counts towards [`Pool::size()`], so it should be
    /// handed back with [`Pool::release()`] once done.
    #[must_use]
    pub fn take(mut this: Self) -> M::Type {
        this.inner.take().unwrap()
    }

    /// Returns the [`Pool`] this [`Object`] belongs to.
    ///
    /// Since [`Object`]s only hold a [`Weak`] reference to the [`Pool`] they
    /// come from, this can fail and return [`None`] instead.
    pub fn pool(this: &Self) -> Option<Pool<M>> {
        this.pool.upgrade().map(|inner| Pool { inner })
    }
}

impl<M: Manager> Drop for Object<M> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Some(pool) = self.pool.upgrade() {
                pool.release(inner);
            }
        }
    }
}

impl<M: Manager> Deref for Object<M> {
    type Target = M::Type;
    fn deref(&self) -> &M::Type {
        self.inner.as_ref().unwrap()
    }
}

impl<M: Manager> DerefMut for Object<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().unwrap()
    }
}

impl<M: Manager> AsRef<M::Type> for Object<M> {
    fn as_ref(&self) -> &M::Type {
        self
    }
}

impl<M: Manager> AsMut<M::Type> for Object<M> {
    fn as_mut(&mut self) -> &mut M::Type {
        self
    }
}
