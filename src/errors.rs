use thiserror::Error;

/// Reason a [`Context`] has ended.
///
/// [`Context`]: super::Context
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum ContextError {
    /// The context was cancelled explicitly.
    #[error("context canceled")]
    Canceled,

    /// The deadline of the context has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Possible errors returned by [`Pool::acquire()`] and [`Pool::get()`].
///
/// [`Pool::acquire()`]: super::Pool::acquire
/// [`Pool::get()`]: super::Pool::get
#[derive(Debug, Error)]
pub enum PoolError<E> {
    /// The caller's [`Context`] ended while waiting for an object.
    ///
    /// [`Context`]: super::Context
    #[error(transparent)]
    Context(ContextError),

    /// [`Manager`] reported an error while creating a new object.
    ///
    /// [`Manager`]: super::Manager
    #[error("Error occurred while creating a new object: {0}")]
    Backend(#[source] E),

    /// [`Pool`] has been closed.
    ///
    /// [`Pool`]: super::Pool
    #[error("Pool has been closed")]
    Closed,
}

impl<E> PoolError<E> {
    /// Returns the [`ContextError`] if this error was caused by the caller's
    /// context ending.
    #[must_use]
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            Self::Context(e) => Some(*e),
            Self::Backend(_) | Self::Closed => None,
        }
    }

    /// Returns the backend error, if any.
    pub fn into_backend(self) -> Option<E> {
        match self {
            Self::Backend(e) => Some(e),
            Self::Context(_) | Self::Closed => None,
        }
    }
}

impl<E> From<ContextError> for PoolError<E> {
    fn from(e: ContextError) -> Self {
        Self::Context(e)
    }
}
