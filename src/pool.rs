use std::{collections::VecDeque, fmt, mem, sync::Arc};

use parking_lot::Mutex;
use tokio::{sync::oneshot, time::Instant};
use tracing::{debug, debug_span, trace, Instrument};

use crate::{Context, Manager, Object, PoolBuilder, PoolConfig, PoolError, PoolMetrics, Status};

/// Generic object and connection pool with a hard cap on live objects.
///
/// Objects are created lazily by the [`Manager`] and never more than
/// [`PoolConfig::max_size`] of them are alive at the same time. Once the cap
/// is reached, [`Pool::acquire()`] waits for another caller to
/// [`Pool::release()`] an object, or for its [`Context`] to end.
///
/// This struct can be cloned and transferred across thread boundaries and uses
/// reference counting for its internal state.
pub struct Pool<M: Manager> {
    pub(crate) inner: Arc<PoolInner<M>>,
}

impl<M> fmt::Debug for Pool<M>
where
    M: fmt::Debug + Manager,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("manager", &self.inner.manager)
            .field("config", &self.inner.config)
            .field("status", &self.status())
            .finish()
    }
}

impl<M: Manager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Manager> Pool<M> {
    /// Creates a new [`Pool`] which keeps at most `max_size` objects alive.
    pub fn new(max_size: usize, manager: M) -> Self {
        Self::builder(manager).max_size(max_size).build()
    }

    /// Instantiates a builder for a new [`Pool`].
    pub fn builder(manager: M) -> PoolBuilder<M> {
        PoolBuilder::new(manager)
    }

    pub(crate) fn from_builder(builder: PoolBuilder<M>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                manager: builder.manager,
                slots: Mutex::new(Slots::new(builder.config.max_size)),
                config: builder.config,
                metrics: PoolMetrics::default(),
            }),
        }
    }

    /// Retrieves an object from this [`Pool`], creating one if there is room,
    /// or waits for one to be released.
    ///
    /// Idle objects are preferred over creating new ones. When the pool is at
    /// capacity the call waits until either a released object is handed over
    /// directly or `ctx` ends.
    ///
    /// Dropping the returned future is equivalent to cancelling `ctx`: any
    /// reservation or object already routed to this call goes back to the
    /// pool.
    ///
    /// The returned object must eventually be passed to [`Pool::release()`].
    ///
    /// # Errors
    ///
    /// - [`PoolError::Context`] if `ctx` ended while waiting.
    /// - [`PoolError::Backend`] if the [`Manager`] failed to create an object.
    /// - [`PoolError::Closed`] if the pool has been closed.
    pub async fn acquire(&self, ctx: &Context) -> Result<M::Type, PoolError<M::Error>> {
        let waiter = {
            let mut slots = self.inner.slots.lock();
            if slots.closed {
                return Err(PoolError::Closed);
            }
            if let Some(obj) = slots.idle.pop() {
                self.inner.metrics.record_reused();
                trace!("reusing idle object");
                return Ok(obj);
            }
            if slots.size < self.inner.config.max_size {
                slots.size += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                slots.waiters.push_back(tx);
                Some(Waiter::new(&self.inner, rx))
            }
        };

        if let Some(waiter) = waiter {
            match waiter.wait(ctx).await? {
                Handoff::Object(obj) => return Ok(obj),
                Handoff::Slot => debug!("creating object in promoted reservation"),
            }
        }
        self.create(ctx, Reservation::new(&self.inner)).await
    }

    /// Same as [`Pool::acquire()`] but wraps the object in an [`Object`]
    /// guard which releases it on drop.
    ///
    /// # Errors
    ///
    /// See [`Pool::acquire()`].
    pub async fn get(&self, ctx: &Context) -> Result<Object<M>, PoolError<M::Error>> {
        let obj = self.acquire(ctx).await?;
        Ok(Object::new(obj, &self.inner))
    }

    async fn create(
        &self,
        ctx: &Context,
        reservation: Reservation<'_, M>,
    ) -> Result<M::Type, PoolError<M::Error>> {
        let span = debug_span!("pool_create", max_size = self.inner.config.max_size);
        match self.inner.manager.create(ctx).instrument(span).await {
            Ok(obj) => {
                reservation.commit();
                Ok(obj)
            }
            Err(e) => {
                debug!("object creation failed");
                drop(reservation);
                Err(PoolError::Backend(e))
            }
        }
    }

    /// Retrieves an idle object without ever creating one or waiting.
    ///
    /// Returns [`None`] if nothing is idle right now, even if the pool still
    /// has room for new objects.
    #[must_use]
    pub fn try_acquire_existing(&self) -> Option<M::Type> {
        let obj = self.inner.slots.lock().idle.pop()?;
        self.inner.metrics.record_reused();
        Some(obj)
    }

    /// Returns an object obtained from [`Pool::acquire()`] back to this
    /// [`Pool`].
    ///
    /// If somebody is waiting the object is handed to them directly,
    /// otherwise it becomes idle. This never blocks.
    ///
    /// Releasing an object twice, or one that came from elsewhere, breaks the
    /// accounting of the pool, but never panics: the live count saturates at
    /// zero.
    pub fn release(&self, obj: M::Type) {
        self.inner.release(obj);
    }

    /// Returns the number of live objects, idle and in use.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.slots.lock().size
    }

    /// Closes this [`Pool`].
    ///
    /// Idle objects are dropped, and all current and future tasks waiting for
    /// objects will return [`PoolError::Closed`] immediately. Objects released
    /// afterwards are dropped as well.
    pub fn close(&self) {
        let (idle, waiters) = {
            let mut slots = self.inner.slots.lock();
            if slots.closed {
                return;
            }
            slots.closed = true;
            let idle = mem::take(&mut slots.idle);
            slots.size = slots.size.saturating_sub(idle.len());
            (idle, mem::take(&mut slots.waiters))
        };
        debug!(idle = idle.len(), waiters = waiters.len(), "pool closed");
        drop(waiters);
        drop(idle);
    }

    /// Indicates whether this [`Pool`] has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.slots.lock().closed
    }

    /// Retrieves [`Status`] of this [`Pool`].
    #[must_use]
    pub fn status(&self) -> Status {
        let slots = self.inner.slots.lock();
        Status {
            max_size: self.inner.config.max_size,
            size: slots.size,
            idle: slots.idle.len(),
            waiting: slots.waiters.iter().filter(|tx| !tx.is_closed()).count(),
        }
    }

    /// Returns [`PoolMetrics`] of this [`Pool`].
    pub fn metrics(&self) -> &PoolMetrics {
        &self.inner.metrics
    }

    /// Returns [`Manager`] of this [`Pool`].
    #[must_use]
    pub fn manager(&self) -> &M {
        &self.inner.manager
    }
}

pub(crate) struct PoolInner<M: Manager> {
    slots: Mutex<Slots<M::Type>>,
    config: PoolConfig,
    manager: M,
    metrics: PoolMetrics,
}

impl<M: Manager> PoolInner<M> {
    pub(crate) fn release(&self, obj: M::Type) {
        let discarded = {
            let mut slots = self.slots.lock();
            match slots.offer(Handoff::Object(obj)) {
                Ok(()) => {
                    self.metrics.record_handed_off();
                    trace!("handed released object to a waiter");
                    None
                }
                Err(rejected) => slots.settle(rejected),
            }
        };
        drop(discarded);
    }
}

/// What a waiter can be woken up with.
enum Handoff<T> {
    /// A released object.
    Object(T),
    /// Permission to create a new object, already counted in `size`.
    Slot,
}

/// State of the pool. Every transition happens under a single lock.
struct Slots<T> {
    /// LIFO stack of idle objects.
    idle: Vec<T>,
    /// FIFO queue of waiting acquirers. May contain senders whose receiver
    /// has gone away; those are skipped.
    waiters: VecDeque<oneshot::Sender<Handoff<T>>>,
    /// Live objects: idle, held by callers, in flight to a waiter, or being
    /// created.
    size: usize,
    closed: bool,
}

impl<T> Slots<T> {
    fn new(max_size: usize) -> Self {
        Self {
            idle: Vec::with_capacity(max_size),
            waiters: VecDeque::new(),
            size: 0,
            closed: false,
        }
    }

    /// Offers `handoff` to the longest waiting acquirer that is still there.
    fn offer(&mut self, mut handoff: Handoff<T>) -> Result<(), Handoff<T>> {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(handoff) {
                Ok(()) => return Ok(()),
                Err(rejected) => handoff = rejected,
            }
        }
        Err(handoff)
    }

    /// Puts back something nobody is waiting for. Returns an object which has
    /// to be dropped because the pool is closed.
    fn settle(&mut self, handoff: Handoff<T>) -> Option<T> {
        match handoff {
            Handoff::Object(obj) if self.closed => {
                self.size = self.size.saturating_sub(1);
                Some(obj)
            }
            Handoff::Object(obj) => {
                self.idle.push(obj);
                None
            }
            Handoff::Slot => {
                self.size = self.size.saturating_sub(1);
                None
            }
        }
    }

    fn put_back(&mut self, handoff: Handoff<T>) -> Option<T> {
        match self.offer(handoff) {
            Ok(()) => None,
            Err(rejected) => self.settle(rejected),
        }
    }
}

/// A slot counted in `size` for an object which is being created.
///
/// Unless committed, dropping it passes the slot on to a waiter or gives it
/// up.
struct Reservation<'a, M: Manager> {
    inner: &'a PoolInner<M>,
    committed: bool,
}

impl<'a, M: Manager> Reservation<'a, M> {
    fn new(inner: &'a PoolInner<M>) -> Self {
        Self {
            inner,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
        self.inner.metrics.record_created();
    }
}

impl<M: Manager> Drop for Reservation<'_, M> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.inner.metrics.record_create_failure();
        let mut slots = self.inner.slots.lock();
        if slots.offer(Handoff::Slot).is_ok() {
            debug!("reservation passed on to a waiter");
        } else {
            slots.size = slots.size.saturating_sub(1);
        }
    }
}

/// A registered, waiting [`Pool::acquire()`] call.
///
/// Unless settled, dropping it withdraws the registration and puts back
/// whatever has been handed over in the meantime.
struct Waiter<'a, M: Manager> {
    inner: &'a PoolInner<M>,
    rx: oneshot::Receiver<Handoff<M::Type>>,
    start: Instant,
    settled: bool,
}

impl<'a, M: Manager> Waiter<'a, M> {
    fn new(inner: &'a PoolInner<M>, rx: oneshot::Receiver<Handoff<M::Type>>) -> Self {
        Self {
            inner,
            rx,
            start: Instant::now(),
            settled: false,
        }
    }

    async fn wait(mut self, ctx: &Context) -> Result<Handoff<M::Type>, PoolError<M::Error>> {
        let result = tokio::select! {
            biased;
            handoff = &mut self.rx => handoff.map_err(|_| PoolError::Closed),
            err = ctx.done() => Err(PoolError::Context(err)),
        };
        self.inner.metrics.record_waiting(self.start);
        self.settled = !matches!(result, Err(PoolError::Context(_)));
        result
    }
}

impl<M: Manager> Drop for Waiter<'_, M> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.inner.metrics.record_waiting(self.start);
        self.inner.metrics.record_abandoned_wait();
        let discarded = {
            let mut slots = self.inner.slots.lock();
            self.rx.close();
            let discarded = match self.rx.try_recv() {
                Ok(handoff) => slots.put_back(handoff),
                Err(_) => None,
            };
            slots.waiters.retain(|tx| !tx.is_closed());
            discarded
        };
        drop(discarded);
    }
}
