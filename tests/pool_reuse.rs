use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use capped_pool::{manager_fn, Context, Pool};

#[derive(Debug, PartialEq, Eq)]
struct Foo(usize);

#[tokio::test]
async fn reuse() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let pool = Pool::new(
        3,
        manager_fn(move |_ctx| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, ()>(Foo(n)) }
        }),
    );

    let ctx = Context::new();
    let mut foos = Vec::new();
    for _ in 0..3 {
        foos.push(pool.acquire(&ctx).await.unwrap());
    }
    for foo in foos {
        pool.release(foo);
    }

    let mut expected = vec![1, 2, 3];
    for _ in 0..3 {
        let Foo(n) = pool.try_acquire_existing().unwrap();
        assert!(expected.contains(&n));
        expected.retain(|e| *e != n);
    }
    assert!(expected.is_empty());
    assert!(pool.try_acquire_existing().is_none());
    assert_eq!(created.load(Ordering::SeqCst), 3);
    assert_eq!(pool.size(), 3);
}

#[test]
fn try_acquire_existing_never_creates() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let pool = Pool::new(
        3,
        manager_fn(move |_ctx| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            async move { Err::<Foo, _>("must not be called") }
        }),
    );

    assert!(pool.try_acquire_existing().is_none());
    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert_eq!(pool.size(), 0);
    assert_eq!(pool.metrics().reused(), 0);
}

#[tokio::test]
async fn try_acquire_existing_skips_held_objects() {
    let pool = Pool::new(2, manager_fn(|_ctx| async { Ok::<_, ()>(Foo(7)) }));
    let ctx = Context::new();

    let held = pool.acquire(&ctx).await.unwrap();
    assert!(pool.try_acquire_existing().is_none());
    assert_eq!(pool.size(), 1);

    pool.release(held);
    assert_eq!(pool.try_acquire_existing(), Some(Foo(7)));
    assert_eq!(pool.metrics().reused(), 1);
    assert_eq!(pool.metrics().created(), 1);
}
