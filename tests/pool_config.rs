use std::convert::Infallible;

use capped_pool::{manager_fn, Pool, PoolConfig};

#[test]
fn builder_applies_config() {
    let manager = manager_fn(|_ctx| async { Ok::<_, Infallible>(()) });
    let pool = Pool::builder(manager).config(PoolConfig::new(3)).build();
    assert_eq!(pool.status().max_size, 3);
    assert_eq!(pool.size(), 0);

    let manager = manager_fn(|_ctx| async { Ok::<_, Infallible>(()) });
    let pool = Pool::builder(manager).max_size(7).build();
    assert_eq!(pool.status().max_size, 7);
}

#[test]
fn default_is_not_empty() {
    assert!(PoolConfig::default().max_size > 0);
}

#[cfg(feature = "serde")]
#[test]
fn from_json() {
    use config::{Config, File, FileFormat};

    let cfg: PoolConfig = Config::builder()
        .add_source(File::from_str(r#"{ "max_size": 7 }"#, FileFormat::Json))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();
    assert_eq!(cfg, PoolConfig::new(7));
}

#[cfg(feature = "serde")]
#[test]
fn missing_fields_use_defaults() {
    use config::{Config, File, FileFormat};

    let cfg: PoolConfig = Config::builder()
        .add_source(File::from_str("{}", FileFormat::Json))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();
    assert_eq!(cfg, PoolConfig::default());
}
