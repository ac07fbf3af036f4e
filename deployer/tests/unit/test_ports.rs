//! Port allocator tests

use std::sync::Arc;

use aedify_deployer::app::options::AppOptions;
use aedify_deployer::app::state::AppState;
use aedify_deployer::errors::PortError;
use aedify_deployer::ports::{MemoryPortStore, Options, PortAllocator, PortCounterStore, SqlitePortStore};
use aedify_deployer::storage::layout::StorageLayout;
use aedify_deployer::storage::settings::Settings;
use tokio_test::assert_ok;

fn allocator(store: Arc<dyn PortCounterStore>) -> PortAllocator {
    PortAllocator::new(store, Options::default())
}

async fn allocate_many(allocator: Arc<PortAllocator>, count: usize) -> Vec<u16> {
    let calls = (0..count).map(|_| {
        let allocator = allocator.clone();
        async move { allocator.allocate().await }
    });
    let mut ports: Vec<u16> = futures::future::join_all(calls)
        .await
        .into_iter()
        .map(|r| r.unwrap().host_port)
        .collect();
    ports.sort_unstable();
    ports
}

#[tokio::test]
async fn test_fresh_counter_starts_at_initial_port() {
    let allocator = allocator(Arc::new(MemoryPortStore::new()));

    let first = assert_ok!(allocator.allocate().await);
    let second = assert_ok!(allocator.allocate().await);

    assert_eq!((first.container_port, first.host_port), (3000, 3003));
    assert_eq!((second.container_port, second.host_port), (3000, 3004));
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqlitePortStore::new(dir.path().join("ports.sqlite")));
    let allocator = allocator(store);

    assert_ok!(allocator.initialize().await);
    assert_eq!(allocator.allocate().await.unwrap().host_port, 3003);
    assert_ok!(allocator.initialize().await);

    let counter = allocator.current().await.unwrap().unwrap();
    assert_eq!(counter.current_port, 3004);
}

#[tokio::test]
async fn test_concurrent_allocations_are_contiguous_in_memory() {
    let allocator = Arc::new(allocator(Arc::new(MemoryPortStore::new())));
    let ports = allocate_many(allocator, 25).await;
    assert_eq!(ports, (3003..3028).collect::<Vec<u16>>());
}

#[tokio::test]
async fn test_concurrent_allocations_are_contiguous_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqlitePortStore::new(dir.path().join("ports.sqlite")));
    let allocator = Arc::new(allocator(store));

    let ports = allocate_many(allocator, 25).await;
    assert_eq!(ports, (3003..3028).collect::<Vec<u16>>());
}

#[tokio::test]
async fn test_two_allocators_share_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ports.sqlite");
    let first = Arc::new(allocator(Arc::new(SqlitePortStore::new(&path))));
    let second = Arc::new(allocator(Arc::new(SqlitePortStore::new(&path))));

    let (a, b) = tokio::join!(allocate_many(first, 10), allocate_many(second, 10));
    let mut all: Vec<u16> = a.into_iter().chain(b).collect();
    all.sort_unstable();
    assert_eq!(all, (3003..3023).collect::<Vec<u16>>());
}

#[tokio::test]
async fn test_counter_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ports.sqlite");

    let before = allocator(Arc::new(SqlitePortStore::new(&path)));
    before.allocate().await.unwrap();
    before.allocate().await.unwrap();
    drop(before);

    let after = allocator(Arc::new(SqlitePortStore::new(&path)));
    assert_eq!(after.allocate().await.unwrap().host_port, 3005);
}

#[tokio::test]
async fn test_unreachable_storage() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let store = SqlitePortStore::new(blocker.join("ports.sqlite"));
    let allocator = allocator(Arc::new(store));

    assert!(matches!(
        allocator.initialize().await,
        Err(PortError::StorageUnavailable(_))
    ));
    assert!(matches!(
        allocator.allocate().await,
        Err(PortError::StorageUnavailable(_))
    ));
}

#[tokio::test]
async fn test_exhausted_range() {
    let allocator = PortAllocator::new(
        Arc::new(MemoryPortStore::new()),
        Options {
            container_port: 3000,
            initial_host_port: u16::MAX,
        },
    );

    assert_eq!(allocator.allocate().await.unwrap().host_port, u16::MAX);
    assert_eq!(
        allocator.allocate().await.unwrap_err(),
        PortError::Exhausted(i64::from(u16::MAX) + 1)
    );
}

#[tokio::test]
async fn test_fresh_base_dir_allocates() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(dir.path().join(".aedify"));
    let options = AppOptions::from_settings(&Settings::default(), &layout);

    let state = AppState::init(&options).await.unwrap();
    let ports = assert_ok!(state.allocator.allocate().await);

    assert_eq!(ports.host_port, 3003);
    assert!(options.port_db_path.exists());
}

#[tokio::test]
async fn test_zero_initial_port_is_rejected() {
    let allocator = PortAllocator::new(
        Arc::new(MemoryPortStore::new()),
        Options {
            container_port: 3000,
            initial_host_port: 0,
        },
    );

    assert!(matches!(
        allocator.initialize().await,
        Err(PortError::StorageUnavailable(_))
    ));
    assert!(matches!(
        allocator.allocate().await,
        Err(PortError::StorageUnavailable(_))
    ));
    assert!(allocator.current().await.unwrap().is_none());
}
