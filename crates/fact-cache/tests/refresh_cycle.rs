//! End-to-end refresh cycles against real files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use fact_cache::{
    CacheConfig, CacheEngine, Category, CategoryPayload, DimensionReader, FactCache,
    LatestRecordExtractor, ManualClock, MinimapProber, ProbeError, RefreshError, RefreshOutcome,
};
use serde_json::json;
use tempfile::TempDir;

fn append(path: &Path, line: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    writeln!(file, "{line}").unwrap();
}

fn record(category: &str, timestamp: u64, data: serde_json::Value) -> String {
    json!({ category: { "timestamp": timestamp, "data": data } }).to_string()
}

fn config(dir: &TempDir) -> CacheConfig {
    let mut config = CacheConfig::new(
        dir.path().join("kFacts.json"),
        dir.path().join("minimap.png"),
    );
    config.refresh_interval = Duration::from_secs(3600);
    config
}

#[derive(Default)]
struct ReaderState {
    reads: AtomicUsize,
    broken: AtomicBool,
}

/// Counts header reads and fails while `broken` is set.
#[derive(Clone, Default)]
struct ScriptedReader(Arc<ReaderState>);

impl ScriptedReader {
    fn reads(&self) -> usize {
        self.0.reads.load(Ordering::SeqCst)
    }

    fn set_broken(&self, broken: bool) {
        self.0.broken.store(broken, Ordering::SeqCst);
    }
}

impl DimensionReader for ScriptedReader {
    fn read_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
        self.0.reads.fetch_add(1, Ordering::SeqCst);
        if self.0.broken.load(Ordering::SeqCst) {
            return Err(ProbeError::Header {
                path: path.to_path_buf(),
                reason: "truncated".to_string(),
            });
        }
        Ok((512, 512))
    }
}

#[test]
fn test_latest_record_per_category() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    append(&facts, &record("player_information", 1, json!("A")));
    append(&facts, &record("train_information", 2, json!("B")));
    append(&facts, &record("player_information", 5, json!("C")));

    let config = config(&temp_dir);
    let extraction = LatestRecordExtractor::default()
        .extract(&facts, &config.tracked)
        .unwrap();

    assert_eq!(
        extraction.get(Category::Player),
        Some(&CategoryPayload::new(5, "C"))
    );
    assert_eq!(
        extraction.get(Category::Train),
        Some(&CategoryPayload::new(2, "B"))
    );
    assert!(!extraction.complete);
}

#[test]
fn test_large_log_across_many_blocks() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    let mut file = fs::File::create(&facts).unwrap();
    for ts in 0..5_000u64 {
        let category = match ts % 3 {
            0 => "player_information",
            1 => "train_information",
            _ => "turret_information",
        };
        writeln!(file, "{}", record(category, ts, json!({ "pad": "x".repeat(40) }))).unwrap();
    }
    drop(file);

    let mut config = config(&temp_dir);
    config.read_block_size = 4096;
    let engine = CacheEngine::new(Arc::new(config)).with_clock(Arc::new(ManualClock::new(1)));

    let snapshot = engine.refresh(None).unwrap();
    assert_eq!(snapshot.timestamp(Category::Turret), Some(4_997));
    assert_eq!(snapshot.timestamp(Category::Player), Some(4_998));
    assert_eq!(snapshot.timestamp(Category::Train), Some(4_999));
}

#[test]
fn test_timestamps_never_regress_across_refreshes() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    append(&facts, &record("player_information", 10, json!("ten")));

    let engine =
        CacheEngine::new(Arc::new(config(&temp_dir))).with_clock(Arc::new(ManualClock::new(1)));
    let first = engine.refresh(None).unwrap();

    // The producer restarts and writes an older timestamp.
    append(&facts, &record("player_information", 7, json!("seven")));
    let second = engine.refresh(Some(&first)).unwrap();

    assert_eq!(
        second.get(Category::Player),
        Some(&CategoryPayload::new(10, "ten"))
    );

    append(&facts, &record("player_information", 11, json!("eleven")));
    let third = engine.refresh(Some(&second)).unwrap();
    assert_eq!(third.timestamp(Category::Player), Some(11));
}

#[test]
fn test_malformed_tail_line_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    append(&facts, &record("train_information", 3, json!(null)));
    // A record cut off mid-append.
    fs::OpenOptions::new()
        .append(true)
        .open(&facts)
        .unwrap()
        .write_all(b"{\"train_information\":{\"timest")
        .unwrap();

    let engine =
        CacheEngine::new(Arc::new(config(&temp_dir))).with_clock(Arc::new(ManualClock::new(1)));
    let snapshot = engine.refresh(None).unwrap();

    assert_eq!(snapshot.timestamp(Category::Train), Some(3));
}

#[test]
fn test_rapid_minimap_rewrite_is_debounced() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    let minimap = temp_dir.path().join("minimap.png");
    append(&facts, &record("map_information", 1, json!({ "numTiles": 4 })));
    fs::write(&minimap, vec![0u8; 100]).unwrap();

    let reader = ScriptedReader::default();
    let clock = Arc::new(ManualClock::new(10_000));
    let prober =
        MinimapProber::new(Duration::from_millis(500)).with_reader(Arc::new(reader.clone()));
    let engine = CacheEngine::new(Arc::new(config(&temp_dir)))
        .with_prober(prober)
        .with_clock(clock.clone());

    let first = engine.refresh(None).unwrap();
    assert!(first.map().data.ready);
    assert_eq!(first.map().data.num_tiles, 4);
    assert_eq!(reader.reads(), 1);

    // The producer starts rewriting: new size, header not yet valid.
    reader.set_broken(true);
    fs::write(&minimap, vec![0u8; 50]).unwrap();
    clock.advance(Duration::from_millis(40));
    let second = engine.refresh(Some(&first)).unwrap();
    assert!(!second.map().data.ready);
    assert_eq!(reader.reads(), 2);

    // Same size again 60 ms later: inside the window, no header read.
    clock.advance(Duration::from_millis(60));
    let third = engine.refresh(Some(&second)).unwrap();
    assert!(!third.map().data.ready);
    assert_eq!(reader.reads(), 2);

    // After the window the header is read again.
    reader.set_broken(false);
    clock.advance(Duration::from_millis(500));
    let fourth = engine.refresh(Some(&third)).unwrap();
    assert!(fourth.map().data.ready);
    assert_eq!(fourth.map().data.resolution, (512, 512));
    assert_eq!(reader.reads(), 3);
}

#[tokio::test]
async fn test_failed_refresh_keeps_published_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    append(&facts, &record("turret_information", 2, json!([])));

    let cache = FactCache::builder()
        .config(config(&temp_dir))
        .require_initial_snapshot(true)
        .start()
        .await
        .unwrap();
    let handle = cache.handle();
    let before = handle.snapshot().unwrap();

    fs::remove_file(&facts).unwrap();
    let result = handle.refresh_now().await;
    assert!(matches!(result, Err(RefreshError::FactLog(_))));
    assert!(Arc::ptr_eq(&before, &handle.snapshot().unwrap()));

    append(&facts, &record("turret_information", 3, json!([1])));
    let outcome = handle.refresh_now().await.unwrap();
    let RefreshOutcome::Published(after) = outcome else {
        panic!("expected a published snapshot");
    };
    assert_eq!(after.timestamp(Category::Turret), Some(3));

    let metrics = handle.metrics();
    assert_eq!(metrics.succeeded, 2);
    assert_eq!(metrics.failed, 1);
    assert_eq!(metrics.consecutive_failures, 0);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_periodic_worker_picks_up_appends() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("kFacts.json");
    append(&facts, &record("player_information", 1, json!("A")));

    let mut config = config(&temp_dir);
    config.refresh_interval = Duration::from_millis(20);
    let cache = FactCache::builder().config(config).start().await.unwrap();
    assert_eq!(cache.snapshot().unwrap().timestamp(Category::Player), Some(1));

    append(&facts, &record("player_information", 2, json!("B")));

    let mut seen = None;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        seen = cache.snapshot().and_then(|s| s.timestamp(Category::Player));
        if seen == Some(2) {
            break;
        }
    }
    assert_eq!(seen, Some(2));

    cache.shutdown().await.unwrap();
}

#[test]
fn test_snapshot_serializes_with_wire_keys() {
    let temp_dir = TempDir::new().unwrap();
    append(
        &temp_dir.path().join("kFacts.json"),
        &record("player_information", 5, json!({ "x": 1 })),
    );
    let engine =
        CacheEngine::new(Arc::new(config(&temp_dir))).with_clock(Arc::new(ManualClock::new(77)));

    let value = serde_json::to_value(engine.refresh(None).unwrap()).unwrap();

    assert_eq!(value["timestamp"], json!(77));
    assert_eq!(value["data"]["player_information"]["timestamp"], json!(5));
    assert_eq!(value["data"]["map_information"]["data"]["ready"], json!(false));
}
