use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::*;

/// Adapter with a fixed init result that counts its calls.
struct CountingAdapter {
	name: &'static str,
	works: bool,
	inits: Arc<AtomicUsize>,
	creates: Arc<AtomicUsize>,
}

impl CountingAdapter {
	fn new(name: &'static str, works: bool) -> Self {
		Self {
			name,
			works,
			inits: Arc::default(),
			creates: Arc::default(),
		}
	}
}

impl StorageAdapter for CountingAdapter {
	fn name(&self) -> &str {
		self.name
	}

	fn init(&self, _storage_id: &str, _persistent: bool) -> bool {
		self.inits.fetch_add(1, Ordering::SeqCst);
		self.works
	}

	fn create(&self, storage_id: &str, persistent: bool) -> Result<Box<dyn Store>> {
		self.creates.fetch_add(1, Ordering::SeqCst);
		let adapter = WebStorageAdapter::in_memory();
		assert!(adapter.init(storage_id, persistent));
		adapter.create(storage_id, persistent)
	}
}

#[test]
fn test_binds_first_working_adapter_once() {
	let a = CountingAdapter::new("a", false);
	let b = CountingAdapter::new("b", true);
	let c = CountingAdapter::new("c", true);
	let (a_inits, b_inits, b_creates, c_inits) = (a.inits.clone(), b.inits.clone(), b.creates.clone(), c.inits.clone());

	let simple = SimpleStore::new().with_adapter(a).with_adapter(b).with_adapter(c);
	assert_eq!(simple.bound(), None);

	simple.create("story", true).expect("first create");
	simple.create("other", false).expect("second create");
	simple.create("third", true).expect("third create");

	assert_eq!(simple.bound(), Some("b"));
	assert_eq!(a_inits.load(Ordering::SeqCst), 1);
	assert_eq!(b_inits.load(Ordering::SeqCst), 1);
	assert_eq!(b_creates.load(Ordering::SeqCst), 3);
	assert_eq!(c_inits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_no_working_adapter_is_final() {
	let a = CountingAdapter::new("a", false);
	let inits = a.inits.clone();
	let simple = SimpleStore::new().with_adapter(a);

	for _ in 0..3 {
		let err = simple.create("story", true).err().expect("no adapter");
		assert!(matches!(err, StoreError::NoAdapters));
		assert_eq!(err.to_string(), "no valid storage adapters found");
	}
	assert_eq!(inits.load(Ordering::SeqCst), 1);
	assert_eq!(simple.bound(), None);
}

#[test]
fn test_empty_selector_fails() {
	assert!(matches!(SimpleStore::new().create("x", true), Err(StoreError::NoAdapters)));
}

#[test]
fn test_web_adapter_requires_init() {
	let adapter = WebStorageAdapter::in_memory();
	assert!(matches!(adapter.create("x", true), Err(StoreError::NotInitialized)));
}

#[test]
fn test_web_stores_are_prefixed_and_isolated() {
	let local: Arc<dyn StorageEngine> = Arc::new(MemoryEngine::new("localStorage"));
	let adapter = WebStorageAdapter::new(Arc::clone(&local), Arc::new(MemoryEngine::new("sessionStorage")));
	assert!(adapter.init("a", true));

	let mut a = adapter.create("a", true).expect("a");
	let mut b = adapter.create("b", true).expect("b");
	a.set("gold", &json!(5)).expect("set");
	a.set("name", &json!({"first": "Ann"})).expect("set");
	b.set("gold", &json!(1)).expect("set");

	assert_eq!(a.name(), "localStorage");
	assert_eq!(a.size(), 2);
	assert_eq!(a.keys(), vec!["gold", "name"]);
	assert_eq!(a.get("name"), Some(json!({"first": "Ann"})));
	assert_eq!(local.get_item("b.gold").as_deref(), Some("1"));

	a.clear().expect("clear");
	assert_eq!(a.size(), 0);
	assert!(b.has("gold"));
	assert_eq!(local.len(), 1);
}

#[test]
fn test_session_and_local_engines_are_separate() {
	let adapter = WebStorageAdapter::in_memory();
	assert!(adapter.init("s", false));
	let mut local = adapter.create("s", true).expect("local");
	let session = adapter.create("s", false).expect("session");
	local.set("k", &json!(true)).expect("set");
	assert_eq!(session.name(), "sessionStorage");
	assert!(!session.has("k"));
	assert!(!session.persistent());
}

#[rstest]
#[case::has("has")]
#[case::get("get")]
#[case::set("set")]
#[case::delete("delete")]
fn test_empty_keys_are_rejected(#[case] op: &str) {
	let adapter = WebStorageAdapter::in_memory();
	assert!(adapter.init("x", true));
	let mut store = adapter.create("x", true).expect("store");
	match op {
		"has" => assert!(!store.has("")),
		"get" => assert_eq!(store.get(""), None),
		"set" => assert!(!store.set("", &json!(1)).expect("set")),
		_ => assert!(!store.delete("").expect("delete")),
	}
	assert_eq!(store.size(), 0);
}

#[test]
fn test_quota_errors_name_the_engine() {
	let local: Arc<dyn StorageEngine> = Arc::new(MemoryEngine::new("localStorage").with_quota(64));
	let adapter = WebStorageAdapter::new(local, Arc::new(MemoryEngine::new("sessionStorage")));
	assert!(adapter.init("q", true));
	let mut store = adapter.create("q", true).expect("store");

	store.set("small", &json!("ok")).expect("fits");
	let err = store.set("big", &json!("x".repeat(100))).unwrap_err();
	assert_eq!(err.to_string(), "localStorage quota exceeded");
	assert!(!store.has("big"));
}

#[test]
fn test_init_tolerates_full_engine_with_data() {
	let engine = MemoryEngine::new("localStorage").with_quota(8);
	engine.set_item("k", "v").expect("fits");
	let adapter = WebStorageAdapter::new(Arc::new(engine), Arc::new(MemoryEngine::new("sessionStorage")));
	assert!(adapter.init("x", true));

	let empty_full = WebStorageAdapter::new(
		Arc::new(MemoryEngine::new("localStorage").with_quota(0)),
		Arc::new(MemoryEngine::new("sessionStorage")),
	);
	assert!(!empty_full.init("x", true));
}

#[test]
fn test_file_adapter_persists_between_stores() {
	let dir = tempfile::tempdir().expect("tempdir");
	let adapter = FileAdapter::new(dir.path().join("saves"));
	assert!(adapter.init("My Story", true));

	let mut store = adapter.create("My Story", true).expect("store");
	store.set("remember", &json!({"gold": 5})).expect("set");
	store.set("other", &json!([1, 2])).expect("set");
	store.delete("other").expect("delete");
	drop(store);

	let reopened = adapter.create("My Story", true).expect("reopen");
	assert_eq!(reopened.keys(), vec!["remember"]);
	assert_eq!(reopened.get("remember"), Some(json!({"gold": 5})));
	assert!(adapter.path_for("My Story").is_file());
}

#[test]
fn test_file_adapter_session_stores_stay_in_memory() {
	let dir = tempfile::tempdir().expect("tempdir");
	let adapter = FileAdapter::new(dir.path());
	assert!(adapter.init("s", false));
	let mut store = adapter.create("s", false).expect("store");
	store.set("k", &json!(1)).expect("set");
	assert_eq!(store.name(), "memory");
	assert!(!adapter.path_for("s").exists());
}

#[test]
fn test_file_store_keeps_memory_in_step_with_disk_on_failed_writes() {
	let dir = tempfile::tempdir().expect("tempdir");
	let saves = dir.path().join("saves");
	let adapter = FileAdapter::new(&saves);
	assert!(adapter.init("story", true));
	let mut store = adapter.create("story", true).expect("store");
	store.set("gold", &json!(5)).expect("set");

	std::fs::remove_dir_all(&saves).expect("remove saves");
	assert!(matches!(store.set("gold", &json!(6)), Err(StoreError::Io { .. })));
	assert!(matches!(store.set("name", &json!("Ann")), Err(StoreError::Io { .. })));
	assert!(matches!(store.delete("gold"), Err(StoreError::Io { .. })));
	assert!(matches!(store.clear(), Err(StoreError::Io { .. })));

	assert_eq!(store.get("gold"), Some(json!(5)));
	assert!(!store.has("name"));
	assert_eq!(store.keys(), vec!["gold"]);
}

#[test]
fn test_file_adapter_reports_malformed_documents() {
	let dir = tempfile::tempdir().expect("tempdir");
	let adapter = FileAdapter::new(dir.path());
	std::fs::write(adapter.path_for("bad"), "[1, 2").expect("write");
	assert!(matches!(adapter.create("bad", true), Err(StoreError::Malformed { .. })));
}

#[test]
fn test_selector_falls_back_to_file_adapter() {
	let dir = tempfile::tempdir().expect("tempdir");
	let broken = WebStorageAdapter::new(
		Arc::new(MemoryEngine::new("localStorage").with_quota(0)),
		Arc::new(MemoryEngine::new("sessionStorage")),
	);
	let simple = SimpleStore::new().with_adapter(broken).with_adapter(FileAdapter::new(dir.path()));
	let store = simple.create("quire", true).expect("store");
	assert_eq!(simple.bound(), Some("file"));
	assert_eq!(store.id(), "quire");
	assert_eq!(simple.adapters().collect::<Vec<_>>(), vec!["webstorage", "file"]);
}
