//! File-backed adapter: one JSON document per persistent storage id.

use std::fs;
use std::path::{Path, PathBuf};

use quire_primitives::create_filename;
use serde_json::{Map, Value as Json};

use crate::error::{Result, StoreError};
use crate::store::{StorageAdapter, Store};

/// Stores persistent data under a directory. Session stores live in memory
/// and vanish with the process.
#[derive(Debug, Clone)]
pub struct FileAdapter {
	dir: PathBuf,
}

impl FileAdapter {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Path of the document backing `storage_id`.
	pub fn path_for(&self, storage_id: &str) -> PathBuf {
		let stem = create_filename(storage_id);
		let stem = if stem.is_empty() { "store".to_owned() } else { stem };
		self.dir.join(format!("{stem}.json"))
	}
}

impl StorageAdapter for FileAdapter {
	fn name(&self) -> &str {
		"file"
	}

	/// Succeeds when the directory exists or can be created and is writable.
	fn init(&self, _storage_id: &str, _persistent: bool) -> bool {
		let existed = self.dir.is_dir();
		if fs::create_dir_all(&self.dir).is_err() {
			return false;
		}
		let marker = self.dir.join(".quire-writable");
		let ok = fs::write(&marker, b"ok").is_ok() && fs::remove_file(&marker).is_ok();
		if !ok && !existed {
			let _ = fs::remove_dir(&self.dir);
		}
		ok
	}

	fn create(&self, storage_id: &str, persistent: bool) -> Result<Box<dyn Store>> {
		let (path, data) = if persistent {
			let path = self.path_for(storage_id);
			let data = load(&path)?;
			(Some(path), data)
		} else {
			(None, Map::new())
		};
		Ok(Box::new(FileStore {
			id: storage_id.to_owned(),
			path,
			data,
		}))
	}
}

fn load(path: &Path) -> Result<Map<String, Json>> {
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
		Err(error) => {
			return Err(StoreError::Io {
				path: path.to_owned(),
				error,
			});
		}
	};
	serde_json::from_str(&text).map_err(|error| StoreError::Malformed {
		path: path.to_owned(),
		error,
	})
}

/// Writes to a sibling temporary file, then renames over the target.
fn save(path: &Path, data: &Map<String, Json>) -> Result<()> {
	let io = |error| StoreError::Io {
		path: path.to_owned(),
		error,
	};
	let text = serde_json::to_string_pretty(data)?;
	let tmp = path.with_extension("json.tmp");
	fs::write(&tmp, text).map_err(io)?;
	fs::rename(&tmp, path).map_err(io)
}

struct FileStore {
	id: String,
	/// `None` for session stores.
	path: Option<PathBuf>,
	data: Map<String, Json>,
}

impl FileStore {
	/// Saves `data` and only then makes it the store's contents, so a failed
	/// write leaves memory matching the disk.
	fn commit(&mut self, data: Map<String, Json>) -> Result<()> {
		if let Some(path) = &self.path {
			save(path, &data)?;
		}
		self.data = data;
		Ok(())
	}
}

impl Store for FileStore {
	fn name(&self) -> &str {
		if self.path.is_some() { "file" } else { "memory" }
	}

	fn id(&self) -> &str {
		&self.id
	}

	fn persistent(&self) -> bool {
		self.path.is_some()
	}

	fn keys(&self) -> Vec<String> {
		self.data.keys().cloned().collect()
	}

	fn has(&self, key: &str) -> bool {
		!key.is_empty() && self.data.contains_key(key)
	}

	fn get(&self, key: &str) -> Option<Json> {
		if key.is_empty() {
			return None;
		}
		self.data.get(key).cloned()
	}

	fn set(&mut self, key: &str, value: &Json) -> Result<bool> {
		if key.is_empty() {
			return Ok(false);
		}
		let mut data = self.data.clone();
		data.insert(key.to_owned(), value.clone());
		self.commit(data)?;
		Ok(true)
	}

	fn delete(&mut self, key: &str) -> Result<bool> {
		if key.is_empty() {
			return Ok(false);
		}
		if self.data.contains_key(key) {
			let mut data = self.data.clone();
			data.remove(key);
			self.commit(data)?;
		}
		Ok(true)
	}

	fn clear(&mut self) -> Result<bool> {
		self.commit(Map::new())?;
		Ok(true)
	}
}
