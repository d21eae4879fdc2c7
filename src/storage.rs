use crate::model::{EventStore, NoteList};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const EVENTS_KEY: &str = "myEvents";
pub const NOTES_KEY: &str = "myNotes";

/// Durable key-value store: one `<key>.json` file per key under `dir`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {:?}", path)),
        }
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {:?}", self.dir))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("writing {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("replacing {:?}", path))?;
        Ok(())
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "daypad").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn load_events(storage: &LocalStorage) -> EventStore {
    let events: EventStore = restore(storage, EVENTS_KEY);
    let events = events.normalized();
    info!("restored {} event days from {}", events.len(), EVENTS_KEY);
    events
}

pub fn load_notes(storage: &LocalStorage) -> NoteList {
    let notes: NoteList = restore(storage, NOTES_KEY);
    info!("restored {} notes from {}", notes.len(), NOTES_KEY);
    notes
}

pub fn save_events(storage: &LocalStorage, events: &EventStore) -> Result<()> {
    persist(storage, EVENTS_KEY, events)
}

pub fn save_notes(storage: &LocalStorage, notes: &NoteList) -> Result<()> {
    persist(storage, NOTES_KEY, notes)
}

fn restore<T: DeserializeOwned + Default>(storage: &LocalStorage, key: &str) -> T {
    let data = match storage.get_item(key) {
        Ok(Some(data)) => data,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!("could not read {}, starting empty: {:#}", key, err);
            return T::default();
        }
    };
    match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(err) => {
            warn!("could not parse {}, starting empty: {}", key, err);
            T::default()
        }
    }
}

fn persist<T: Serialize>(storage: &LocalStorage, key: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string(value).with_context(|| format!("serializing {}", key))?;
    storage.set_item(key, &serialized)?;
    debug!("wrote {} ({} bytes)", key, serialized.len());
    Ok(())
}
