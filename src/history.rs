//! Local record of generated and scanned codes.
//!
//! A [History] keeps at most [MAX_HISTORY_ITEMS] entries, newest first, in a pluggable
//! [HistoryStorage]. [MemoryStorage] lives as long as the process; [FileStorage] keeps a
//! JSON file, the same format [History::export_history] writes.
//!
//! # Examples
//!
//! ```rust
//! use qr_studio::history::{History, ItemKind, MemoryStorage, NewItem};
//! use qr_studio::QrConfig;
//!
//! let mut history = History::new(MemoryStorage::default());
//! history.add_item(NewItem::created(&QrConfig::new("https://example.com"))).unwrap();
//! history.add_item(NewItem::text(ItemKind::Scanned, "hello")).unwrap();
//!
//! let items = history.items().unwrap();
//! assert_eq!(items[0].data, "hello");
//! assert_eq!(history.stats().unwrap().created, 1);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{QrConfig, QrOptions};
use crate::error::HistoryError;

pub const MAX_HISTORY_ITEMS: usize = 100;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Created,
    Scanned,
}

/// What was known about a scan when it was recorded.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub data: String,
    /// Undecorated decoder output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default = "qr_code")]
    pub format: String,
    pub timestamp: u64,
}

fn qr_code() -> String {
    "qr_code".to_string()
}

#[cfg(feature = "scan")]
impl From<&crate::scan::ScanResult> for ScanRecord {
    fn from(result: &crate::scan::ScanResult) -> Self {
        ScanRecord {
            data: result.payload.clone(),
            raw_text: Some(result.payload.clone()),
            file: result.source_label.clone(),
            format: qr_code(),
            timestamp: result.timestamp,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<QrOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_result: Option<ScanRecord>,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

/// An entry before the store gives it an id and a timestamp.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewItem {
    pub kind: ItemKind,
    pub data: String,
    pub config: Option<QrOptions>,
    pub scan_result: Option<ScanRecord>,
}

impl NewItem {
    pub fn text(kind: ItemKind, data: impl Into<String>) -> NewItem {
        NewItem {
            kind,
            data: data.into(),
            config: None,
            scan_result: None,
        }
    }

    /// A generated code, with the settings it was made with.
    pub fn created(config: &QrConfig) -> NewItem {
        NewItem {
            kind: ItemKind::Created,
            data: config.data.clone(),
            config: Some(QrOptions::from(config)),
            scan_result: None,
        }
    }

    #[cfg(feature = "scan")]
    pub fn scanned(result: &crate::scan::ScanResult) -> NewItem {
        NewItem {
            kind: ItemKind::Scanned,
            data: result.payload.clone(),
            config: None,
            scan_result: Some(ScanRecord::from(result)),
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub created: usize,
    pub scanned: usize,
    pub oldest: Option<HistoryItem>,
    pub newest: Option<HistoryItem>,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
}

/// Where the item list is kept.
pub trait HistoryStorage {
    /// Stored items, newest first. Nothing stored yet is an empty list.
    fn load(&self) -> Result<Vec<HistoryItem>, HistoryError>;
    fn save(&mut self, items: &[HistoryItem]) -> Result<(), HistoryError>;
    fn clear(&mut self) -> Result<(), HistoryError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Vec<HistoryItem>,
}

impl HistoryStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        Ok(self.items.clone())
    }

    fn save(&mut self, items: &[HistoryItem]) -> Result<(), HistoryError> {
        self.items = items.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.items.clear();
        Ok(())
    }
}

/// Items kept as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// The file and its parent directories are created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> FileStorage {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for FileStorage {
    fn load(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, items: &[HistoryItem]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// The most recent codes, newest first.
#[derive(Debug, Clone)]
pub struct History<S: HistoryStorage> {
    storage: S,
}

impl<S: HistoryStorage> History<S> {
    pub fn new(storage: S) -> History<S> {
        History { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Record `item` as the newest entry. The oldest entries beyond [MAX_HISTORY_ITEMS] are dropped.
    ///
    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn add_item(&mut self, item: NewItem) -> Result<HistoryItem, HistoryError> {
        let timestamp = crate::unix_millis();
        let item = HistoryItem {
            id: format!("{}-{}", timestamp, crate::random_base36(9)),
            kind: item.kind,
            data: item.data,
            config: item.config,
            scan_result: item.scan_result,
            timestamp,
        };

        let mut items = self.storage.load()?;
        items.insert(0, item.clone());
        items.truncate(MAX_HISTORY_ITEMS);
        self.storage.save(&items)?;
        log::debug!("recorded {:?} item {}", item.kind, item.id);
        Ok(item)
    }

    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn items(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        self.storage.load()
    }

    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn item(&self, id: &str) -> Result<Option<HistoryItem>, HistoryError> {
        Ok(self.items()?.into_iter().find(|item| item.id == id))
    }

    /// Remove the entry with `id`. Returns whether there was one.
    ///
    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn delete_item(&mut self, id: &str) -> Result<bool, HistoryError> {
        let mut items = self.items()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.storage.save(&items)?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn clear_all(&mut self) -> Result<(), HistoryError> {
        self.storage.clear()
    }

    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn items_by_kind(&self, kind: ItemKind) -> Result<Vec<HistoryItem>, HistoryError> {
        self.filtered(|item| item.kind == kind)
    }

    /// Entries whose payload contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn search(&self, query: &str) -> Result<Vec<HistoryItem>, HistoryError> {
        let query = query.to_lowercase();
        self.filtered(|item| item.data.to_lowercase().contains(&query))
    }

    /// Entries recorded between `start` and `end` milliseconds, both included.
    ///
    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn items_in_range(&self, start: u64, end: u64) -> Result<Vec<HistoryItem>, HistoryError> {
        self.filtered(|item| (start..=end).contains(&item.timestamp))
    }

    /// Apply `update` to the entry with `id` and store the result. Its id can't be changed.
    ///
    /// Returns the updated entry, or `None` if there's no entry with `id`.
    ///
    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn update_item<F>(
        &mut self,
        id: &str,
        update: F,
    ) -> Result<Option<HistoryItem>, HistoryError>
    where
        F: FnOnce(&mut HistoryItem),
    {
        let mut items = self.items()?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };
        update(item);
        item.id = id.to_string();
        let updated = item.clone();
        self.storage.save(&items)?;
        Ok(Some(updated))
    }

    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn stats(&self) -> Result<HistoryStats, HistoryError> {
        let items = self.items()?;
        Ok(HistoryStats {
            total: items.len(),
            created: items.iter().filter(|i| i.kind == ItemKind::Created).count(),
            scanned: items.iter().filter(|i| i.kind == ItemKind::Scanned).count(),
            oldest: items.iter().min_by_key(|i| i.timestamp).cloned(),
            newest: items.iter().max_by_key(|i| i.timestamp).cloned(),
        })
    }

    /// Every entry as pretty-printed JSON, loadable with [History::import_history].
    ///
    /// # Errors
    ///
    /// Will return an error if the storage fails.
    pub fn export_history(&self) -> Result<String, HistoryError> {
        Ok(serde_json::to_string_pretty(&self.items()?)?)
    }

    /// Merge entries exported by [History::export_history].
    ///
    /// Entries whose id is already present are counted as duplicates and skipped. The merged
    /// list is sorted newest first and cut back to [MAX_HISTORY_ITEMS].
    ///
    /// # Errors
    ///
    /// Will return an error if `json` isn't a list of entries, or if the storage fails. Nothing
    /// is imported in either case.
    pub fn import_history(&mut self, json: &str) -> Result<ImportSummary, HistoryError> {
        let incoming: Vec<HistoryItem> = serde_json::from_str(json)?;
        let mut items = self.items()?;
        let mut ids: HashSet<String> = items.iter().map(|item| item.id.clone()).collect();

        let mut summary = ImportSummary::default();
        for item in incoming {
            if ids.insert(item.id.clone()) {
                items.push(item);
                summary.imported += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(MAX_HISTORY_ITEMS);
        self.storage.save(&items)?;
        log::info!(
            "imported {} history items, skipped {} duplicates",
            summary.imported,
            summary.duplicates
        );
        Ok(summary)
    }

    fn filtered<P>(&self, predicate: P) -> Result<Vec<HistoryItem>, HistoryError>
    where
        P: Fn(&HistoryItem) -> bool,
    {
        Ok(self.items()?.into_iter().filter(|item| predicate(item)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcLevel, LogoOptions, LogoSource};

    fn item(id: &str, kind: ItemKind, data: &str, timestamp: u64) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            kind,
            data: data.to_string(),
            config: None,
            scan_result: None,
            timestamp,
        }
    }

    fn seeded(items: Vec<HistoryItem>) -> History<MemoryStorage> {
        let mut storage = MemoryStorage::default();
        storage.save(&items).unwrap();
        History::new(storage)
    }

    #[test]
    fn ids_and_timestamps_are_assigned() {
        let mut history = History::new(MemoryStorage::default());
        let stored = history
            .add_item(NewItem::text(ItemKind::Created, "hello"))
            .unwrap();
        let (millis, suffix) = stored.id.split_once('-').unwrap();
        assert_eq!(millis, stored.timestamp.to_string());
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(history.item(&stored.id).unwrap(), Some(stored));
    }

    #[test]
    fn newest_first_and_capped() {
        let mut history = History::new(MemoryStorage::default());
        for i in 0..(MAX_HISTORY_ITEMS + 5) {
            history
                .add_item(NewItem::text(ItemKind::Created, format!("item {}", i)))
                .unwrap();
        }
        let items = history.items().unwrap();
        assert_eq!(items.len(), MAX_HISTORY_ITEMS);
        assert_eq!(items[0].data, "item 104");
        assert_eq!(items[MAX_HISTORY_ITEMS - 1].data, "item 5");
    }

    #[test]
    fn created_items_keep_their_settings() {
        let mut history = History::new(MemoryStorage::default());
        let config = QrConfig::new("https://example.com").with_error_correction(EcLevel::H);
        let stored = history.add_item(NewItem::created(&config)).unwrap();
        assert_eq!(stored.kind, ItemKind::Created);
        assert_eq!(QrConfig::resolve(stored.config.unwrap()), config);
    }

    #[test]
    fn delete_and_clear() {
        let mut history = seeded(vec![
            item("b", ItemKind::Created, "two", 2),
            item("a", ItemKind::Created, "one", 1),
        ]);
        assert!(history.delete_item("a").unwrap());
        assert!(!history.delete_item("a").unwrap());
        assert_eq!(history.items().unwrap().len(), 1);

        history.clear_all().unwrap();
        assert!(history.items().unwrap().is_empty());
    }

    #[test]
    fn queries() {
        let history = seeded(vec![
            item("c", ItemKind::Scanned, "WIFI:S:Home;;", 300),
            item("b", ItemKind::Created, "https://Example.com", 200),
            item("a", ItemKind::Created, "hello", 100),
        ]);

        let scanned = history.items_by_kind(ItemKind::Scanned).unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].id, "c");

        let found = history.search("EXAMPLE").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");

        let ids: Vec<String> = history
            .items_in_range(100, 200)
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(history.items_in_range(301, 400).unwrap().is_empty());
    }

    #[test]
    fn update_keeps_the_id() {
        let mut history = seeded(vec![item("a", ItemKind::Created, "old", 1)]);
        let updated = history
            .update_item("a", |item| {
                item.data = "new".to_string();
                item.id = "hijacked".to_string();
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, "a");
        assert_eq!(updated.data, "new");
        assert_eq!(history.item("a").unwrap().unwrap().data, "new");
        assert_eq!(history.update_item("missing", |_| {}).unwrap(), None);
    }

    #[test]
    fn stats() {
        assert_eq!(
            History::new(MemoryStorage::default()).stats().unwrap(),
            HistoryStats::default()
        );

        let history = seeded(vec![
            item("c", ItemKind::Scanned, "three", 300),
            item("b", ItemKind::Created, "two", 200),
            item("a", ItemKind::Created, "one", 100),
        ]);
        let stats = history.stats().unwrap();
        assert_eq!((stats.total, stats.created, stats.scanned), (3, 2, 1));
        assert_eq!(stats.oldest.unwrap().id, "a");
        assert_eq!(stats.newest.unwrap().id, "c");
    }

    #[test]
    fn export_format() {
        let history = seeded(vec![HistoryItem {
            scan_result: Some(ScanRecord {
                data: "hello".to_string(),
                raw_text: None,
                file: Some("photo.png".to_string()),
                format: "qr_code".to_string(),
                timestamp: 5,
            }),
            ..item("a", ItemKind::Scanned, "hello", 5)
        }]);
        let json: serde_json::Value =
            serde_json::from_str(&history.export_history().unwrap()).unwrap();
        assert_eq!(json[0]["type"], "scanned");
        assert_eq!(json[0]["scanResult"]["file"], "photo.png");
        assert!(json[0].get("config").is_none());
    }

    #[test]
    fn import_merges_by_id() {
        let exported = seeded(vec![
            item("x", ItemKind::Created, "new", 500),
            item("a", ItemKind::Created, "one", 100),
        ])
        .export_history()
        .unwrap();

        let mut history = seeded(vec![
            item("b", ItemKind::Scanned, "two", 200),
            item("a", ItemKind::Created, "one", 100),
        ]);
        let summary = history.import_history(&exported).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                duplicates: 1
            }
        );
        let ids: Vec<String> = history.items().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["x", "b", "a"]);
    }

    #[test]
    fn import_reads_saved_settings() {
        let saved = r##"[{
            "id": "1700000000000-abc123xyz",
            "type": "created",
            "data": "https://example.com",
            "timestamp": 1700000000000,
            "config": {
                "data": "https://example.com",
                "version": "auto",
                "errorCorrection": "H",
                "size": 800,
                "margin": 2,
                "colorDark": "#112233",
                "colorLight": "#FFFFFF",
                "roundedModules": false,
                "logo": { "src": "data:image/png;base64,AAAA", "size": 60 }
            }
        }]"##;
        let mut history = History::new(MemoryStorage::default());
        assert_eq!(history.import_history(saved).unwrap().imported, 1);

        let options = history.items().unwrap()[0].config.clone().unwrap();
        assert_eq!(options.error_correction, Some(EcLevel::H));
        assert_eq!(options.pixel_size, Some(800));
        assert_eq!(options.margin, Some(2));
        assert_eq!(options.color_dark.as_deref(), Some("#112233"));
        assert_eq!(options.color_light.as_deref(), Some("#FFFFFF"));
        assert_eq!(
            options.logo,
            Some(LogoOptions {
                source: Some(LogoSource::DataUri(
                    "data:image/png;base64,AAAA".to_string()
                )),
                size: Some(60),
            })
        );

        let exported = history.export_history().unwrap();
        assert!(!exported.contains("pixel_size"));
        assert!(!exported.contains("null"));
        let json: serde_json::Value = serde_json::from_str(&exported).unwrap();
        let config = &json[0]["config"];
        assert_eq!(config["size"], 800);
        assert_eq!(config["errorCorrection"], "H");
        assert_eq!(config["logo"]["src"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn partial_settings_leave_out_unset_fields() {
        let history = seeded(vec![HistoryItem {
            config: Some(QrOptions {
                data: "hello".to_string(),
                ..QrOptions::default()
            }),
            ..item("a", ItemKind::Created, "hello", 1)
        }]);
        let json: serde_json::Value =
            serde_json::from_str(&history.export_history().unwrap()).unwrap();
        assert_eq!(json[0]["config"], serde_json::json!({ "data": "hello" }));
    }

    #[test]
    fn scan_raw_text_survives_import() {
        let saved = r#"[{
            "id": "1-a",
            "type": "scanned",
            "data": "hello",
            "timestamp": 1,
            "scanResult": {
                "data": "hello",
                "rawText": "hello",
                "file": "photo.png",
                "format": "qr_code",
                "timestamp": 1
            }
        }]"#;
        let mut history = History::new(MemoryStorage::default());
        history.import_history(saved).unwrap();

        let record = history.items().unwrap()[0].scan_result.clone().unwrap();
        assert_eq!(record.raw_text.as_deref(), Some("hello"));

        let json: serde_json::Value =
            serde_json::from_str(&history.export_history().unwrap()).unwrap();
        assert_eq!(json[0]["scanResult"]["rawText"], "hello");
    }

    #[test]
    fn import_recaps() {
        let incoming: Vec<HistoryItem> = (0..150)
            .map(|i| item(&format!("id-{}", i), ItemKind::Created, "data", i))
            .collect();
        let mut history = History::new(MemoryStorage::default());
        let summary = history
            .import_history(&serde_json::to_string(&incoming).unwrap())
            .unwrap();
        assert_eq!(summary.imported, 150);

        let items = history.items().unwrap();
        assert_eq!(items.len(), MAX_HISTORY_ITEMS);
        assert_eq!(items[0].timestamp, 149);
        assert_eq!(items[MAX_HISTORY_ITEMS - 1].timestamp, 50);
    }

    #[test]
    fn import_rejects_garbage() {
        let mut history = seeded(vec![item("a", ItemKind::Created, "one", 1)]);
        assert!(matches!(
            history.import_history("{\"not\": \"a list\"}"),
            Err(HistoryError::Json(_))
        ));
        assert_eq!(history.items().unwrap().len(), 1);
    }

    #[test]
    fn file_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut history = History::new(FileStorage::new(&path));
        assert!(history.items().unwrap().is_empty());
        let stored = history
            .add_item(NewItem::text(ItemKind::Scanned, "persisted"))
            .unwrap();

        let reopened = History::new(FileStorage::new(&path));
        assert_eq!(reopened.items().unwrap(), vec![stored]);

        history.clear_all().unwrap();
        assert!(!path.exists());
        history.clear_all().unwrap();
    }

    #[test]
    fn file_storage_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            History::new(FileStorage::new(path)).items(),
            Err(HistoryError::Json(_))
        ));
    }

    #[test]
    #[cfg(feature = "scan")]
    fn scanned_items_keep_the_scan() {
        let result = crate::scan::ScanResult {
            payload: "hello".to_string(),
            source_label: Some("photo.png".to_string()),
            timestamp: 42,
        };
        let mut history = History::new(MemoryStorage::default());
        let stored = history.add_item(NewItem::scanned(&result)).unwrap();
        assert_eq!(stored.kind, ItemKind::Scanned);
        let record = stored.scan_result.unwrap();
        assert_eq!(record.file.as_deref(), Some("photo.png"));
        assert_eq!(record.raw_text.as_deref(), Some("hello"));
    }
}
