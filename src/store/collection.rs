//! # Balade Collection
//!
//! The record store contract and its embedded document-collection
//! implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, RwLock, RwLockReadGuard};

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::balade::{parse_id, Balade, NewBalade};
use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::filter::{Filter, SortBy};
use super::persist::CollectionFile;

/// Number of members sharing one value of the grouping field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: Option<String>,
    pub total: u64,
}

/// Outcome of an update that may touch zero or more records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateOutcome {
    fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

/// Outcome of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

/// Operations the HTTP layer needs from the underlying store.
///
/// Every id-keyed operation fails with `InvalidIdentifier` on an id that
/// does not parse, and reports "no match" through its return value.
pub trait BaladeStore: Send + Sync {
    /// Every record, in insertion order
    fn find_all(&self) -> StoreResult<Vec<Balade>>;

    fn find_by_id(&self, id: &str) -> StoreResult<Option<Balade>>;

    /// Records matching `filter`, optionally sorted
    fn find_by_filter(&self, filter: &Filter, sort: Option<&SortBy>) -> StoreResult<Vec<Balade>>;

    fn count_by_filter(&self, filter: &Filter) -> StoreResult<u64>;

    /// Group every record by the value of `field` and count each group
    fn aggregate_group_count(&self, field: &str) -> StoreResult<Vec<GroupCount>>;

    /// Sorted distinct values of `field`; array fields contribute each element
    fn distinct_values(&self, field: &str) -> StoreResult<Vec<String>>;

    /// Persist a new record under a freshly assigned identifier
    fn insert(&self, balade: NewBalade) -> StoreResult<Balade>;

    /// Insert several records at once
    fn insert_many(&self, balades: Vec<NewBalade>) -> StoreResult<Vec<Balade>> {
        balades.into_iter().map(|b| self.insert(b)).collect()
    }

    /// Add `value` to the array `field` of one record unless already present
    fn update_add_to_set(&self, id: &str, field: &str, value: &Value)
        -> StoreResult<UpdateOutcome>;

    /// Merge `patch` into one record and return the new version
    fn update_by_id(&self, id: &str, patch: &Map<String, Value>) -> StoreResult<Option<Balade>>;

    /// Set `updates` on every record matching `filter`
    fn update_many_by_filter(
        &self,
        filter: &Filter,
        updates: &Map<String, Value>,
    ) -> StoreResult<UpdateOutcome>;

    fn delete_by_id(&self, id: &str) -> StoreResult<DeleteOutcome>;
}

/// Embedded document collection, optionally backed by a JSON file
pub struct DocumentStore {
    /// Records in insertion order
    records: RwLock<Vec<Balade>>,

    /// Serializes writers. Readers only wait for the final swap.
    writer: Mutex<()>,

    /// Backing file, `None` for a memory-only store
    file: Option<CollectionFile>,
}

impl DocumentStore {
    /// Memory-only store
    pub fn in_memory() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            writer: Mutex::new(()),
            file: None,
        }
    }

    /// Open the store described by `config`, loading any persisted records
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let Some(data_dir) = &config.data_dir else {
            tracing::warn!("no data directory configured, balades will not survive a restart");
            return Ok(Self::in_memory());
        };

        let file = CollectionFile::new(data_dir, &config.database, &config.collection);
        let records = file.load()?;
        tracing::info!(
            path = %file.path().display(),
            records = records.len(),
            "opened balade store"
        );

        Ok(Self {
            records: RwLock::new(records),
            writer: Mutex::new(()),
            file: Some(file),
        })
    }

    /// Number of stored records
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Whether writes reach a backing file
    pub fn is_persistent(&self) -> bool {
        self.file.is_some()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<Balade>>> {
        self.records.read().map_err(|_| StoreError::Poisoned)
    }

    /// Apply `change` to a staged copy of the collection.
    ///
    /// `change` returns its result and whether anything was modified. The
    /// staged copy replaces the live one only after it has been persisted.
    /// Readers keep seeing the previous version while the file is written.
    fn mutate<R>(
        &self,
        change: impl FnOnce(&mut Vec<Balade>) -> StoreResult<(R, bool)>,
    ) -> StoreResult<R> {
        let _writer = self.writer.lock().map_err(|_| StoreError::Poisoned)?;

        let mut staged = self.read()?.clone();
        let (result, modified) = change(&mut staged)?;
        if !modified {
            return Ok(result);
        }

        if let Some(file) = &self.file {
            file.save(&staged)?;
        }
        *self.records.write().map_err(|_| StoreError::Poisoned)? = staged;

        Ok(result)
    }
}

fn position(records: &[Balade], id: Uuid) -> Option<usize> {
    records.iter().position(|b| b.id == id)
}

/// Stringified grouping key; absent and null values share the `None` group
fn group_key(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

impl BaladeStore for DocumentStore {
    fn find_all(&self) -> StoreResult<Vec<Balade>> {
        Ok(self.read()?.clone())
    }

    fn find_by_id(&self, id: &str) -> StoreResult<Option<Balade>> {
        let id = parse_id(id)?;
        Ok(self.read()?.iter().find(|b| b.id == id).cloned())
    }

    fn find_by_filter(&self, filter: &Filter, sort: Option<&SortBy>) -> StoreResult<Vec<Balade>> {
        let records = self.read()?;

        let mut matched = Vec::new();
        for balade in records.iter() {
            let doc = balade.to_document()?;
            if filter.matches(&doc) {
                matched.push((doc, balade));
            }
        }

        if let Some(sort) = sort {
            matched.sort_by(|(a, _), (b, _)| sort.compare(a, b));
        }

        Ok(matched.into_iter().map(|(_, b)| b.clone()).collect())
    }

    fn count_by_filter(&self, filter: &Filter) -> StoreResult<u64> {
        let records = self.read()?;

        let mut count = 0;
        for balade in records.iter() {
            if filter.matches(&balade.to_document()?) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn aggregate_group_count(&self, field: &str) -> StoreResult<Vec<GroupCount>> {
        let records = self.read()?;

        let mut groups: BTreeMap<Option<String>, u64> = BTreeMap::new();
        for balade in records.iter() {
            let doc = balade.to_document()?;
            *groups.entry(group_key(doc.get(field))).or_default() += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(key, total)| GroupCount { key, total })
            .collect())
    }

    fn distinct_values(&self, field: &str) -> StoreResult<Vec<String>> {
        let records = self.read()?;

        let mut values = BTreeSet::new();
        for balade in records.iter() {
            let doc = balade.to_document()?;
            match doc.get(field) {
                Some(Value::Array(items)) => {
                    values.extend(items.iter().filter_map(|v| group_key(Some(v))));
                }
                other => values.extend(group_key(other)),
            }
        }

        Ok(values.into_iter().collect())
    }

    fn insert(&self, balade: NewBalade) -> StoreResult<Balade> {
        let balade = balade.with_id(Uuid::new_v4());
        let stored = balade.clone();

        self.mutate(|records| {
            records.push(balade);
            Ok(((), true))
        })?;

        tracing::debug!(id = %stored.id, "inserted balade");
        Ok(stored)
    }

    fn insert_many(&self, balades: Vec<NewBalade>) -> StoreResult<Vec<Balade>> {
        let stored: Vec<Balade> = balades
            .into_iter()
            .map(|b| b.with_id(Uuid::new_v4()))
            .collect();
        let modified = !stored.is_empty();

        self.mutate(|records| {
            records.extend(stored.iter().cloned());
            Ok(((), modified))
        })?;

        tracing::debug!(count = stored.len(), "inserted balades");
        Ok(stored)
    }

    fn update_add_to_set(
        &self,
        id: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<UpdateOutcome> {
        let id = parse_id(id)?;

        self.mutate(|records| {
            let Some(idx) = position(records, id) else {
                return Ok((UpdateOutcome::new(0, 0), false));
            };

            match records[idx].with_added_to_set(field, value)? {
                Some(updated) => {
                    records[idx] = updated;
                    Ok((UpdateOutcome::new(1, 1), true))
                }
                None => Ok((UpdateOutcome::new(1, 0), false)),
            }
        })
    }

    fn update_by_id(&self, id: &str, patch: &Map<String, Value>) -> StoreResult<Option<Balade>> {
        let id = parse_id(id)?;

        self.mutate(|records| {
            let Some(idx) = position(records, id) else {
                return Ok((None, false));
            };

            let updated = records[idx].patched(patch)?;
            let modified = updated != records[idx];
            records[idx] = updated.clone();
            Ok((Some(updated), modified))
        })
    }

    fn update_many_by_filter(
        &self,
        filter: &Filter,
        updates: &Map<String, Value>,
    ) -> StoreResult<UpdateOutcome> {
        let outcome = self.mutate(|records| {
            let mut matched = 0;
            let mut modified = 0;

            for balade in records.iter_mut() {
                if !filter.matches(&balade.to_document()?) {
                    continue;
                }
                matched += 1;

                let updated = balade.patched(updates)?;
                if updated != *balade {
                    *balade = updated;
                    modified += 1;
                }
            }

            Ok((UpdateOutcome::new(matched, modified), modified > 0))
        })?;

        tracing::debug!(
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "bulk update applied"
        );
        Ok(outcome)
    }

    fn delete_by_id(&self, id: &str) -> StoreResult<DeleteOutcome> {
        let id = parse_id(id)?;

        self.mutate(|records| match position(records, id) {
            Some(idx) => {
                records.remove(idx);
                Ok((DeleteOutcome { deleted_count: 1 }, true))
            }
            None => Ok((DeleteOutcome { deleted_count: 0 }, false)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_balade(doc: Value) -> NewBalade {
        NewBalade::from_document(doc).unwrap()
    }

    fn parc(name: &str, code_postal: &str) -> NewBalade {
        new_balade(json!({
            "nom_poi": name,
            "adresse": "1 Rue X",
            "categorie": "parc",
            "code_postal": code_postal
        }))
    }

    #[test]
    fn test_insert_and_find_by_id() {
        let store = DocumentStore::in_memory();
        let stored = store.insert(parc("Parc A", "75001")).unwrap();

        let found = store.find_by_id(&stored.id.to_string()).unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(found.fields.nom_poi.as_deref(), Some("Parc A"));
    }

    #[test]
    fn test_find_all_keeps_insertion_order() {
        let store = DocumentStore::in_memory();
        store.insert(parc("B", "75001")).unwrap();
        store.insert(parc("A", "75001")).unwrap();

        let names: Vec<_> = store
            .find_all()
            .unwrap()
            .into_iter()
            .filter_map(|b| b.fields.nom_poi)
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_unknown_valid_id_is_absent() {
        let store = DocumentStore::in_memory();
        let id = Uuid::new_v4().to_string();

        assert!(store.find_by_id(&id).unwrap().is_none());
        assert!(store.update_by_id(&id, &Map::new()).unwrap().is_none());
        assert_eq!(store.delete_by_id(&id).unwrap().deleted_count, 0);
    }

    #[test]
    fn test_malformed_id_is_rejected_everywhere() {
        let store = DocumentStore::in_memory();

        assert!(matches!(
            store.find_by_id("42"),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            store.update_by_id("42", &Map::new()),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            store.delete_by_id("42"),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            store.update_add_to_set("42", "mot_cle", &json!("x")),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_add_to_set_is_idempotent() {
        let store = DocumentStore::in_memory();
        let id = store.insert(parc("Parc A", "75001")).unwrap().id.to_string();

        let first = store.update_add_to_set(&id, "mot_cle", &json!("jeux")).unwrap();
        let second = store.update_add_to_set(&id, "mot_cle", &json!("jeux")).unwrap();
        assert_eq!(first, UpdateOutcome::new(1, 1));
        assert_eq!(second, UpdateOutcome::new(1, 0));

        let balade = store.find_by_id(&id).unwrap().unwrap();
        assert_eq!(balade.fields.mot_cle, vec!["jeux"]);
    }

    #[test]
    fn test_add_to_set_unknown_record() {
        let store = DocumentStore::in_memory();
        let outcome = store
            .update_add_to_set(&Uuid::new_v4().to_string(), "mot_cle", &json!("x"))
            .unwrap();
        assert_eq!(outcome.matched_count, 0);
    }

    #[test]
    fn test_group_count_by_postal_code() {
        let store = DocumentStore::in_memory();
        store.insert(parc("A", "75001")).unwrap();
        store.insert(parc("B", "75001")).unwrap();
        store.insert(parc("C", "75002")).unwrap();

        let groups = store.aggregate_group_count("code_postal").unwrap();
        assert_eq!(
            groups,
            vec![
                GroupCount {
                    key: Some("75001".into()),
                    total: 2
                },
                GroupCount {
                    key: Some("75002".into()),
                    total: 1
                },
            ]
        );
    }

    #[test]
    fn test_distinct_values_sorted() {
        let store = DocumentStore::in_memory();
        store.insert(parc("A", "75001")).unwrap();
        store
            .insert(new_balade(json!({
                "nom_poi": "B", "adresse": "x", "categorie": "musée"
            })))
            .unwrap();
        store.insert(parc("C", "75002")).unwrap();

        assert_eq!(store.distinct_values("categorie").unwrap(), vec!["musée", "parc"]);
    }

    #[test]
    fn test_count_and_sorted_find() {
        let store = DocumentStore::in_memory();
        for (name, date) in [("A", "2019-01-01"), ("B", "2018-06-01"), ("C", "2018-01-01")] {
            store
                .insert(new_balade(json!({
                    "nom_poi": name, "adresse": "x", "categorie": "parc", "date_saisie": date
                })))
                .unwrap();
        }

        let filter = Filter::prefix("date_saisie", "2018").unwrap();
        assert_eq!(store.count_by_filter(&filter).unwrap(), 2);

        let names: Vec<_> = store
            .find_by_filter(&filter, Some(&SortBy::ascending("date_saisie")))
            .unwrap()
            .into_iter()
            .filter_map(|b| b.fields.nom_poi)
            .collect();
        assert_eq!(names, vec!["C", "B"]);
    }

    #[test]
    fn test_update_many_sets_field_on_matches() {
        let store = DocumentStore::in_memory();
        store
            .insert(new_balade(json!({
                "nom_poi": "A", "adresse": "x", "categorie": "parc",
                "texte_description": "Au bord de la Seine"
            })))
            .unwrap();
        store.insert(parc("B", "75001")).unwrap();

        let filter = Filter::contains("texte_description", "seine").unwrap();
        let updates = json!({"nom_poi": "Quai"});
        let outcome = store
            .update_many_by_filter(&filter, updates.as_object().unwrap())
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::new(1, 1));

        let names: Vec<_> = store
            .find_all()
            .unwrap()
            .into_iter()
            .filter_map(|b| b.fields.nom_poi)
            .collect();
        assert_eq!(names, vec!["Quai", "B"]);
    }

    #[test]
    fn test_failed_patch_leaves_record_untouched() {
        let store = DocumentStore::in_memory();
        let stored = store.insert(parc("A", "75001")).unwrap();
        let id = stored.id.to_string();

        let patch = json!({"nom_poi": "B", "mot_cle": 3});
        assert!(matches!(
            store.update_by_id(&id, patch.as_object().unwrap()),
            Err(StoreError::InvalidDocument(_))
        ));
        assert_eq!(store.find_by_id(&id).unwrap().unwrap(), stored);
    }

    #[test]
    fn test_delete_removes_record() {
        let store = DocumentStore::in_memory();
        let id = store.insert(parc("A", "75001")).unwrap().id.to_string();

        assert_eq!(store.delete_by_id(&id).unwrap().deleted_count, 1);
        assert!(store.find_by_id(&id).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_failed_persist_leaves_collection_unchanged() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = DocumentStore::open(&StoreConfig::with_data_dir(tmp.path())).unwrap();
        assert!(store.is_persistent());

        std::fs::write(tmp.path().join("Paris"), "not a directory").unwrap();

        assert!(matches!(
            store.insert(parc("A", "75001")),
            Err(StoreError::Io { .. })
        ));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_concurrent_writers_keep_every_insert() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = StoreConfig::with_data_dir(tmp.path());
        let store = std::sync::Arc::new(DocumentStore::open(&config).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..5 {
                        store.insert(parc(&format!("P{i}-{j}"), "75001")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len().unwrap(), 40);
        assert_eq!(DocumentStore::open(&config).unwrap().len().unwrap(), 40);
    }

    #[test]
    fn test_open_without_data_dir_is_memory_only() {
        let store = DocumentStore::open(&StoreConfig::default()).unwrap();
        assert!(!store.is_persistent());
    }
}
