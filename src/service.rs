use serde_json::Value;

use crate::collections::{
    CollectionRegistry, CollectionSpec, GeneratedField, ELEVES, FINANCES, PROFESSEURS,
};
use crate::config::AppConfig;
use crate::matricule::MatriculePolicy;
use crate::records::{
    now_timestamp, record_id, shallow_merge, Record, CREATED_AT_FIELD, ID_FIELD,
};
use crate::stats::{compute_stats, Stats};
use crate::store::{next_id, RecordStore};

/// Fields a client can never overwrite.
const SERVER_FIELDS: [&str; 2] = [ID_FIELD, CREATED_AT_FIELD];

/// Result of a create or update: the confirmation text and the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub message: String,
    pub record: Record,
}

/// CRUD over every registered collection, plus the dashboard statistics.
#[derive(Debug)]
pub struct DataService {
    store: RecordStore,
    collections: CollectionRegistry,
    matricule: MatriculePolicy,
}

impl DataService {
    pub fn new(store: RecordStore, collections: CollectionRegistry, matricule: MatriculePolicy) -> Self {
        Self {
            store,
            collections,
            matricule,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            RecordStore::new(config.path_resolver(), config.write_access),
            CollectionRegistry::default(),
            config.matricule.clone(),
        )
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn collections(&self) -> &CollectionRegistry {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.get(name)
    }

    pub fn matricule_policy(&self) -> &MatriculePolicy {
        &self.matricule
    }

    pub fn list(&self, spec: &CollectionSpec) -> anyhow::Result<Vec<Record>> {
        self.store.load(spec.name)
    }

    pub fn create(&self, spec: &CollectionSpec, input: Record) -> anyhow::Result<Mutation> {
        let created = self.store.modify(spec.name, |records| {
            let mut record = Record::new();
            record.insert(ID_FIELD.to_string(), Value::from(next_id(records)?));
            // a null generated field is replaced, not copied over the generated value
            let generated = spec.generated.filter(|f| !spec.input_supplies(*f, &input));
            if let Some(field) = generated {
                record.insert(field.key().to_string(), self.generate(field, records));
            }
            for (k, v) in input {
                if SERVER_FIELDS.contains(&k.as_str()) {
                    continue;
                }
                if generated.is_some_and(|f| f.key() == k) {
                    continue;
                }
                record.insert(k, v);
            }
            record.insert(CREATED_AT_FIELD.to_string(), Value::from(now_timestamp()));
            records.push(record.clone());
            Ok(Some(record))
        })?;
        // modify only yields None when the closure does
        let record = created.unwrap_or_default();
        tracing::info!(collection = spec.name, id = record_id(&record), "record created");
        Ok(Mutation {
            message: spec.created_message(),
            record,
        })
    }

    /// `Ok(None)` when no record has `id`; the collection is left untouched.
    pub fn update(
        &self,
        spec: &CollectionSpec,
        id: Option<i64>,
        input: &Record,
    ) -> anyhow::Result<Option<Mutation>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let updated = self.store.modify(spec.name, |records| {
            let Some(existing) = records.iter_mut().find(|r| record_id(r) == Some(id)) else {
                return Ok(None);
            };
            *existing = shallow_merge(existing, input, &SERVER_FIELDS);
            Ok(Some(existing.clone()))
        })?;
        match updated {
            Some(record) => {
                tracing::info!(collection = spec.name, id, "record updated");
                Ok(Some(Mutation {
                    message: spec.updated_message(),
                    record,
                }))
            }
            None => {
                tracing::debug!(collection = spec.name, id, "update target missing");
                Ok(None)
            }
        }
    }

    /// Removes every record with `id`. A miss is not an error; the collection is rewritten either way.
    pub fn delete(&self, spec: &CollectionSpec, id: Option<i64>) -> anyhow::Result<String> {
        let removed = self
            .store
            .modify(spec.name, |records| {
                let before = records.len();
                records.retain(|r| id.is_none() || record_id(r) != id);
                Ok(Some(before - records.len()))
            })?
            .unwrap_or(0);
        tracing::info!(collection = spec.name, id, removed, "record delete");
        Ok(spec.deleted_message())
    }

    pub fn stats(&self) -> anyhow::Result<Stats> {
        let professeurs = self.store.load(PROFESSEURS)?;
        let eleves = self.store.load(ELEVES)?;
        let finances = self.store.load(FINANCES)?;
        Ok(compute_stats(&professeurs, &eleves, &finances))
    }

    fn generate(&self, field: GeneratedField, records: &[Record]) -> Value {
        match field {
            GeneratedField::Matricule => Value::from(self.matricule.generate(records.len())),
        }
    }
}
