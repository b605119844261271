//! Test doubles and common utilities for reconciler contract tests
//!
//! These doubles keep all state in memory behind `Arc<Mutex<..>>` so a test
//! can hand a clone to the reconciler and inspect the shared state afterwards.

#![allow(dead_code)]

use meshdns_core::error::{Error, Result};
use meshdns_core::traits::{ExistingRecord, Host, HostDirectory, HostPage, RecordSpec, RecordStore};
use meshdns_core::{ReconcileConfig, ReconcileEvent, Reconciler, Reporter, ZoneRef};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

/// Upper bound on directory calls before the double refuses to answer
pub const DIRECTORY_CALL_LIMIT: usize = 1000;

/// One scripted directory response
#[derive(Debug, Clone)]
pub enum PageScript {
    Page(HostPage),
    Fail(String),
}

/// A HostDirectory replaying a fixed sequence of pages
///
/// Calls past the end of the script replay the last entry.
#[derive(Clone)]
pub struct ScriptedHostDirectory {
    script: Arc<Vec<PageScript>>,
    cursors: Arc<Mutex<Vec<String>>>,
}

impl ScriptedHostDirectory {
    pub fn new(script: Vec<PageScript>) -> Self {
        assert!(!script.is_empty(), "script needs at least one page");
        Self {
            script: Arc::new(script),
            cursors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A directory returning all hosts on one page
    pub fn single_page(hosts: Vec<Host>) -> Self {
        Self::new(vec![PageScript::Page(last_page(hosts))])
    }

    /// Cursors received, in call order
    pub fn cursors(&self) -> Vec<String> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.cursors.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HostDirectory for ScriptedHostDirectory {
    async fn list_hosts(&self, cursor: &str) -> Result<HostPage> {
        let call = {
            let mut cursors = self.cursors.lock().unwrap();
            cursors.push(cursor.to_string());
            cursors.len() - 1
        };

        if call >= DIRECTORY_CALL_LIMIT {
            return Err(Error::upstream("scripted", "call limit exceeded"));
        }

        let entry = &self.script[call.min(self.script.len() - 1)];
        match entry {
            PageScript::Page(page) => Ok(page.clone()),
            PageScript::Fail(message) => Err(Error::upstream("scripted", message.clone())),
        }
    }

    fn directory_name(&self) -> &'static str {
        "scripted"
    }
}

/// A page that continues at `next_cursor`
pub fn page(hosts: Vec<Host>, next_cursor: &str) -> HostPage {
    HostPage {
        hosts,
        has_next_page: true,
        next_cursor: next_cursor.to_string(),
    }
}

/// The final page
pub fn last_page(hosts: Vec<Host>) -> HostPage {
    HostPage {
        hosts,
        has_next_page: false,
        next_cursor: String::new(),
    }
}

/// A record held by [`InMemoryRecordStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,
    pub name: String,
    pub record_type: &'static str,
    pub address: Ipv4Addr,
    pub ttl: u32,
    pub proxied: bool,
}

/// Calls observed by [`InMemoryRecordStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FindZone(String),
    ZoneName(String),
    List(Option<String>),
    Create(String),
    Update(String),
    Delete(String),
}

#[derive(Default)]
struct StoreState {
    zones: Vec<(String, String)>,
    records: Vec<StoredRecord>,
    next_id: usize,
    calls: Vec<StoreCall>,
    fail_create: HashSet<String>,
    fail_update: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_list: bool,
}

/// A RecordStore backed by a Vec, with failure injection by record name
///
/// Listing returns records of every type, like a zone-wide provider listing.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRecordStore {
    pub fn new(zone_id: &str, zone_name: &str) -> Self {
        let state = StoreState {
            zones: vec![(zone_id.to_string(), zone_name.to_string())],
            ..StoreState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Seed an A record, returning its ID
    pub fn seed(&self, name: &str, address: Ipv4Addr) -> String {
        self.seed_typed(name, "A", address)
    }

    /// Seed a record of any type, returning its ID
    pub fn seed_typed(&self, name: &str, record_type: &'static str, address: Ipv4Addr) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("seed-{}", state.next_id);
        state.records.push(StoredRecord {
            id: id.clone(),
            name: name.to_string(),
            record_type,
            address,
            ttl: 300,
            proxied: false,
        });
        id
    }

    pub fn fail_create_of(&self, name: &str) {
        self.state.lock().unwrap().fail_create.insert(name.to_string());
    }

    pub fn fail_update_of(&self, name: &str) {
        self.state.lock().unwrap().fail_update.insert(name.to_string());
    }

    pub fn fail_delete_of(&self, name: &str) {
        self.state.lock().unwrap().fail_delete.insert(name.to_string());
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn records_named(&self, name: &str) -> Vec<StoredRecord> {
        self.records().into_iter().filter(|r| r.name == name).collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records().into_iter().map(|r| r.name).collect();
        names.sort();
        names
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Create(_)))
    }

    pub fn update_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Update(_)))
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Delete(_)))
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn count(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_zone_id_by_name(&self, zone_name: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::FindZone(zone_name.to_string()));
        state
            .zones
            .iter()
            .find(|(_, name)| name == zone_name)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| Error::not_found(format!("zone {} not found", zone_name)))
    }

    async fn zone_name(&self, zone_id: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::ZoneName(zone_id.to_string()));
        state
            .zones
            .iter()
            .find(|(id, _)| id == zone_id)
            .map(|(_, name)| name.clone())
            .ok_or_else(|| Error::not_found(format!("zone {} not found", zone_id)))
    }

    async fn list_records(&self, _zone_id: &str, name: Option<&str>) -> Result<Vec<ExistingRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::List(name.map(str::to_string)));
        if state.fail_list {
            return Err(Error::upstream("memory", "list failed"));
        }
        Ok(state
            .records
            .iter()
            .filter(|r| name.is_none_or(|n| r.name == n))
            .map(|r| ExistingRecord::new(r.id.clone(), r.name.clone()))
            .collect())
    }

    async fn create_record(&self, _zone_id: &str, spec: &RecordSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Create(spec.name.clone()));
        if state.fail_create.contains(&spec.name) {
            return Err(Error::upstream("memory", format!("create of {} failed", spec.name)));
        }
        state.next_id += 1;
        let id = format!("rec-{}", state.next_id);
        state.records.push(StoredRecord {
            id: id.clone(),
            name: spec.name.clone(),
            record_type: "A",
            address: spec.address,
            ttl: spec.ttl,
            proxied: spec.proxied,
        });
        Ok(id)
    }

    async fn update_record(&self, _zone_id: &str, record_id: &str, spec: &RecordSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Update(record_id.to_string()));
        if state.fail_update.contains(&spec.name) {
            return Err(Error::upstream("memory", format!("update of {} failed", spec.name)));
        }
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(format!("record {} not found", record_id)))?;
        record.name = spec.name.clone();
        record.record_type = "A";
        record.address = spec.address;
        record.ttl = spec.ttl;
        record.proxied = spec.proxied;
        Ok(())
    }

    async fn delete_record(&self, _zone_id: &str, record_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Delete(record_id.to_string()));
        let name = state
            .records
            .iter()
            .find(|r| r.id == record_id)
            .map(|r| r.name.clone())
            .ok_or_else(|| Error::not_found(format!("record {} not found", record_id)))?;
        if state.fail_delete.contains(&name) {
            return Err(Error::upstream("memory", format!("delete of {} failed", name)));
        }
        state.records.retain(|r| r.id != record_id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// A Reporter that keeps every event
#[derive(Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReconcileEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &ReconcileEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub const ZONE_ID: &str = "zone-123";
pub const ZONE_NAME: &str = "example.com";

/// Config managing `example.com` by name with an empty filter
pub fn zone_config() -> ReconcileConfig {
    let mut config = ReconcileConfig::new(ZoneRef::Name(ZONE_NAME.to_string()));
    config.append_suffix = Some(ZONE_NAME.to_string());
    config
}

/// Same as [`zone_config`] with pruning on
pub fn pruning_config() -> ReconcileConfig {
    let mut config = zone_config();
    config.prune = true;
    config
}

pub fn host(id: &str, name: &str, address: [u8; 4]) -> Host {
    Host::new(id, name, Ipv4Addr::from(address))
}

/// Build a reconciler sharing state with the given doubles
pub fn reconciler(
    directory: &ScriptedHostDirectory,
    store: &InMemoryRecordStore,
    reporter: &RecordingReporter,
    config: ReconcileConfig,
) -> Reconciler {
    Reconciler::new(Box::new(directory.clone()), Box::new(store.clone()), config)
        .with_reporter(Box::new(reporter.clone()))
}
