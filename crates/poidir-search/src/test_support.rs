//! In-memory fakes for resolver and coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use poidir_core::{Address, CategoryCode, Coordinate, PlaceRecord, ProviderKind};
use poidir_providers::{Geocoder, PlacesProvider, ProviderRegistry, SearchError, SearchRequest};
use tokio_util::sync::CancellationToken;

use crate::error::LocationError;
use crate::location::DeviceLocationSource;

pub(crate) fn place(name: &str) -> PlaceRecord {
    PlaceRecord {
        name: name.to_string(),
        address: Address::default(),
        hours: Vec::new(),
        phone: None,
        description: String::new(),
        website: None,
        coordinate: None,
        provider_place_id: Some(format!("id:{name}")),
    }
}

pub(crate) fn registry_with(
    entries: &[(ProviderKind, Arc<FakeProvider>, Arc<FakeGeocoder>)],
) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for (kind, provider, geocoder) in entries {
        registry.insert(*kind, provider.clone(), geocoder.clone());
    }
    Arc::new(registry)
}

pub(crate) struct FakeDevice {
    fix: Mutex<Result<Option<Coordinate>, LocationError>>,
    delay_ms: AtomicU64,
    pub calls: AtomicUsize,
    /// Calls currently awaiting a fix; dropped (aborted) calls count down.
    pub outstanding: AtomicUsize,
    pub max_outstanding: AtomicUsize,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
}

struct Outstanding<'a>(&'a AtomicUsize);

impl Drop for Outstanding<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeDevice {
    fn with_result(result: Result<Option<Coordinate>, LocationError>) -> Arc<Self> {
        Arc::new(Self {
            fix: Mutex::new(result),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            max_outstanding: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
            stopped: AtomicUsize::new(0),
        })
    }

    pub fn fixed(coordinate: Coordinate) -> Arc<Self> {
        Self::with_result(Ok(Some(coordinate)))
    }

    pub fn no_fix() -> Arc<Self> {
        Self::with_result(Ok(None))
    }

    pub fn denied() -> Arc<Self> {
        Self::with_result(Err(LocationError::PermissionDenied))
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        self.delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
        self
    }

    pub fn set_fix(&self, coordinate: Option<Coordinate>) {
        *self.fix.lock().unwrap() = Ok(coordinate);
    }
}

#[async_trait]
impl DeviceLocationSource for FakeDevice {
    async fn current_location(&self) -> Result<Option<Coordinate>, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);
        let _outstanding = Outstanding(&self.outstanding);
        let result = *self.fix.lock().unwrap();
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        result
    }

    fn start_updates(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_updates(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakeGeocoder {
    coordinate: Option<Coordinate>,
    address: Mutex<Option<String>>,
    lookups: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn returning(coordinate: Option<Coordinate>) -> Arc<Self> {
        Arc::new(Self {
            coordinate,
            address: Mutex::new(None),
            lookups: Mutex::new(Vec::new()),
        })
    }

    pub fn with_address(self: Arc<Self>, address: &str) -> Arc<Self> {
        *self.address.lock().unwrap() = Some(address.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn coordinates(&self, address: &str) -> Option<Coordinate> {
        self.lookups.lock().unwrap().push(address.to_string());
        self.coordinate
    }

    async fn address(&self, _coordinate: Coordinate) -> Option<String> {
        self.address.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedSearch {
    pub query: String,
    pub category: Option<CategoryCode>,
    pub coordinate: Coordinate,
}

/// Returns one place named `"<kind> <query>"` after a per-query delay.
pub(crate) struct FakeProvider {
    kind: ProviderKind,
    delays: Mutex<HashMap<String, Duration>>,
    honor_cancel: AtomicBool,
    calls: Mutex<Vec<RecordedSearch>>,
}

impl FakeProvider {
    pub fn new(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            delays: Mutex::new(HashMap::new()),
            honor_cancel: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_delay(self: Arc<Self>, query: &str, delay: Duration) -> Arc<Self> {
        self.delays.lock().unwrap().insert(query.to_string(), delay);
        self
    }

    /// Makes `search` finish its delay even after cancellation, like a
    /// backend whose response is already on the wire.
    pub fn ignoring_cancel(self: Arc<Self>) -> Arc<Self> {
        self.honor_cancel.store(false, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<RecordedSearch> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<PlaceRecord>, SearchError> {
        let query = request.trimmed_query().to_string();
        self.calls.lock().unwrap().push(RecordedSearch {
            query: query.clone(),
            category: request.category.clone(),
            coordinate: request.coordinate,
        });
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(&query)
            .copied()
            .unwrap_or(Duration::from_millis(20));

        if self.honor_cancel.load(Ordering::SeqCst) {
            tokio::select! {
                biased;
                () = request.cancel.cancelled() => return Err(SearchError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        } else {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![place(&format!("{} {query}", self.kind))])
    }

    async fn autocomplete(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, SearchError> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        Ok(vec![format!("{} {}", self.kind, query.trim())])
    }

    async fn details(&self, place_id: &str) -> Option<PlaceRecord> {
        let mut record = place(place_id.trim_start_matches("id:"));
        record.website = Some(format!("https://{}.example", self.kind));
        Some(record)
    }
}
