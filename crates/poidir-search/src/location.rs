//! "Current location" resolution with single-flight de-duplication.
//!
//! The first caller spawns one resolution task; callers that arrive while it
//! is running await the same shared result. A completed coordinate is cached
//! until [`LocationResolver::invalidate`] bumps the generation and aborts the
//! running task, so at most one device or geocoder call is outstanding and
//! callers waiting on the old task move on to the fresh one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use poidir_core::{Coordinate, Preferences};
use poidir_providers::ProviderRegistry;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::error::LocationError;

/// Platform location fixes.
#[async_trait]
pub trait DeviceLocationSource: Send + Sync {
    /// Latest fix, `Ok(None)` when the device has none.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::PermissionDenied`] when access is refused.
    async fn current_location(&self) -> Result<Option<Coordinate>, LocationError>;

    fn start_updates(&self) {}

    fn stop_updates(&self) {}
}

/// Outcome of one resolution task; `None` when the task was aborted.
type Resolution = Shared<BoxFuture<'static, Option<Result<Coordinate, LocationError>>>>;

/// The preferences a resolution was started from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationSource {
    use_device: bool,
    default_location: Option<String>,
}

impl LocationSource {
    fn current(preferences: &watch::Receiver<Preferences>) -> Self {
        let prefs = preferences.borrow();
        let (use_device, default_location) = prefs.location_source();
        Self {
            use_device,
            default_location: default_location.map(str::to_string),
        }
    }
}

enum Slot {
    Empty,
    Resolving {
        result: Resolution,
        abort: AbortHandle,
        source: LocationSource,
    },
    Resolved {
        coordinate: Coordinate,
        source: LocationSource,
    },
}

impl Slot {
    fn source(&self) -> Option<&LocationSource> {
        match self {
            Slot::Empty => None,
            Slot::Resolving { source, .. } | Slot::Resolved { source, .. } => Some(source),
        }
    }
}

struct CacheState {
    generation: u64,
    slot: Slot,
}

/// Everything a resolution needs, cloned into each in-flight future.
#[derive(Clone)]
struct Sources {
    device: Arc<dyn DeviceLocationSource>,
    registry: Arc<ProviderRegistry>,
    preferences: watch::Receiver<Preferences>,
}

struct Inner {
    sources: Sources,
    cache: Mutex<CacheState>,
}

/// Cheaply cloneable handle; clones share one cache.
#[derive(Clone)]
pub struct LocationResolver {
    inner: Arc<Inner>,
}

impl LocationResolver {
    #[must_use]
    pub fn new(
        device: Arc<dyn DeviceLocationSource>,
        registry: Arc<ProviderRegistry>,
        preferences: watch::Receiver<Preferences>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sources: Sources {
                    device,
                    registry,
                    preferences,
                },
                cache: Mutex::new(CacheState {
                    generation: 0,
                    slot: Slot::Empty,
                }),
            }),
        }
    }

    /// Returns the cached coordinate, joins the in-flight resolution, or
    /// starts a new one.
    ///
    /// A caller whose resolution is invalidated before it finishes waits for
    /// the resolution that replaced it. A cached or in-flight location taken
    /// from a different location source than the current preferences is
    /// replaced here, without waiting for [`Self::invalidate`].
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::PermissionDenied`] if the device source
    /// refuses access. The failure is not cached.
    pub async fn resolve(&self) -> Result<Coordinate, LocationError> {
        loop {
            let source = LocationSource::current(&self.inner.sources.preferences);
            let (generation, pending) = {
                let mut cache = self.inner.lock();
                if cache.slot.source().is_some_and(|cached| *cached != source) {
                    tracing::debug!("location source changed; discarding cached location");
                    cache.reset();
                }
                let joined = match &cache.slot {
                    Slot::Resolved { coordinate, .. } => return Ok(*coordinate),
                    Slot::Resolving { result, .. } => Some(result.clone()),
                    Slot::Empty => None,
                };
                let pending = joined.unwrap_or_else(|| {
                    let (result, abort) = self.start(cache.generation, source.clone());
                    cache.slot = Slot::Resolving {
                        result: result.clone(),
                        abort,
                        source,
                    };
                    result
                });
                (cache.generation, pending)
            };

            let outcome = pending.await;
            if self.inner.lock().generation != generation {
                tracing::debug!(generation, "location invalidated while resolving; retrying");
                continue;
            }
            return outcome.unwrap_or_else(|| {
                tracing::error!(generation, "location resolution task failed");
                self.inner.clear_failed(generation);
                Ok(Coordinate::UNSET)
            });
        }
    }

    /// Drops the cached location, aborts any in-flight resolution, and
    /// starts one fresh resolution in the background.
    pub fn invalidate(&self) {
        {
            let mut cache = self.inner.lock();
            cache.reset();
            tracing::debug!(generation = cache.generation, "location cache invalidated");
        }
        self.prefetch();
    }

    /// Invalidates unless the cached or in-flight location already comes
    /// from the current location source.
    pub(crate) fn refresh_if_source_changed(&self) {
        let source = LocationSource::current(&self.inner.sources.preferences);
        let current = self.inner.lock().slot.source() == Some(&source);
        if !current {
            self.invalidate();
        }
    }

    /// Warms the cache without waiting for the result.
    pub fn prefetch(&self) {
        let resolver = self.clone();
        tokio::spawn(async move {
            if let Err(error) = resolver.resolve().await {
                tracing::error!(%error, "location prefetch failed");
            }
        });
    }

    /// The cached coordinate, if a resolution has completed.
    #[must_use]
    pub fn cached(&self) -> Option<Coordinate> {
        match self.inner.lock().slot {
            Slot::Resolved { coordinate, .. } => Some(coordinate),
            Slot::Empty | Slot::Resolving { .. } => None,
        }
    }

    /// Human-readable address for `coordinate` from the selected provider.
    pub async fn describe(&self, coordinate: Coordinate) -> Option<String> {
        if !coordinate.is_valid() {
            return None;
        }
        let provider = self.inner.sources.preferences.borrow().provider;
        let geocoder = self.inner.sources.registry.geocoder(provider)?;
        geocoder.address(coordinate).await
    }

    fn start(&self, generation: u64, source: LocationSource) -> (Resolution, AbortHandle) {
        let sources = self.inner.sources.clone();
        let owner: Weak<Inner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            let result = sources.fetch(&source).await;
            if let Some(inner) = owner.upgrade() {
                inner.settle(generation, source, result);
            }
            result
        });
        let abort = task.abort_handle();
        (task.map(Result::ok).boxed().shared(), abort)
    }
}

impl CacheState {
    /// Bumps the generation and aborts any running resolution.
    fn reset(&mut self) {
        self.generation += 1;
        if let Slot::Resolving { abort, .. } = &self.slot {
            abort.abort();
        }
        self.slot = Slot::Empty;
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Slot::Resolving { abort, .. } = &self.lock().slot {
            abort.abort();
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the outcome unless the cache was invalidated meanwhile.
    fn settle(
        &self,
        generation: u64,
        source: LocationSource,
        result: Result<Coordinate, LocationError>,
    ) {
        let mut cache = self.lock();
        if cache.generation != generation {
            tracing::debug!(generation, "discarding location from stale resolution");
            return;
        }
        cache.slot = match result {
            Ok(coordinate) => Slot::Resolved { coordinate, source },
            Err(_) => Slot::Empty,
        };
    }

    /// Empties a slot whose task ended without settling.
    fn clear_failed(&self, generation: u64) {
        let mut cache = self.lock();
        if cache.generation == generation && matches!(cache.slot, Slot::Resolving { .. }) {
            cache.slot = Slot::Empty;
        }
    }
}

impl Sources {
    async fn fetch(&self, source: &LocationSource) -> Result<Coordinate, LocationError> {
        let use_device = source.use_device;
        let default_location = source.default_location.clone();
        let provider = self.preferences.borrow().provider;
        let started = Instant::now();

        let found = if use_device {
            let _updates = DeviceUpdates::start(self.device.as_ref());
            self.device.current_location().await?
        } else if let Some(address) = default_location.filter(|a| !a.trim().is_empty()) {
            match self.registry.geocoder(provider) {
                Some(geocoder) => geocoder.coordinates(&address).await,
                None => {
                    tracing::error!(%provider, "no geocoder registered for provider");
                    None
                }
            }
        } else {
            None
        };

        let coordinate = found
            .filter(Coordinate::is_valid)
            .unwrap_or(Coordinate::UNSET);
        if coordinate.is_valid() {
            tracing::debug!(
                source = if use_device { "device" } else { "default_location" },
                %provider,
                elapsed_ms = started.elapsed().as_millis(),
                "location resolved"
            );
        } else {
            tracing::warn!(
                use_device,
                "using fallback location (0,0); no valid device or default location available"
            );
        }
        Ok(coordinate)
    }
}

/// Keeps device updates running for one fix; stops them even when the
/// resolution is aborted mid-call.
struct DeviceUpdates<'a>(&'a dyn DeviceLocationSource);

impl<'a> DeviceUpdates<'a> {
    fn start(device: &'a dyn DeviceLocationSource) -> Self {
        device.start_updates();
        Self(device)
    }
}

impl Drop for DeviceUpdates<'_> {
    fn drop(&mut self) {
        self.0.stop_updates();
    }
}
