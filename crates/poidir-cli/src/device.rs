use async_trait::async_trait;
use poidir_core::Coordinate;
use poidir_search::{DeviceLocationSource, LocationError};

/// Device location for a terminal session: a fixed position from
/// `POIDIR_DEVICE_LATITUDE` / `POIDIR_DEVICE_LONGITUDE`, or no fix at all.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedDeviceLocation {
    coordinate: Option<Coordinate>,
}

impl FixedDeviceLocation {
    pub(crate) fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl DeviceLocationSource for FixedDeviceLocation {
    async fn current_location(&self) -> Result<Option<Coordinate>, LocationError> {
        if self.coordinate.is_none() {
            tracing::warn!(
                "no device position configured; set POIDIR_DEVICE_LATITUDE and POIDIR_DEVICE_LONGITUDE"
            );
        }
        Ok(self.coordinate)
    }
}
