use thiserror::Error;

/// Failures that stop a location resolution from producing a coordinate.
///
/// A missing fix or a failed geocode is not an error: the resolver falls back
/// to [`Coordinate::UNSET`](poidir_core::Coordinate::UNSET) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission not granted")]
    PermissionDenied,
}
