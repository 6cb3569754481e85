//! Location of the host machine
//!
//! Used by the "move to my location" action. Both preconditions are checked
//! before any device logic runs so the operator gets a descriptive error
//! instead of a silent no-op.

use locswitch_core::prelude::*;
use locswitch_core::Coordinate;

/// Source of the host machine's own location
#[trait_variant::make(HostLocationProvider: Send)]
pub trait LocalHostLocationProvider {
    /// Whether the operator allowed location services at all
    async fn is_service_enabled(&self) -> bool;

    /// Current fix, if one can be obtained
    async fn current_location(&self) -> Option<Coordinate>;
}

/// Resolve the host location, mapping each failed precondition to its error
pub async fn resolve_host_location<H: HostLocationProvider>(host: &H) -> Result<Coordinate> {
    if !host.is_service_enabled().await {
        warn!("Host location requested but location services are disabled");
        return Err(Error::HostLocationDisabled);
    }

    host.current_location()
        .await
        .filter(Coordinate::is_valid)
        .ok_or_else(|| {
            warn!("Host location requested but no fix is available");
            Error::HostLocationUnavailable
        })
}

/// Host location taken from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticHostLocation {
    enabled: bool,
    location: Option<Coordinate>,
}

impl StaticHostLocation {
    pub fn new(enabled: bool, location: Option<Coordinate>) -> Self {
        Self { enabled, location }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

impl HostLocationProvider for StaticHostLocation {
    async fn is_service_enabled(&self) -> bool {
        self.enabled
    }

    async fn current_location(&self) -> Option<Coordinate> {
        self.location
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_host_location, StaticHostLocation};
    use locswitch_core::{Coordinate, Error};

    #[tokio::test]
    async fn test_disabled_service() {
        let host = StaticHostLocation::new(false, Some(Coordinate::new(1.0, 2.0)));
        let err = resolve_host_location(&host).await.unwrap_err();
        assert!(matches!(err, Error::HostLocationDisabled));
    }

    #[tokio::test]
    async fn test_no_fix() {
        let host = StaticHostLocation::new(true, None);
        let err = resolve_host_location(&host).await.unwrap_err();
        assert!(matches!(err, Error::HostLocationUnavailable));
    }

    #[tokio::test]
    async fn test_invalid_fix_is_unavailable() {
        let host = StaticHostLocation::new(true, Some(Coordinate::new(100.0, 0.0)));
        let err = resolve_host_location(&host).await.unwrap_err();
        assert!(matches!(err, Error::HostLocationUnavailable));
    }

    #[tokio::test]
    async fn test_resolves_fix() {
        let fix = Coordinate::new(52.52, 13.405);
        let host = StaticHostLocation::new(true, Some(fix));
        assert_eq!(resolve_host_location(&host).await.unwrap(), fix);
    }

    #[test]
    fn test_disabled_constructor() {
        let host = StaticHostLocation::disabled();
        let err = tokio_test::block_on(resolve_host_location(&host)).unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }
}
