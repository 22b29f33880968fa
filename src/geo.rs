use crate::error::{Permission, ReportError, Result};
use crate::types::Coordinates;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Device location services.
#[allow(async_fn_in_trait)]
pub trait Locator {
    async fn request_foreground_permission(&mut self) -> PermissionStatus;

    async fn current_position(&mut self) -> std::result::Result<Coordinates, failure::Error>;
}

/// Asks for permission and reads the position exactly once. Nothing is
/// cached: every incident gets the position at the moment of capture.
pub async fn acquire_position<L: Locator>(locator: &mut L) -> Result<Coordinates> {
    if locator.request_foreground_permission().await != PermissionStatus::Granted {
        warn!("Location permission denied");
        return Err(ReportError::PermissionDenied(Permission::Location));
    }
    let position = locator
        .current_position()
        .await
        .map_err(|e| ReportError::LocationUnavailable(e.to_string()))?;
    info!(
        "Position acquired: {}, {}",
        position.latitude, position.longitude
    );
    Ok(position)
}

/// A locator pinned to one position, for hosts without location hardware.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    position: Coordinates,
}

impl FixedLocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        FixedLocator {
            position: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

impl Locator for FixedLocator {
    async fn request_foreground_permission(&mut self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&mut self) -> std::result::Result<Coordinates, failure::Error> {
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedLocator {
        permission: PermissionStatus,
        fix: Option<Coordinates>,
        fetches: usize,
    }

    impl Locator for ScriptedLocator {
        async fn request_foreground_permission(&mut self) -> PermissionStatus {
            self.permission
        }

        async fn current_position(&mut self) -> std::result::Result<Coordinates, failure::Error> {
            self.fetches += 1;
            self.fix.ok_or_else(|| format_err!("no fix"))
        }
    }

    #[tokio::test]
    async fn denied_permission_skips_the_fetch() {
        let mut locator = ScriptedLocator {
            permission: PermissionStatus::Denied,
            fix: None,
            fetches: 0,
        };
        let result = acquire_position(&mut locator).await;
        assert_eq!(result, Err(ReportError::PermissionDenied(Permission::Location)));
        assert_eq!(locator.fetches, 0);
    }

    #[tokio::test]
    async fn granted_permission_fetches_once() {
        let mut locator = ScriptedLocator {
            permission: PermissionStatus::Granted,
            fix: Some(Coordinates {
                latitude: 10.0,
                longitude: -20.0,
            }),
            fetches: 0,
        };
        let position = acquire_position(&mut locator).await.unwrap();
        assert_eq!(position.latitude, 10.0);
        assert_eq!(position.longitude, -20.0);
        assert_eq!(locator.fetches, 1);
    }

    #[tokio::test]
    async fn failed_fix_is_reported() {
        let mut locator = ScriptedLocator {
            permission: PermissionStatus::Granted,
            fix: None,
            fetches: 0,
        };
        assert_eq!(
            acquire_position(&mut locator).await,
            Err(ReportError::LocationUnavailable("no fix".to_string()))
        );
    }
}
