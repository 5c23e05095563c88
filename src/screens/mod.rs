//! Screen controllers.
//!
//! Each controller owns one screen's state, talks to the injected
//! [`Gateway`](crate::gateway::Gateway) and maps rows into view models. The
//! shared pieces live here: the [`AppContext`] handed to every screen, the
//! [`ScreenScope`] liveness guard, and [`ReadPolicy`], which decides whether
//! a failed read is masked with demo data.

pub mod camera;
pub mod challenges;
pub mod comments;
pub mod create_post;
pub mod feed;
pub mod map;
pub mod onboarding;
pub mod profile;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::Config;
use crate::error::ReadError;
use crate::gateway::{Gateway, GatewayError, SessionUser};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Dependencies shared by every screen.
#[derive(Clone)]
pub struct AppContext {
    pub gateway: Arc<dyn Gateway>,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, config: Config) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn read_policy(&self) -> ReadPolicy {
        ReadPolicy {
            demo_mode: self.config.demo_mode,
        }
    }

    /// The signed-in user, treating session lookup failures as anonymous.
    pub async fn session_user(&self) -> Option<SessionUser> {
        match self.gateway.current_user().await {
            Ok(user) => user,
            Err(e) => {
                if !e.is_not_configured() {
                    warn!(error = %e, "Failed to look up session");
                }
                None
            }
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("backend_configured", &self.gateway.is_configured())
            .field("demo_mode", &self.config.demo_mode)
            .finish_non_exhaustive()
    }
}

/// Tracks whether a screen is still mounted.
///
/// A request started before navigating away is not cancelled; its result
/// is only applied if the scope is still mounted when it resolves.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    mounted: Arc<AtomicBool>,
}

impl ScreenScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Handle the host calls when the screen goes away.
    #[must_use]
    pub fn unmount_handle(&self) -> UnmountHandle {
        UnmountHandle {
            mounted: Arc::clone(&self.mounted),
        }
    }
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct UnmountHandle {
    mounted: Arc<AtomicBool>,
}

impl UnmountHandle {
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

/// Where the data on screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Fallback,
}

/// Result of a read after the policy was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub data: T,
    pub source: DataSource,
}

/// Whether failed reads are masked with demo data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPolicy {
    pub demo_mode: bool,
}

impl ReadPolicy {
    /// Apply the policy to a read result.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` if the read failed and demo mode is off.
    pub fn resolve<T>(
        self,
        what: &'static str,
        result: Result<T, GatewayError>,
        fallback: impl FnOnce() -> T,
    ) -> Result<Loaded<T>, ReadError> {
        match result {
            Ok(data) => Ok(Loaded {
                data,
                source: DataSource::Remote,
            }),
            Err(source) if self.demo_mode => {
                if source.is_not_configured() {
                    warn!(what, "Backend not configured, showing demo data");
                } else {
                    warn!(what, error = %source, "Failed to load, showing demo data");
                }
                Ok(Loaded {
                    data: fallback(),
                    source: DataSource::Fallback,
                })
            }
            Err(source) => Err(ReadError { what, source }),
        }
    }
}
