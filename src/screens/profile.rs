//! The signed-in user's profile, achievements and recent cleanups.

use tracing::{debug, info};

use super::{AppContext, DataSource, ScreenScope};
use crate::error::{ActionError, ReadError};
use crate::fallback;
use crate::gateway::{fetch_one, tables, GatewayError, Query};
use crate::models::{Achievement, CleanupHistoryEntry, ProfileRow, ProfileView};
use crate::navigation::Route;

async fn fetch_profile(ctx: &AppContext) -> Result<ProfileView, GatewayError> {
    let user = ctx
        .gateway
        .current_user()
        .await?
        .ok_or_else(|| GatewayError::NoRows(tables::PROFILES.to_string()))?;
    let query = Query::from(tables::PROFILES).eq("id", user.id.as_str());
    let row: ProfileRow = fetch_one(ctx.gateway.as_ref(), &query).await?;
    Ok(row.into())
}

pub struct ProfileScreen {
    ctx: AppContext,
    scope: ScreenScope,
    profile: Option<ProfileView>,
    source: Option<DataSource>,
    achievements: Vec<Achievement>,
    history: Vec<CleanupHistoryEntry>,
}

impl ProfileScreen {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            profile: None,
            source: None,
            achievements: fallback::achievements(),
            history: fallback::cleanup_history(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    #[must_use]
    pub fn profile(&self) -> Option<&ProfileView> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    #[must_use]
    pub fn history(&self) -> &[CleanupHistoryEntry] {
        &self.history
    }

    /// Load the profile row of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` only when the fetch fails with demo mode off.
    pub async fn load(&mut self) -> Result<(), ReadError> {
        let result = fetch_profile(&self.ctx).await;
        if !self.scope.is_mounted() {
            debug!("Profile unmounted before load finished");
            return Ok(());
        }

        let loaded = self
            .ctx
            .read_policy()
            .resolve("profile", result, fallback::profile)?;
        self.profile = Some(loaded.data);
        self.source = Some(loaded.source);
        Ok(())
    }

    /// End the session and return to the login screen.
    ///
    /// Without a backend there is no session, so this only navigates.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the sign-out.
    pub async fn sign_out(&mut self) -> Result<Route, ActionError> {
        match self.ctx.gateway.sign_out().await {
            Ok(()) => info!("Signed out"),
            Err(e) if e.is_not_configured() => debug!("No backend session to end"),
            Err(e) => return Err(ActionError::backend("sign out", e)),
        }
        self.profile = None;
        self.source = None;
        Ok(Route::Login)
    }
}
