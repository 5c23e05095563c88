//! Cleanup map: posts with a location, pinned and filterable by kind.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::{AppContext, DataSource, Loaded, ScreenScope};
use crate::constants::ANONYMOUS_NAME;
use crate::device::{Capability, DeviceError, Devices, Geocoder, Geolocation};
use crate::error::{ActionError, ReadError};
use crate::fallback;
use crate::gateway::{fetch_rows, tables, Direction, GatewayError, Query};
use crate::location::{
    resolve_coordinates, CoordinateSource, Coordinates, LocationFilter, LocationType, Region,
};
use crate::models::{CleanupLocation, PostRow, POST_WITH_AUTHOR_NAME};

/// Map or list presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapView {
    #[default]
    Map,
    List,
}

/// Counters in the stats bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapStats {
    pub visible: usize,
    pub beaches: usize,
    pub parks: usize,
    pub total: usize,
}

pub struct MapScreen {
    ctx: AppContext,
    scope: ScreenScope,
    geolocation: Arc<dyn Geolocation>,
    geocoder: Arc<dyn Geocoder>,
    rng: StdRng,
    locations: Vec<CleanupLocation>,
    source: Option<DataSource>,
    filter: LocationFilter,
    view: MapView,
    user_location: Option<Coordinates>,
    region: Region,
    selected: Option<String>,
    loading: bool,
}

impl MapScreen {
    #[must_use]
    pub fn new(ctx: AppContext, devices: &Devices) -> Self {
        let region = Region::around(ctx.config.map_reference);
        Self {
            ctx,
            scope: ScreenScope::new(),
            geolocation: Arc::clone(&devices.geolocation),
            geocoder: Arc::clone(&devices.geocoder),
            rng: StdRng::from_entropy(),
            locations: Vec::new(),
            source: None,
            filter: LocationFilter::All,
            view: MapView::Map,
            user_location: None,
            region,
            selected: None,
            loading: false,
        }
    }

    /// Seed the generator used for approximate coordinates.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    #[must_use]
    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    #[must_use]
    pub fn user_location(&self) -> Option<Coordinates> {
        self.user_location
    }

    /// Centre the map on the device position.
    ///
    /// On any failure the map stays on the reference point.
    ///
    /// # Errors
    ///
    /// Returns the device error so the caller can alert on a denied
    /// permission.
    pub async fn locate_user(&mut self) -> Result<Coordinates, ActionError> {
        let result = self.current_position().await;
        if !self.scope.is_mounted() {
            return result.map_err(ActionError::from);
        }

        match result {
            Ok(position) => {
                debug!(lat = position.latitude, lon = position.longitude, "Located user");
                self.user_location = Some(position);
                self.region = Region::around(position);
                Ok(position)
            }
            Err(e) => {
                warn!(error = %e, "Failed to get location, staying on reference point");
                self.region = Region::around(self.ctx.config.map_reference);
                Err(e.into())
            }
        }
    }

    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        let status = self.geolocation.request_permission().await?;
        if !status.is_granted() {
            return Err(DeviceError::PermissionDenied(Capability::Location));
        }
        self.geolocation.current_position().await
    }

    /// Load pins from posts that carry a location.
    ///
    /// With demo mode on, a failed or empty result shows the demo pins.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` only when the fetch fails with demo mode off.
    pub async fn load(&mut self) -> Result<(), ReadError> {
        self.loading = true;
        let result = self.fetch_locations().await;

        if !self.scope.is_mounted() {
            debug!("Map unmounted before load finished");
            return Ok(());
        }
        self.loading = false;

        let policy = self.ctx.read_policy();
        let loaded = match result {
            Ok(found) if found.is_empty() && policy.demo_mode => {
                debug!("No located posts yet, showing demo pins");
                Loaded {
                    data: fallback::locations(),
                    source: DataSource::Fallback,
                }
            }
            other => policy.resolve("locations", other, fallback::locations)?,
        };
        info!(
            count = loaded.data.len(),
            approximate = loaded
                .data
                .iter()
                .filter(|l| l.coordinate_source == CoordinateSource::Approximate)
                .count(),
            "Loaded map locations"
        );
        self.locations = loaded.data;
        self.source = Some(loaded.source);
        let stale = self
            .selected
            .as_ref()
            .is_some_and(|id| !self.locations.iter().any(|l| &l.id == id));
        if stale {
            self.selected = None;
        }
        Ok(())
    }

    async fn fetch_locations(&mut self) -> Result<Vec<CleanupLocation>, GatewayError> {
        let query = Query::from(tables::POSTS)
            .select(POST_WITH_AUTHOR_NAME)
            .not_null("location")
            .order("created_at", Direction::Descending);
        let rows: Vec<PostRow> = fetch_rows(self.ctx.gateway.as_ref(), &query).await?;

        let reference = self.ctx.config.map_reference;
        let spread = self.ctx.config.map_jitter_degrees;
        let mut locations = Vec::with_capacity(rows.len());

        for row in rows {
            let Some(name) = row.location.filter(|l| !l.trim().is_empty()) else {
                continue;
            };
            let kind = LocationType::classify(&name, &row.caption);
            let resolved = resolve_coordinates(
                self.geocoder.as_ref(),
                &name,
                reference,
                spread,
                &mut self.rng,
            )
            .await;
            let contributor = row
                .profiles
                .and_then(|p| p.name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string());

            locations.push(CleanupLocation {
                id: row.id,
                name,
                kind,
                coordinates: resolved.coordinates,
                coordinate_source: resolved.source,
                description: row.caption,
                photos: vec![row.image_url],
                created_at: row.created_at,
                contributor,
            });
        }

        Ok(locations)
    }

    #[must_use]
    pub fn filter(&self) -> LocationFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: LocationFilter) {
        self.filter = filter;
    }

    /// Filter chips in display order.
    #[must_use]
    pub fn filter_options() -> Vec<LocationFilter> {
        std::iter::once(LocationFilter::All)
            .chain(LocationType::ALL.into_iter().map(LocationFilter::Only))
            .collect()
    }

    #[must_use]
    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn toggle_view(&mut self) -> MapView {
        self.view = match self.view {
            MapView::Map => MapView::List,
            MapView::List => MapView::Map,
        };
        self.view
    }

    /// All loaded pins, unfiltered.
    #[must_use]
    pub fn locations(&self) -> &[CleanupLocation] {
        &self.locations
    }

    /// Pins that pass the current filter.
    pub fn visible(&self) -> impl Iterator<Item = &CleanupLocation> {
        let filter = self.filter;
        self.locations.iter().filter(move |l| filter.matches(l.kind))
    }

    #[must_use]
    pub fn stats(&self) -> MapStats {
        let count = |kind: LocationType| self.locations.iter().filter(|l| l.kind == kind).count();
        MapStats {
            visible: self.visible().count(),
            beaches: count(LocationType::Beach),
            parks: count(LocationType::Park),
            total: self.locations.len(),
        }
    }

    /// Select a pin for the detail card and centre the map on it.
    pub fn select(&mut self, id: &str) -> Option<&CleanupLocation> {
        let location = self.locations.iter().find(|l| l.id == id)?;
        self.region = Region::around(location.coordinates);
        self.selected = Some(location.id.clone());
        Some(location)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&CleanupLocation> {
        let id = self.selected.as_deref()?;
        self.locations.iter().find(|l| l.id == id)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::Config;
    use crate::constants::REFERENCE_POINT;
    use crate::device::{PermissionStatus, Unavailable};
    use crate::gateway::UnconfiguredGateway;

    struct FixedPosition(Coordinates);

    #[async_trait]
    impl Geolocation for FixedPosition {
        async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
            Ok(PermissionStatus::Granted)
        }

        async fn current_position(&self) -> Result<Coordinates, DeviceError> {
            Ok(self.0)
        }
    }

    struct Denied;

    #[async_trait]
    impl Geolocation for Denied {
        async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
            Ok(PermissionStatus::Denied)
        }

        async fn current_position(&self) -> Result<Coordinates, DeviceError> {
            panic!("position requested without permission");
        }
    }

    fn screen(geolocation: Arc<dyn Geolocation>) -> MapScreen {
        let ctx = AppContext::new(Arc::new(UnconfiguredGateway), Config::for_testing());
        let devices = Devices {
            geolocation,
            ..Devices::headless()
        };
        MapScreen::new(ctx, &devices).with_seed(7)
    }

    #[tokio::test]
    async fn test_unconfigured_map_shows_demo_pins() {
        let mut screen = screen(Arc::new(Unavailable));
        screen.load().await.unwrap();
        assert_eq!(screen.source(), Some(DataSource::Fallback));
        assert_eq!(
            screen.stats(),
            MapStats {
                visible: 3,
                beaches: 1,
                parks: 1,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn test_filter_and_view_toggle() {
        let mut screen = screen(Arc::new(Unavailable));
        screen.load().await.unwrap();

        screen.set_filter(LocationFilter::Only(LocationType::Beach));
        let names: Vec<_> = screen.visible().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Mount Lavinia Beach"]);
        assert_eq!(screen.stats().visible, 1);
        assert_eq!(screen.stats().total, 3);

        screen.set_filter(LocationFilter::Only(LocationType::Forest));
        assert_eq!(screen.visible().count(), 0);

        assert_eq!(screen.toggle_view(), MapView::List);
        assert_eq!(screen.toggle_view(), MapView::Map);
        assert_eq!(MapScreen::filter_options().len(), 5);
    }

    #[tokio::test]
    async fn test_locate_user_moves_region() {
        let here = Coordinates {
            latitude: 7.2906,
            longitude: 80.6337,
        };
        let mut screen = screen(Arc::new(FixedPosition(here)));
        assert_eq!(screen.region().center, REFERENCE_POINT);
        assert_eq!(screen.locate_user().await.unwrap(), here);
        assert_eq!(screen.region().center, here);
        assert_eq!(screen.user_location(), Some(here));
    }

    #[tokio::test]
    async fn test_denied_location_keeps_reference_point() {
        let mut screen = screen(Arc::new(Denied));
        let err = screen.locate_user().await.unwrap_err();
        assert_eq!(err.alert().title, "Permission denied");
        assert_eq!(screen.region().center, REFERENCE_POINT);
        assert_eq!(screen.user_location(), None);
    }

    #[tokio::test]
    async fn test_select_pin() {
        let mut screen = screen(Arc::new(Unavailable));
        screen.load().await.unwrap();
        assert_eq!(screen.select("2").unwrap().name, "Viharamahadevi Park");
        assert_eq!(screen.selected().unwrap().id, "2");
        assert!(screen.select("missing").is_none());
        screen.clear_selection();
        assert!(screen.selected().is_none());
    }
}
