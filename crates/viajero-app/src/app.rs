//! Application wiring: one value holding every service of a running app.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use viajero_core::{CityList, ReferenceData, SignUpForm, REVIEW_PHOTO_BUCKET};
use viajero_geo::GeoJsonIndex;
use viajero_store::geojson::GeoJsonLocation;
use viajero_store::{
    object_path, AccessToken, GeoJsonSource, GeometrySource, LocalSettingsFile, MemoryObjectStore,
    MemoryStore, ObjectStore, RestOptions, RestStore, Store,
};

use crate::account::Account;
use crate::auth::{AuthClient, Session, SignUpOutcome};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::map::{MapComposer, MapLayer, MapView};
use crate::routes::Router;
use crate::settings::SettingsRepository;
use crate::tracker::Tracker;

/// The backends an app runs against.
pub struct Backends {
    /// Record storage.
    pub store: Arc<dyn Store>,
    /// File storage.
    pub objects: Arc<dyn ObjectStore>,
    /// Municipality outlines.
    pub geometry: Arc<dyn GeometrySource>,
    /// Auth service, if configured.
    pub auth: Option<AuthClient>,
    /// Token slot shared with `store`.
    pub token: AccessToken,
}

impl Backends {
    /// In-process backends with no auth service.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            objects: Arc::new(MemoryObjectStore::new()),
            geometry: Arc::new(GeoJsonSource::from_index(GeoJsonIndex::default())),
            auth: None,
            token: AccessToken::new(),
        }
    }

    /// Backends described by `config`: the hosted service when its URL and
    /// key are set, in-process storage otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let options = RestOptions {
            timeout_seconds: config.request_timeout_seconds,
        };
        let mut backends = match (&config.api_url, &config.anon_key) {
            (Some(url), Some(key)) => {
                let token = AccessToken::new();
                let rest = Arc::new(RestStore::new(url, key, token.clone(), &options)?);
                let auth = AuthClient::new(
                    url,
                    key,
                    config.redirect_url(),
                    config.request_timeout_seconds,
                )?;
                info!(api_url = %url, "hosted backend enabled");
                Self {
                    store: rest.clone(),
                    objects: rest.clone(),
                    geometry: rest,
                    auth: Some(auth),
                    token,
                }
            }
            _ => {
                warn!("backend not configured - only signed-out use is available");
                Self::in_memory()
            }
        };

        if let Some(location) = &config.geojson {
            backends.geometry = Arc::new(GeoJsonSource::new(
                GeoJsonLocation::parse(location),
                config.request_timeout_seconds,
            )?);
        }
        Ok(backends)
    }
}

/// A running app.
pub struct Viajero {
    config: AppConfig,
    token: AccessToken,
    auth: Option<AuthClient>,
    store: Arc<dyn Store>,
    tracker: Tracker,
    settings: SettingsRepository,
    account: Account,
    map: MapComposer,
    router: Router,
}

impl Viajero {
    /// Wire an app from its parts.
    pub async fn new(config: AppConfig, reference: ReferenceData, backends: Backends) -> Self {
        let Backends {
            store,
            objects,
            geometry,
            auth,
            token,
        } = backends;
        let settings = SettingsRepository::new(
            store.clone(),
            LocalSettingsFile::new(config.settings_path.clone()),
        )
        .await;
        Self {
            tracker: Tracker::new(store.clone(), objects.clone(), Arc::new(reference)),
            account: Account::new(store.clone(), objects.clone()),
            map: MapComposer::new(
                geometry,
                objects,
                config.geometry_batch_size,
                Duration::from_secs(config.image_timeout_seconds),
            ),
            router: Router::new(&config.base_path),
            settings,
            store,
            auth,
            token,
            config,
        }
    }

    /// Build an app from configuration: reference data from
    /// `reference_dir`, backends per [`Backends::from_config`].
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if an HTTP client cannot be built.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let reference = ReferenceData::from_dir(&config.reference_dir).unwrap_or_else(|e| {
            warn!(dir = %config.reference_dir.display(), error = %e, "reference data unavailable");
            ReferenceData::new(Vec::new(), Vec::new(), None)
        });
        let backends = Backends::from_config(&config)?;
        Ok(Self::new(config, reference, backends).await)
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Cities, reviews and photos.
    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Colour settings.
    #[must_use]
    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    /// Profile and account.
    #[must_use]
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Page routing.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The auth service.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when no auth service is configured.
    pub fn auth(&self) -> Result<&AuthClient> {
        self.auth
            .as_ref()
            .ok_or_else(|| AppError::Configuration("auth service not configured".into()))
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Make `session` current: authorize requests with its token and load
    /// the user's data and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the user's data cannot be loaded; the session
    /// stays active.
    pub async fn start_session(&self, session: Session) -> Result<()> {
        let user_id = session.user_id;
        self.token.set(session.access_token.clone()).await;
        let loaded = self.tracker.sign_in(session).await;
        let settings = self.settings.on_login(user_id).await;
        loaded.and(settings)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for a wrong email or password, or
    /// another error if sign-in or the initial load fails.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth()?.sign_in(email, password).await?;
        self.start_session(session.clone()).await?;
        Ok(session)
    }

    /// Create an account, signing in when the service allows it right away.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad form, `AlreadyRegistered` if the
    /// email is taken, or another error if the request fails.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpOutcome> {
        form.validate()?;
        let outcome = self.auth()?.sign_up(form).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.start_session(session.clone()).await?;
        }
        Ok(outcome)
    }

    /// Resume a session from a stored access token.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` or `InvalidToken` for an unusable token, or
    /// an error if the initial load fails.
    pub async fn restore_session(&self, access_token: &str) -> Result<Session> {
        let session = Session::from_access_token(access_token)?;
        self.start_session(session.clone()).await?;
        Ok(session)
    }

    /// End the session. Local state is cleared even if the auth service
    /// cannot be reached.
    pub async fn sign_out(&self) {
        if let (Some(session), Some(auth)) = (self.tracker.session().await, &self.auth) {
            if let Err(e) = auth.sign_out(&session).await {
                warn!(user_id = %session.user_id, error = %e, "remote sign-out failed");
            }
        }
        self.token.clear().await;
        self.tracker.sign_out().await;
        self.settings.on_logout().await;
    }

    /// Change the signed-in user's email.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, or an auth error.
    pub async fn update_email(&self, email: &str) -> Result<()> {
        let session = self.tracker.session().await.ok_or(AppError::NotSignedIn)?;
        self.auth()?.update_email(&session, email).await
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, a validation error for a
    /// short password, or an auth error.
    pub async fn update_password(&self, password: &str) -> Result<()> {
        let session = self.tracker.session().await.ok_or(AppError::NotSignedIn)?;
        self.auth()?.update_password(&session, password).await
    }

    /// Delete the signed-in user's account and sign out.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, or an error if the account
    /// cannot be deleted.
    pub async fn delete_account(&self) -> Result<()> {
        let user_id = self.tracker.user_id().await?;
        let paths: Vec<String> = self
            .tracker
            .snapshot()
            .await
            .photos
            .iter()
            .filter_map(|p| object_path(&p.photo_url, REVIEW_PHOTO_BUCKET))
            .collect();
        self.account.delete_account(user_id, &paths).await?;
        self.token.clear().await;
        self.tracker.sign_out().await;
        self.settings.on_logout().await;
        Ok(())
    }

    /// Whether the store is reachable with the current session.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, or the store error.
    pub async fn check_connection(&self) -> Result<()> {
        let user_id = self.tracker.user_id().await?;
        self.store.get_profile(user_id).await?;
        Ok(())
    }

    // =========================================================================
    // Map
    // =========================================================================

    /// Map layers for a list, delivered batch by batch through `on_batch`.
    pub async fn map<F>(&self, list: CityList, on_batch: F) -> MapView
    where
        F: FnMut(&[MapLayer]) + Send,
    {
        let cities = self.tracker.cities(list).await;
        let covers = self.tracker.covers().await;
        let settings = self.settings.current().await;
        self.map
            .compose(list, &cities, &covers, &settings, on_batch)
            .await
    }
}
