//! Advisory pipeline
//!
//! Runs one farm submission through
//! `ResolvingLocation -> FetchingWeather -> Estimating -> ComposingAdvice`.
//! Each stage has its own time budget. A stage that fails or runs out of
//! time falls back to a default and the run carries on; only an invalid
//! submission ends in `Failed`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shared::{
    estimate, validate_farm_profile, AdvisoryResult, ErrorKind, FarmProfile, PipelineStage,
    ResolvedLocation, WaterDemand, WaterNeedLevel, WeatherLocator, WeatherSnapshot,
};

use super::advisory::{AdvisoryComposer, FALLBACK_ADVICE};
use super::geo_resolver::GeoResolver;
use super::records::RecordSink;
use super::retry::RetryPolicy;
use super::weather::WeatherProvider;
use crate::config::{Config, PipelineConfig, WeatherProviderKind};
use crate::error::{AppError, AppResult};
use crate::external::{
    GeminiClient, NominatimClient, OpenWeatherMapClient, WeatherApi, WeatherApiClient,
};

/// Time allowed for each upstream-bound stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBudgets {
    pub geocode: Duration,
    pub weather: Duration,
    pub advisory: Duration,
}

impl StageBudgets {
    pub fn total(&self) -> Duration {
        self.geocode + self.weather + self.advisory
    }
}

impl From<&PipelineConfig> for StageBudgets {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            geocode: Duration::from_millis(config.geocode_budget_ms),
            weather: Duration::from_millis(config.weather_budget_ms),
            advisory: Duration::from_millis(config.advisory_budget_ms),
        }
    }
}

impl Default for StageBudgets {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Stage bookkeeping for a single run
struct RunState {
    stage: PipelineStage,
    degradations: Vec<ErrorKind>,
}

impl RunState {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
            degradations: Vec::new(),
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            tracing::info!(from = %self.stage, to = %next, "Pipeline stage transition");
            self.stage = next;
        }
    }

    fn degrade(&mut self, kind: ErrorKind, err: &AppError) {
        tracing::warn!(stage = %self.stage, code = %kind, "Stage degraded: {}", err);
        self.degradations.push(kind);
    }
}

/// Run `fut` within `budget`, reporting an overrun as a stage timeout
async fn within<T>(
    stage: PipelineStage,
    budget: Duration,
    fut: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::StageTimeout(stage)),
    }
}

/// Orchestrates the advisory stages for each submitted farm
pub struct AdvisoryPipeline {
    geo: Arc<GeoResolver>,
    weather: Arc<WeatherProvider>,
    composer: Arc<AdvisoryComposer>,
    budgets: StageBudgets,
    sink: Option<Arc<dyn RecordSink>>,
}

impl AdvisoryPipeline {
    pub fn new(
        geo: Arc<GeoResolver>,
        weather: Arc<WeatherProvider>,
        composer: Arc<AdvisoryComposer>,
        budgets: StageBudgets,
    ) -> Self {
        Self {
            geo,
            weather,
            composer,
            budgets,
            sink: None,
        }
    }

    /// Push every completed result into `sink`
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Wire the pipeline to the HTTP upstreams named in `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let retry = RetryPolicy::single(config.pipeline.retry_backoff());

        let geocoder = NominatimClient::new(
            config.geocoding.base_url.clone(),
            &config.geocoding.user_agent,
            config.geocoding.timeout(),
        )?;

        let weather_api: Arc<dyn WeatherApi> = match config.weather.provider {
            WeatherProviderKind::WeatherApi => Arc::new(WeatherApiClient::new(
                config.weather.api_key.clone(),
                config.weather.api_endpoint.clone(),
                config.weather.timeout(),
            )?),
            WeatherProviderKind::OpenWeatherMap => Arc::new(OpenWeatherMapClient::new(
                config.weather.api_key.clone(),
                config.weather.api_endpoint.clone(),
                config.weather.timeout(),
            )?),
        };

        let generator = GeminiClient::new(
            config.advisory.api_key.clone(),
            config.advisory.api_endpoint.clone(),
            config.advisory.timeout(),
        )?;

        if config.weather.api_key.is_empty() {
            tracing::warn!("No weather API key configured; weather will be unavailable");
        }
        if config.advisory.api_key.is_empty() {
            tracing::warn!("No advisory API key configured; advice will use the fallback text");
        }

        Ok(Self::new(
            Arc::new(GeoResolver::new(
                Arc::new(geocoder),
                config.geocoding.cache_ttl(),
                retry,
            )),
            Arc::new(WeatherProvider::new(
                weather_api,
                config.weather.cache_ttl(),
                retry,
            )),
            Arc::new(AdvisoryComposer::new(Arc::new(generator), retry)),
            StageBudgets::from(&config.pipeline),
        ))
    }

    pub fn geo_resolver(&self) -> &Arc<GeoResolver> {
        &self.geo
    }

    pub fn weather_provider(&self) -> &Arc<WeatherProvider> {
        &self.weather
    }

    pub fn budgets(&self) -> StageBudgets {
        self.budgets
    }

    /// Run the full advisory sequence for one farm.
    ///
    /// Returns `Err` only for an invalid submission. Upstream trouble is
    /// reported through `error` and `degradations` on the result.
    #[tracing::instrument(skip(self, profile), fields(farm = %profile.farm_name))]
    pub async fn submit(&self, profile: FarmProfile) -> AppResult<AdvisoryResult> {
        let mut run = RunState::new();

        if let Err((field, message)) = validate_farm_profile(&profile) {
            run.stage = PipelineStage::Failed;
            tracing::warn!(stage = %run.stage, field, "Rejected farm submission: {}", message);
            return Err(AppError::validation(field, message));
        }

        run.advance();
        let location = self.resolve_location(&profile, &mut run).await;

        run.advance();
        let weather = self.fetch_weather(&profile, &location, &mut run).await;

        run.advance();
        let demand = match estimate(&weather, &profile.crop_type) {
            Ok(demand) => demand,
            Err(e) => {
                tracing::warn!("Cannot estimate water demand from these readings: {}", e);
                WaterDemand::InsufficientData
            }
        };
        let water_need = demand.estimate().map(|e| WaterNeedLevel::from_index(e.index));

        run.advance();
        let advice_text = match within(
            PipelineStage::ComposingAdvice,
            self.budgets.advisory,
            self.composer
                .try_compose(&profile, &location, &weather, &demand),
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                run.degrade(ErrorKind::AdvisoryGenerationFailure, &e);
                FALLBACK_ADVICE.to_string()
            }
        };

        run.advance();
        let result = AdvisoryResult {
            farm_profile: profile,
            location,
            weather,
            estimate: demand,
            water_need,
            advice_text,
            stage: run.stage,
            error: run.degradations.first().copied(),
            degradations: run.degradations,
        };

        tracing::info!(
            degraded = result.is_degraded(),
            index = result.estimate.estimate().map(|e| e.index),
            "Advisory completed"
        );

        if let Some(sink) = &self.sink {
            match sink.store(&result.farm_profile, &result).await {
                Ok(record) => tracing::debug!(record_id = %record.id, "Advisory record stored"),
                Err(e) => tracing::error!("Failed to store advisory record: {}", e),
            }
        }

        Ok(result)
    }

    /// Like [`Self::submit`], but gives up as soon as `cancel` completes.
    ///
    /// The in-flight stage is dropped and nothing partial is returned.
    pub async fn submit_or_cancel<C>(&self, profile: FarmProfile, cancel: C) -> AppResult<AdvisoryResult>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::info!("Advisory run cancelled by caller");
                Err(AppError::Cancelled)
            }
            result = self.submit(profile) => result,
        }
    }

    /// Drop expired geocode and weather cache entries
    pub async fn purge_caches(&self) -> usize {
        self.geo.purge_expired().await + self.weather.purge_expired().await
    }

    async fn resolve_location(&self, profile: &FarmProfile, run: &mut RunState) -> ResolvedLocation {
        let typed_address = Some(profile.address.trim().to_string()).filter(|a| !a.is_empty());

        match profile.coordinates {
            Some(coordinates) => {
                let address = match within(
                    PipelineStage::ResolvingLocation,
                    self.budgets.geocode,
                    self.geo.resolve_address(coordinates),
                )
                .await
                {
                    Ok(address) => Some(address),
                    Err(e) => {
                        run.degrade(ErrorKind::GeocodingFailure, &e);
                        typed_address
                    }
                };
                ResolvedLocation {
                    address,
                    coordinates: Some(coordinates),
                }
            }
            None => {
                let query = profile.address.trim();
                match within(
                    PipelineStage::ResolvingLocation,
                    self.budgets.geocode,
                    self.geo.resolve_coordinates(query),
                )
                .await
                {
                    Ok(candidates) => match candidates.into_iter().next() {
                        Some(best) => ResolvedLocation {
                            address: Some(best.address),
                            coordinates: Some(best.coordinates),
                        },
                        None => {
                            tracing::info!(query, "No geocoding match; keeping the typed address");
                            ResolvedLocation {
                                address: typed_address,
                                coordinates: None,
                            }
                        }
                    },
                    Err(e) => {
                        run.degrade(ErrorKind::GeocodingFailure, &e);
                        ResolvedLocation {
                            address: typed_address,
                            coordinates: None,
                        }
                    }
                }
            }
        }
    }

    async fn fetch_weather(
        &self,
        profile: &FarmProfile,
        location: &ResolvedLocation,
        run: &mut RunState,
    ) -> WeatherSnapshot {
        let locator = match location.coordinates {
            Some(coordinates) => WeatherLocator::Coordinates(coordinates),
            None => WeatherLocator::Address(profile.address.trim().to_string()),
        };

        match within(
            PipelineStage::FetchingWeather,
            self.budgets.weather,
            self.weather.fetch_conditions(&locator),
        )
        .await
        {
            Ok(conditions) => WeatherSnapshot::Available(conditions),
            Err(e) => {
                run.degrade(ErrorKind::WeatherUnavailable, &e);
                WeatherSnapshot::Unavailable
            }
        }
    }
}
