//! The FFT engine: explicit owner of all accelerator state.
//!
//! One engine owns one session, at most one loaded configuration and the
//! change-detection state. Transforms take `&mut self`, so at most one is
//! in flight per engine.

use std::marker::PhantomData;
use std::path::Path;

use crate::config::EngineConfig;
use crate::driver::Driver;
use crate::error::{FftFpgaError, Result};
use crate::executor::{PipelineExecutor, TransformReport};
use crate::lifecycle::LifecycleManager;
use crate::loader::{LoadedConfiguration, PipelineLoader};
use crate::queue_set::QueueSet;
use crate::resolver::{ConfigurationResolver, ImageLocator, TemplateLocator};
use crate::session::Session;
use crate::types::{ComplexSample, Direction, Precision, ProblemShape};

/// Counters kept by an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Transforms that completed.
    pub transforms: u64,
    /// Configuration loads that completed.
    pub reloads: u64,
    /// Transforms that failed after the configuration was in place.
    pub failures: u64,
}

/// 3-D FFT engine over a driver `D` with sample type `S`.
pub struct FftEngine<D: Driver, S: ComplexSample> {
    configuration: Option<LoadedConfiguration<D>>,
    session: Option<Session<D>>,
    resolver: ConfigurationResolver,
    config: EngineConfig,
    stats: EngineStats,
    driver: D,
    _sample: PhantomData<S>,
}

impl<D: Driver, S: ComplexSample> FftEngine<D, S> {
    /// Create an engine resolving images from `config.image_base`.
    pub fn new(driver: D, config: EngineConfig) -> Self {
        let locator = TemplateLocator::new(config.image_base.clone());
        Self::with_locator(driver, config, locator)
    }

    /// Create an engine with a custom image locator.
    pub fn with_locator(driver: D, config: EngineConfig, locator: impl ImageLocator + 'static) -> Self {
        tracing::debug!(
            backend = driver.name(),
            precision = %S::PRECISION,
            vendor = %config.vendor,
            "Created FFT engine"
        );
        Self {
            configuration: None,
            session: None,
            resolver: ConfigurationResolver::new(Box::new(locator), S::PRECISION),
            config,
            stats: EngineStats::default(),
            driver,
            _sample: PhantomData,
        }
    }

    /// Open the accelerator session. Does nothing if one is already live.
    pub fn initialize(&mut self) -> Result<()> {
        if self.session.is_some() {
            tracing::debug!("Engine already initialized");
            return Ok(());
        }
        self.session = Some(Session::open(&self.driver, &self.config)?);
        Ok(())
    }

    /// Release the configuration and then the session. Idempotent.
    pub fn finalize(&mut self) {
        let released_config = LifecycleManager::release_configuration(&mut self.configuration);
        self.resolver.invalidate();
        let released_session = LifecycleManager::release_session(&mut self.session);
        if released_config || released_session {
            tracing::info!(
                transforms = self.stats.transforms,
                reloads = self.stats.reloads,
                failures = self.stats.failures,
                "Engine finalized"
            );
        }
    }

    /// Whether a session is live.
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Whether an image set exists for this shape.
    ///
    /// For a supported shape this also records whether the next transform of
    /// it will need a reload.
    pub fn supports_shape(&mut self, nx: usize, ny: usize, nz: usize) -> bool {
        self.resolver.is_supported(ProblemShape::new(nx, ny, nz))
    }

    /// Whether the last supported query differs from the loaded shape.
    pub fn reload_pending(&self) -> bool {
        self.resolver.changed()
    }

    /// Transform `data` in place.
    ///
    /// Loads the configuration for `shape` first if it is not the one
    /// currently loaded. The backward transform is unnormalized.
    pub fn run_transform(
        &mut self,
        direction: Direction,
        shape: ProblemShape,
        data: &mut [S],
    ) -> Result<TransformReport> {
        if self.session.is_none() {
            return Err(FftFpgaError::NotInitialized("run_transform"));
        }
        if !self.resolver.is_supported(shape) {
            return Err(FftFpgaError::UnsupportedShape(shape));
        }
        if data.len() != shape.volume() {
            return Err(FftFpgaError::BufferSizeMismatch {
                shape,
                expected: shape.volume(),
                actual: data.len(),
            });
        }

        let stale = self.configuration.as_ref().map(LoadedConfiguration::shape) != Some(shape);
        let reloaded = self.resolver.changed() || stale;
        if reloaded {
            self.reconfigure(shape)?;
        }

        match self.execute(direction, data) {
            Ok(mut report) => {
                report.reloaded = reloaded;
                self.stats.transforms += 1;
                Ok(report)
            }
            Err(e) => {
                self.stats.failures += 1;
                tracing::warn!(error = %e, shape = %shape, "Transform failed, releasing configuration");
                LifecycleManager::release_configuration(&mut self.configuration);
                self.resolver.invalidate();
                Err(e)
            }
        }
    }

    /// Transform with a signed direction: `1` forward, `-1` backward.
    pub fn run_transform_signed(
        &mut self,
        direction: i32,
        shape: ProblemShape,
        data: &mut [S],
    ) -> Result<TransformReport> {
        let direction = Direction::try_from(direction)?;
        self.run_transform(direction, shape, data)
    }

    fn execute(&mut self, direction: Direction, data: &mut [S]) -> Result<TransformReport> {
        let session = self
            .session
            .as_ref()
            .ok_or(FftFpgaError::NotInitialized("run_transform"))?;
        let configuration = self
            .configuration
            .as_mut()
            .ok_or(FftFpgaError::NotInitialized("run_transform"))?;

        let mut queues = QueueSet::open(&self.driver, session, self.config.profiling)?;
        let result = PipelineExecutor::run(&self.driver, configuration, &queues, direction, data);
        queues.close();
        result
    }

    /// Replace the loaded configuration with one for `shape`.
    ///
    /// The image is located before anything is released, so a missing image
    /// leaves the current configuration in place.
    fn reconfigure(&mut self, shape: ProblemShape) -> Result<()> {
        let path = self.resolver.resolve_path(shape)?;

        LifecycleManager::release_configuration(&mut self.configuration);
        self.resolver.invalidate();

        let session = self
            .session
            .as_ref()
            .ok_or(FftFpgaError::NotInitialized("run_transform"))?;
        let loaded = PipelineLoader::load(&self.driver, session, shape, S::PRECISION, &path)?;

        self.configuration = Some(loaded);
        self.resolver.commit(shape);
        self.stats.reloads += 1;
        Ok(())
    }

    /// Shape of the loaded configuration.
    pub fn loaded_shape(&self) -> Option<ProblemShape> {
        self.configuration.as_ref().map(LoadedConfiguration::shape)
    }

    /// Image the loaded configuration was built from.
    pub fn loaded_image(&self) -> Option<&Path> {
        self.configuration.as_ref().map(LoadedConfiguration::image_path)
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Precision fixed by the sample type.
    pub fn precision(&self) -> Precision {
        S::PRECISION
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<&Session<D>> {
        self.session.as_ref()
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<D: Driver, S: ComplexSample> Drop for FftEngine<D, S> {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl<D: Driver, S: ComplexSample> std::fmt::Debug for FftEngine<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine")
            .field("backend", &self.driver.name())
            .field("precision", &S::PRECISION)
            .field("session", &self.session)
            .field("loaded", &self.loaded_shape())
            .field("stats", &self.stats)
            .finish()
    }
}
