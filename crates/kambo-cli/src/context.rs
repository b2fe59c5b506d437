//! Wiring of the file-backed services into an [`Orchestrator`].

use anyhow::{Context, Result};
use kambo_application::Orchestrator;
use kambo_core::config::AppConfig;
use kambo_infrastructure::{
    ConfigService, JsonlInteractionRepository, KamboPaths, SecretServiceImpl, StaticKnowledgeBase,
};
use kambo_interaction::build_generator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AppContext {
    pub paths: KamboPaths,
    pub config_service: ConfigService,
    pub config: AppConfig,
}

impl AppContext {
    pub fn load(home: Option<&Path>, config_file: Option<&Path>) -> Result<Self> {
        let paths = KamboPaths::new(home);
        let config_path = match config_file {
            Some(path) => path.to_path_buf(),
            None => paths.config_file()?,
        };

        let config_service = ConfigService::new(config_path);
        let config = config_service
            .load()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;

        Ok(Self {
            paths,
            config_service,
            config,
        })
    }

    /// `[storage] data_dir` wins over the platform data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.config.storage.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(self.paths.data_dir()?),
        }
    }

    pub fn secrets(&self) -> Result<SecretServiceImpl> {
        Ok(SecretServiceImpl::new(self.paths.secret_file()?))
    }

    pub async fn repository(&self) -> Result<JsonlInteractionRepository> {
        let dir = self.data_dir()?;
        tracing::debug!(data_dir = %dir.display(), "[Cli] Opening interaction store");
        Ok(JsonlInteractionRepository::new(&dir).await?)
    }

    pub async fn orchestrator(&self) -> Result<Orchestrator> {
        let secrets = self.secrets()?;
        let generator = build_generator(&self.config.generation, &secrets)
            .await
            .context("No generation backend available; add an API key to secret.json or the environment")?;
        let recorder = Arc::new(self.repository().await?);

        let orchestrator = Orchestrator::new(&self.config, generator, recorder)?
            .with_retriever(Arc::new(StaticKnowledgeBase::default()));
        Ok(orchestrator)
    }
}
