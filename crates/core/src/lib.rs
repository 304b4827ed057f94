pub mod classify;
pub mod config;
pub mod extractor;
pub mod job;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod retention;
pub mod strategy;
pub mod testing;
pub mod urls;

pub use classify::FailureKind;
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
};
pub use extractor::{
    ExtractionConfig, ExtractionRequest, Extractor, ExtractorConfig, ExtractorError,
    ProgressSink, YtDlpExtractor,
};
pub use job::{Job, JobError, JobRegistry, JobStatus};
pub use metadata::{
    MediaDescriptor, MetadataConfig, MetadataError, MetadataFetcher, PageMetadataFetcher,
};
pub use orchestrator::{
    Artifact, JobOrchestrator, OrchestratorConfig, OrchestratorError, OrchestratorStatus,
};
pub use progress::ProgressReporter;
pub use retention::{RetentionConfig, RetentionError, RetentionManager, SweepReport};
pub use strategy::{Quality, StrategySequencer};
pub use urls::{UrlPolicy, UrlPolicyConfig};
