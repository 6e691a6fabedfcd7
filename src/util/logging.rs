use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Install `env_logger` (default filter `info`) behind a progress-aware wrapper.
///
/// Log lines are printed above any bar added to the returned `MultiProgress`.
pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    Ok(progress)
}
