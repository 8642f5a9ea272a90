use std::sync::Arc;

use datemaster::app::Datemaster;
use datemaster::clock::SystemClock;
use datemaster::config::{self, DatemasterConfig};
use datemaster::reminder::LogAlerter;
use datemaster::storage::FileStorage;
use datemaster::toast::LogToaster;

fn init_logging(config: &DatemasterConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Journald (`journalctl --user -t datemaster -f`). Own crate at info/debug
    // per config, everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("datemaster") {
                let max = if datemaster::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    let journal = systemd_journal_logger::JournalLog::new()?
        .with_syslog_identifier("datemaster".to_string());

    datemaster::set_debug_logging(config.debug_logging);

    log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
    // Global max must be Debug so debug logs can pass through when toggled
    log::set_max_level(log::LevelFilter::Debug);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::default_config_path();
    let config = DatemasterConfig::load(&config_path);

    if let Err(e) = init_logging(&config) {
        eprintln!("journald logging unavailable: {}", e);
    }

    config.ensure_directories()?;
    let storage = Arc::new(FileStorage::open(&config.data_directory)?);

    let app = Datemaster::open(
        storage,
        Arc::new(SystemClock),
        Arc::new(LogToaster),
        Arc::new(LogAlerter),
        config.missed_reminders,
    )?;

    log::info!(
        "datemaster running with {} entries, {} reminders armed",
        app.store().entries().len(),
        app.scheduler().armed_count()
    );

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    Ok(())
}
