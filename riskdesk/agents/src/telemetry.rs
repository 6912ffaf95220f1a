use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Builder for [`RiskTelemetry`].
pub struct RiskTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl RiskTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sink: None,
            min_level: LogLevel::Info,
            event_publisher: None,
        }
    }

    /// Writes JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Writes to a caller-supplied sink instead of a file.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Drops records below `level` (default `Info`).
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds the telemetry handle. A log path takes precedence over a sink.
    pub fn build(self) -> Result<RiskTelemetry> {
        let sink = match (self.log_path, self.sink) {
            (Some(path), _) => Some(Arc::new(JsonLogger::new(path)?) as Arc<dyn LogSink>),
            (None, sink) => sink,
        };
        Ok(RiskTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                min_level: self.min_level,
                sink,
                publisher: self.event_publisher,
            }),
        })
    }
}

/// Log and event handle shared by the assessment services.
#[derive(Clone)]
pub struct RiskTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for RiskTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskTelemetry")
            .field("module", &self.inner.module)
            .field("min_level", &self.inner.min_level)
            .finish_non_exhaustive()
    }
}

struct TelemetryInner {
    module: String,
    min_level: LogLevel,
    sink: Option<Arc<dyn LogSink>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl RiskTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> RiskTelemetryBuilder {
        RiskTelemetryBuilder::new(module)
    }

    /// Logs structured metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if level < self.inner.min_level {
            return Ok(());
        }
        if let Some(sink) = &self.inner.sink {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            sink.write(&record)?;
        }
        Ok(())
    }

    /// Emits an event on the bus.
    pub async fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(publisher) = &self.inner.publisher {
            publisher
                .publish(EventRecord::new(&self.inner.module, event_type, payload))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_event_bus::{MemoryEventBus, RISK_ASSESSED};
    use shared_logging::MemoryLogSink;
    use tempfile::tempdir;

    #[tokio::test]
    async fn telemetry_writes_log_and_event() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("assessment.log");
        let bus = Arc::new(MemoryEventBus::new(16));
        let telemetry = RiskTelemetry::builder("assessment")
            .log_path(&path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "assessment.start", json!({ "projects": 3 }))
            .unwrap();
        telemetry
            .event(RISK_ASSESSED, json!({ "project_id": "p-1" }))
            .await
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("assessment.start"));
        assert_eq!(bus.snapshot().len(), 1);
        assert_eq!(bus.snapshot()[0].source, "assessment");
    }

    #[test]
    fn respects_min_level() {
        let sink = Arc::new(MemoryLogSink::new());
        let telemetry = RiskTelemetry::builder("alerts")
            .sink(sink.clone())
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        telemetry.log(LogLevel::Info, "ignored", Value::Null).unwrap();
        telemetry
            .log(LogLevel::Warn, "risk.alert", json!({ "overall_risk": 7.8 }))
            .unwrap();
        assert_eq!(sink.messages(), vec!["risk.alert"]);
    }
}
