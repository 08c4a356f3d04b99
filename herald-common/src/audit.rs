//! Audit logging for queue record lifecycle events
//!
//! ## Audit Events
//!
//! - `RecordEnqueued`: A message matched at least one rule and was queued
//! - `DeliverySuccess`: Every destination of a record has been resolved
//! - `DeliveryFailure`: A record exhausted its retries and was quarantined
//!
//! Message text is only ever logged as a short preview, and only when
//! `redact_message_content` is disabled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chat::{ChatId, SourceRef};

const PREVIEW_CHARS: usize = 64;

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging for record lifecycle events
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Omit the message text preview from audit events
    #[serde(default = "default_true")]
    pub redact_message_content: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_message_content: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

static AUDIT_CONFIG: std::sync::OnceLock<Arc<AuditConfig>> = std::sync::OnceLock::new();

/// Initialize audit logging with configuration
pub fn init(config: AuditConfig) {
    AUDIT_CONFIG.get_or_init(|| Arc::new(config));
}

/// Get the current audit configuration
#[must_use]
pub fn config() -> Arc<AuditConfig> {
    AUDIT_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(AuditConfig::default()))
}

/// Shorten message text for logging, or redact it entirely
#[must_use]
pub fn preview(text: &str, redact: bool) -> String {
    if redact {
        return "[REDACTED]".to_string();
    }

    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Log record enqueued event
///
/// # Fields
/// - `record_id`: Queue record identifier (ULID)
/// - `source`: Originating chat and message
/// - `rules`: Names of the matched rules
/// - `target_count`: Number of unique destinations
/// - `preview`: Text preview (redacted by default)
pub fn log_record_enqueued(
    record_id: &str,
    source: &SourceRef,
    rules: &[String],
    targets: usize,
    text: &str,
) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "RecordEnqueued",
        record_id = %record_id,
        source = %source,
        rules = ?rules,
        target_count = targets,
        preview = %preview(text, config.redact_message_content),
        "Audit: Record enqueued"
    );
}

/// Log delivery success event
///
/// Logged when the last outstanding destination of a record is resolved and
/// the record is removed from the queue.
pub fn log_delivery_success(record_id: &str, delivered: &[ChatId], retry_count: u32, age_ms: i64) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "DeliverySuccess",
        record_id = %record_id,
        destinations = ?delivered,
        retry_count = retry_count,
        age_ms = age_ms,
        "Audit: Delivery complete"
    );
}

/// Log delivery failure event
///
/// Logged when a record exhausts its retry budget and is quarantined.
pub fn log_delivery_failure(
    record_id: &str,
    outstanding: &[ChatId],
    error: &str,
    retry_count: u32,
) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::WARN,
        event = "DeliveryFailure",
        record_id = %record_id,
        outstanding = ?outstanding,
        error = %error,
        retry_count = retry_count,
        "Audit: Record quarantined"
    );
}
