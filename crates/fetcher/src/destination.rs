//! Attribution destination and debug-key permission for a job.
use url::Url;

use crate::config::WebDebugKeyPolicy;
use crate::types::RegistrationJob;

/// Picks the destination the trigger is attributed to.
///
/// App jobs use the OS destination and fall back to the registrant. Web jobs
/// use the declared web destination and fall back to the top origin; a web
/// job with neither has no destination.
pub fn resolve_attribution_destination(job: &RegistrationJob) -> Option<Url> {
    if job.kind.is_web() {
        job.web_destination
            .clone()
            .or_else(|| job.top_origin.clone())
    } else {
        Some(
            job.os_destination
                .clone()
                .unwrap_or_else(|| job.registrant.clone()),
        )
    }
}

/// Debug-key decision for the hop that produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugKeyDecision {
    /// Whether a valid `debug_key` may be copied onto the record.
    pub emit_debug_key: bool,
    /// The job's debug flag for this hop, recorded as-is.
    pub debug_permission: bool,
}

pub fn debug_key_decision(
    job: &RegistrationJob,
    hop_uri: &Url,
    policy: WebDebugKeyPolicy,
) -> DebugKeyDecision {
    let hop_flag = job.debug_key_allowed.allowed_for(hop_uri);
    let emit_debug_key = if job.kind.is_web() {
        policy.permits(job.ad_id_permission, hop_flag)
    } else {
        job.ad_id_permission
    };
    DebugKeyDecision {
        emit_debug_key,
        debug_permission: hop_flag,
    }
}
