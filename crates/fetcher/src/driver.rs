//! The fetch driver: enrollment pre-check, the hop loop and redirect
//! propagation.
//!
//! One [`TriggerFetcher::fetch`] call owns one job. Hops run strictly in
//! sequence. The first accepted payload is committed and later hops can only
//! add redirect targets; their failures do not change the outcome.
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, span, warn, Instrument, Level};
use url::Url;

use crate::config::FetcherConfig;
use crate::destination::{debug_key_decision, resolve_attribution_destination};
use crate::enrollment::{enrollment_key, EnrollmentId, EnrollmentResolver};
use crate::error::FetchError;
use crate::header::{extract_payload, redirect_targets, report_response_size};
use crate::metrics::RegistrationMetrics;
use crate::status::{FetchFailure, FetchOutcome, FetchReport};
use crate::transport::{RegistrationTransport, ReqwestTransport};
use crate::trigger::{assemble_trigger, TriggerContext};
use crate::types::{RedirectList, RegistrationJob, TriggerRecord};

/// Fetches trigger registrations.
///
/// Cheap to clone; collaborators are shared behind `Arc`s and nothing is
/// carried from one job to the next.
///
/// ```no_run
/// use std::sync::Arc;
/// use fetcher::{
///     FetcherConfig, MetricsRecorder, RegistrationJob, RegistrationKind,
///     StaticEnrollmentDirectory, TriggerFetcher,
/// };
/// use url::Url;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let directory = StaticEnrollmentDirectory::new().with_enrollment("foo.com", "enrollment-id");
/// let fetcher = TriggerFetcher::with_reqwest(
///     FetcherConfig::default(),
///     Arc::new(directory),
///     Arc::new(MetricsRecorder),
/// )?;
///
/// let job = RegistrationJob::new(
///     RegistrationKind::AppTrigger,
///     Url::parse("https://foo.com/register")?,
///     Url::parse("android-app://com.example")?,
/// );
/// let report = fetcher.fetch(&job).await;
/// println!("{} after {} hops", report.status(), report.hops);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TriggerFetcher {
    config: FetcherConfig,
    transport: Arc<dyn RegistrationTransport>,
    enrollments: Arc<dyn EnrollmentResolver>,
    metrics: Arc<dyn RegistrationMetrics>,
}

/// What an accepted hop hands back to the loop.
struct AcceptedHop {
    record: TriggerRecord,
    redirects: Vec<Url>,
}

impl TriggerFetcher {
    pub fn new(
        config: FetcherConfig,
        transport: Arc<dyn RegistrationTransport>,
        enrollments: Arc<dyn EnrollmentResolver>,
        metrics: Arc<dyn RegistrationMetrics>,
    ) -> Result<Self, FetchError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            enrollments,
            metrics,
        })
    }

    /// Builds a fetcher on the production `reqwest` transport.
    pub fn with_reqwest(
        config: FetcherConfig,
        enrollments: Arc<dyn EnrollmentResolver>,
        metrics: Arc<dyn RegistrationMetrics>,
    ) -> Result<Self, FetchError> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::new(config, transport, enrollments, metrics)
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Runs one job to completion.
    pub async fn fetch(&self, job: &RegistrationJob) -> FetchReport<TriggerRecord> {
        let span = span!(
            Level::INFO,
            "fetcher.fetch",
            job_id = %job.id,
            kind = %job.kind,
            registration_uri = %job.registration_uri
        );

        async {
            let started = Instant::now();
            let report = self.run(job).await;
            let elapsed_micros = started.elapsed().as_micros() as u64;
            let status = report.status();

            self.metrics.record_fetch_status(job.kind, status);
            if report.outcome.is_success() {
                info!(
                    %status,
                    hops = report.hops,
                    redirects = report.redirects.len(),
                    elapsed_micros,
                    "fetch_success"
                );
            } else {
                warn!(
                    %status,
                    hops = report.hops,
                    redirects = report.redirects.len(),
                    elapsed_micros,
                    "fetch_failure"
                );
            }
            report
        }
        .instrument(span)
        .await
    }

    async fn run(&self, job: &RegistrationJob) -> FetchReport<TriggerRecord> {
        if !job.kind.is_trigger() {
            warn!("job is not a trigger registration");
            return failed(FetchFailure::ParsingError, RedirectList::new(), 0);
        }
        if !is_https(&job.registration_uri) {
            warn!("registration uri is not https");
            return failed(FetchFailure::ParsingError, RedirectList::new(), 0);
        }
        let Some(enrollment_id) = self
            .enrollments
            .lookup(&enrollment_key(&job.registration_uri))
        else {
            warn!("no enrollment for registration uri");
            return failed(FetchFailure::InvalidEnrollment, RedirectList::new(), 0);
        };
        let Some(destination) = resolve_attribution_destination(job) else {
            warn!("web trigger has neither web destination nor top origin");
            return failed(FetchFailure::ParsingError, RedirectList::new(), 0);
        };

        // Redirects only come from accepted hops, so a failed first hop ends
        // the chain and decides the outcome.
        let first = match self
            .fetch_hop(job, &job.registration_uri, &enrollment_id, &destination)
            .await
        {
            Ok(accepted) => accepted,
            Err(failure) => return failed(failure, RedirectList::new(), 1),
        };

        let mut redirects = RedirectList::new();
        let mut pending = VecDeque::new();
        if job.redirects_enabled {
            enqueue(&mut redirects, &mut pending, first.redirects);
        }
        let max_requests = self.config.max_redirect_hops.saturating_add(1);
        let mut hops = 1;

        while let Some(hop_uri) = pending.pop_front() {
            if hops == max_requests {
                debug!(
                    unfetched = pending.len() + 1,
                    "redirect hop bound reached"
                );
                break;
            }
            hops += 1;

            match self
                .fetch_hop(job, &hop_uri, &enrollment_id, &destination)
                .await
            {
                Ok(accepted) => {
                    debug!(hop = hops, "later hop accepted, first record kept");
                    enqueue(&mut redirects, &mut pending, accepted.redirects);
                }
                Err(failure) => {
                    debug!(hop = hops, %failure, "hop failed after success, ignored");
                }
            }
        }

        FetchReport {
            outcome: FetchOutcome::Success(first.record),
            redirects,
            hops,
        }
    }

    async fn fetch_hop(
        &self,
        job: &RegistrationJob,
        hop_uri: &Url,
        enrollment_id: &EnrollmentId,
        destination: &Url,
    ) -> Result<AcceptedHop, FetchFailure> {
        if !is_https(hop_uri) {
            warn!(%hop_uri, "redirect target is not https");
            return Err(FetchFailure::ParsingError);
        }

        let response = self.transport.post(hop_uri).await.map_err(|err| {
            warn!(%hop_uri, error = %err, "registration request failed");
            FetchFailure::from(&err)
        })?;

        report_response_size(
            self.metrics.as_ref(),
            job.kind,
            &response.headers,
            hop_uri,
            self.config.max_response_payload_bytes,
        );

        if let Some(failure) = FetchFailure::from_http_status(response.status) {
            warn!(%hop_uri, http_status = response.status, "registration server refused");
            return Err(failure);
        }

        let Some(payload) = extract_payload(&response.headers) else {
            warn!(%hop_uri, "no usable register-trigger header");
            return Err(FetchFailure::ParsingError);
        };

        let context = TriggerContext {
            job,
            enrollment_id,
            attribution_destination: destination,
            debug: debug_key_decision(job, hop_uri, self.config.web_debug_key_policy),
        };
        let record = assemble_trigger(&payload, &context, &self.config.limits).map_err(|rejection| {
            warn!(
                %hop_uri,
                field = rejection.field,
                error = %rejection.error,
                "trigger payload rejected"
            );
            FetchFailure::from(&rejection.error)
        })?;

        Ok(AcceptedHop {
            record,
            redirects: redirect_targets(&response.headers),
        })
    }
}

fn is_https(url: &Url) -> bool {
    url.scheme() == "https"
}

fn enqueue(redirects: &mut RedirectList, pending: &mut VecDeque<Url>, targets: Vec<Url>) {
    for target in targets {
        redirects.push(target.clone());
        pending.push_back(target);
    }
}

fn failed(
    failure: FetchFailure,
    redirects: RedirectList,
    hops: usize,
) -> FetchReport<TriggerRecord> {
    FetchReport {
        outcome: FetchOutcome::failure(failure),
        redirects,
        hops,
    }
}
