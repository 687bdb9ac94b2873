//! Flight polling scheduler.
//!
//! On a fixed interval, fetches fresh state for every actively tracked
//! flight, diffs it against the persisted snapshot, persists updates and
//! audit records, recomputes connection risk for affected itineraries, and
//! enqueues notification jobs. Per-flight failures are counted and skipped;
//! a bad cycle never takes the scheduler down.

mod notify;

pub use notify::{connection_risk_request, notification_for_change};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::PollerConfig;
use crate::error::{AppError, AppResult};
use crate::external::{FlightDataProvider, OnTimeStatsSource};
use crate::models::{Connection, NewFlightChange, RiskLevel, TrackedFlight, UpdateConnectionRisk};
use crate::queue::NotificationQueue;
use crate::repositories::Repositories;
use crate::services::{calculate_risk, detect_changes};

/// Summary of one poll cycle, logged fire-and-forget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub total_flights: usize,
    pub updated_flights: usize,
    pub changes_detected: usize,
    pub errors: usize,
}

struct PollerInner {
    repos: Repositories,
    provider: Arc<dyn FlightDataProvider>,
    stats_source: Option<Arc<dyn OnTimeStatsSource>>,
    queue: NotificationQueue,
}

/// Recurring flight poller.
///
/// Constructed by the host's composition root; `start`/`stop` are invoked on
/// boot and on graceful shutdown. Both are idempotent.
#[derive(Clone)]
pub struct FlightPoller {
    inner: Arc<PollerInner>,
    config: PollerConfig,
    running: Arc<AtomicBool>,
    runtime: Arc<Mutex<Option<CancellationToken>>>,
}

impl FlightPoller {
    pub fn new(
        config: PollerConfig,
        repos: Repositories,
        provider: Arc<dyn FlightDataProvider>,
        stats_source: Option<Arc<dyn OnTimeStatsSource>>,
        queue: NotificationQueue,
    ) -> Self {
        tracing::info!(
            interval_seconds = config.interval_seconds,
            "FlightPoller: initialized"
        );
        Self {
            inner: Arc::new(PollerInner {
                repos,
                provider,
                stats_source,
                queue,
            }),
            config,
            running: Arc::new(AtomicBool::new(false)),
            runtime: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the polling scheduler: an immediate cycle, then one per
    /// configured interval on a non-drifting timer.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("FlightPoller: already polling, ignoring start request");
            return;
        }

        let token = CancellationToken::new();
        *self.runtime.lock().expect("runtime lock poisoned") = Some(token.clone());

        let inner = Arc::clone(&self.inner);
        let interval_secs = self.config.interval_seconds;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                // Cancellation is only honored between cycles; an in-flight
                // cycle always finishes naturally.
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                let started = std::time::Instant::now();
                let summary = inner.run_cycle().await;
                tracing::info!(
                    total_flights = summary.total_flights,
                    updated_flights = summary.updated_flights,
                    changes_detected = summary.changes_detected,
                    errors = summary.errors,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "FlightPoller: poll completed"
                );
            }
            tracing::debug!("FlightPoller: polling loop exited");
        });

        tracing::info!("FlightPoller: starting polling scheduler");
    }

    /// Stops scheduling new cycles immediately. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            tracing::warn!("FlightPoller: not polling, ignoring stop request");
            return;
        }

        if let Some(token) = self.runtime.lock().expect("runtime lock poisoned").take() {
            token.cancel();
        }

        tracing::info!("FlightPoller: stopped polling scheduler");
    }

    /// Whether the scheduler is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs a single poll cycle outside the schedule, returning its summary.
    pub async fn poll_once(&self) -> PollSummary {
        self.inner.run_cycle().await
    }
}

impl PollerInner {
    /// One poll cycle over every actively tracked flight.
    async fn run_cycle(&self) -> PollSummary {
        let mut summary = PollSummary::default();

        let trackers = match self.repos.tracking.list_alert_enabled().await {
            Ok(trackers) => trackers,
            Err(e) => {
                tracing::error!(error = %e, "FlightPoller: failed to list tracked flights");
                summary.errors += 1;
                return summary;
            }
        };

        // Each distinct flight is fetched and processed once per cycle,
        // regardless of how many users track it.
        let mut by_flight: HashMap<Uuid, Vec<TrackedFlight>> = HashMap::new();
        for tracker in trackers {
            by_flight.entry(tracker.flight_id).or_default().push(tracker);
        }
        summary.total_flights = by_flight.len();

        tracing::info!(
            flight_count = summary.total_flights,
            "FlightPoller: polling for flight updates"
        );

        for (flight_id, flight_trackers) in by_flight {
            if let Err(e) = self
                .process_flight(flight_id, &flight_trackers, &mut summary)
                .await
            {
                summary.errors += 1;
                tracing::error!(
                    flight_id = %flight_id,
                    error = %e,
                    "FlightPoller: error processing flight"
                );
            }
        }

        summary
    }

    /// Fetch, diff, persist, audit, notify, and refresh risk for one flight.
    async fn process_flight(
        &self,
        flight_id: Uuid,
        trackers: &[TrackedFlight],
        summary: &mut PollSummary,
    ) -> AppResult<()> {
        let flight = self
            .repos
            .flights
            .find_by_id(flight_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "flight".to_string(),
                field: "id".to_string(),
                value: flight_id.to_string(),
            })?;

        let Some(snapshot) = self.provider.fetch_flight(&flight.ident()).await? else {
            // Recoverable condition: skip this flight for the cycle
            tracing::warn!(
                flight_id = %flight_id,
                ident = %flight.ident(),
                "FlightPoller: flight not found at provider"
            );
            summary.errors += 1;
            return Ok(());
        };

        let changes = detect_changes(&flight, &snapshot);
        if changes.is_empty() {
            return Ok(());
        }

        summary.updated_flights += 1;
        summary.changes_detected += changes.len();

        self.repos
            .flights
            .upsert_by_natural_key(snapshot.upsert_row(Utc::now()))
            .await?;

        for change in &changes {
            self.repos
                .change_log
                .append(NewFlightChange::from_record(flight_id, change))
                .await?;

            tracing::info!(
                flight_id = %flight_id,
                change_type = %change.kind,
                description = %change.description,
                "FlightPoller: change detected"
            );

            for tracker in trackers {
                if let Some(request) = notification_for_change(tracker, change, &snapshot) {
                    match self.queue.enqueue(request) {
                        Ok(notification_id) => {
                            tracing::info!(
                                user_id = %tracker.user_id,
                                flight_id = %flight_id,
                                notification_id = %notification_id,
                                "FlightPoller: notification enqueued"
                            );
                        }
                        Err(e) => {
                            summary.errors += 1;
                            tracing::warn!(
                                user_id = %tracker.user_id,
                                error = %e,
                                "FlightPoller: failed to enqueue notification"
                            );
                        }
                    }
                }
            }
        }

        self.recalculate_connection_risk(flight_id, summary).await;

        Ok(())
    }

    /// Recomputes risk for every connection referencing the changed flight
    /// on either leg.
    async fn recalculate_connection_risk(&self, flight_id: Uuid, summary: &mut PollSummary) {
        let connections = match self.repos.connections.find_by_either_leg(flight_id).await {
            Ok(connections) => connections,
            Err(e) => {
                summary.errors += 1;
                tracing::error!(
                    flight_id = %flight_id,
                    error = %e,
                    "FlightPoller: failed to find connections"
                );
                return;
            }
        };

        if connections.is_empty() {
            return;
        }

        tracing::info!(
            flight_id = %flight_id,
            connection_count = connections.len(),
            "FlightPoller: recalculating connection risk"
        );

        for connection in connections {
            if let Err(e) = self.refresh_connection(&connection).await {
                summary.errors += 1;
                tracing::error!(
                    connection_id = %connection.id,
                    error = %e,
                    "FlightPoller: failed to recalculate connection risk"
                );
            }
        }
    }

    /// Recomputes and persists one connection's risk; notifies trackers when
    /// the level changed.
    async fn refresh_connection(&self, connection: &Connection) -> AppResult<()> {
        let incoming = self
            .repos
            .flights
            .find_by_id(connection.incoming_flight_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "flight".to_string(),
                field: "id".to_string(),
                value: connection.incoming_flight_id.to_string(),
            })?;
        let outgoing = self
            .repos
            .flights
            .find_by_id(connection.outgoing_flight_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "flight".to_string(),
                field: "id".to_string(),
                value: connection.outgoing_flight_id.to_string(),
            })?;

        let on_time_rate = match &self.stats_source {
            Some(source) => source
                .on_time_rate(&incoming.airline_code, &incoming.flight_number)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "FlightPoller: on-time stats unavailable");
                    None
                }),
            None => None,
        };

        let risk = calculate_risk(&incoming, &outgoing, on_time_rate);
        let previous_level = connection.risk_level;

        self.repos
            .connections
            .update_risk(connection.id, UpdateConnectionRisk::from_risk(&risk))
            .await?;

        tracing::info!(
            connection_id = %connection.id,
            risk_level = %risk.level,
            buffer_minutes = risk.buffer_minutes,
            "FlightPoller: connection risk updated"
        );

        if previous_level != risk.level {
            self.notify_risk_change(connection, previous_level, risk.level)
                .await;
        }

        Ok(())
    }

    /// Enqueues connection-risk notifications for users tracking either leg
    /// with connection-risk alerts enabled. One notification per user even
    /// when both legs are tracked.
    async fn notify_risk_change(
        &self,
        connection: &Connection,
        previous: RiskLevel,
        current: RiskLevel,
    ) {
        let mut notified: HashSet<Uuid> = HashSet::new();

        for leg_id in [connection.incoming_flight_id, connection.outgoing_flight_id] {
            let trackers = match self.repos.tracking.list_by_flight(leg_id).await {
                Ok(trackers) => trackers,
                Err(e) => {
                    tracing::error!(
                        flight_id = %leg_id,
                        error = %e,
                        "FlightPoller: failed to list trackers for risk change"
                    );
                    continue;
                }
            };

            for tracker in trackers {
                if !tracker.connection_risk_alerts || !notified.insert(tracker.user_id) {
                    continue;
                }
                let request = connection_risk_request(
                    tracker.user_id,
                    leg_id,
                    connection,
                    previous,
                    current,
                );
                if let Err(e) = self.queue.enqueue(request) {
                    tracing::warn!(
                        user_id = %tracker.user_id,
                        error = %e,
                        "FlightPoller: failed to enqueue risk notification"
                    );
                }
            }
        }
    }
}
