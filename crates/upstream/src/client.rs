//! SNCT booking API client.

use crate::error::{Result, UpstreamError};
use crate::normalize::{normalize_site, normalize_vehicle_type};
use crate::types::{
    flatten_availability, AvailabilityPayload, SiteEntry, TechnicalError, VehicleTypeEntry,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Europe::Luxembourg;
use metrics::counter;
use model::{Catalog, Key, Organism, SlotSet, Snapshot};
use reqwest::StatusCode;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Default base URL of the booking service.
const DEFAULT_BASE_URL: &str = "https://rdv.snct.lu";

#[derive(Debug, Clone)]
pub struct SnctClientConfig {
    /// Base URL of the provider.
    pub base_url: String,
    /// Maximum simultaneous in-flight requests (permit pool size).
    pub concurrency: usize,
    /// Independent timeout applied to every request.
    pub timeout: Duration,
    /// Length of the queried booking window, starting today.
    pub window_weeks: i64,
}

impl Default for SnctClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 10,
            timeout: Duration::from_secs(10),
            window_weeks: 10,
        }
    }
}

/// HTTP client for the provider. Cheap to share; the permit pool bounds the
/// availability fan-out across all callers.
pub struct SnctClient {
    http: reqwest::Client,
    permits: Arc<Semaphore>,
    config: SnctClientConfig,
}

impl SnctClient {
    pub fn new(config: SnctClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            // The provider's certificate chain does not validate.
            .danger_accept_invalid_certs(true)
            .build()?;
        let permits = Arc::new(Semaphore::new(config.concurrency));
        Ok(Self { http, permits, config })
    }

    fn site_list_url(&self) -> String {
        format!("{}/rdvct/secure/admin/site/list", self.config.base_url)
    }

    fn vehicle_list_url(&self) -> String {
        format!("{}/rdvct/secure/admin/vehicle/type/list", self.config.base_url)
    }

    fn availability_url(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        vehicle_id: i64,
        site_id: i64,
        key: &Key,
    ) -> String {
        format!(
            "{}/rdvct/appointment/betweenDates/{start}/{end}/{vehicle_id}/{site_id}/{}/{}",
            self.config.base_url, key.user_type, key.control_type
        )
    }

    /// Queried booking window in provider-local time: today through
    /// today + `window_weeks`.
    fn booking_window(&self) -> (NaiveDate, NaiveDate) {
        let today = Utc::now().with_timezone(&Luxembourg).date_naive();
        (today, today + chrono::Duration::weeks(self.config.window_weeks))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| UpstreamError::Closed)?;
        debug!("GET {url}");
        let resp = self.http.get(url).timeout(self.config.timeout).send().await?;
        if !resp.status().is_success() {
            return Err(UpstreamError::UnexpectedStatus {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Fetch both catalog lists and normalize the names into stable
    /// identifiers. Either list failing fails the whole catalog refresh;
    /// availability never runs against half a catalog.
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let site_list_url = self.site_list_url();
        let vehicle_list_url = self.vehicle_list_url();
        let (sites, vehicle_types): (Vec<SiteEntry>, Vec<VehicleTypeEntry>) = tokio::try_join!(
            self.get_json(&site_list_url),
            self.get_json(&vehicle_list_url),
        )?;

        let sites: BTreeMap<(Organism, String), i64> = sites
            .into_iter()
            .map(|entry| ((Organism::Snct, normalize_site(&entry.name)), entry.id))
            .collect();
        let vehicle_types: BTreeMap<String, i64> = vehicle_types
            .into_iter()
            .map(|entry| (normalize_vehicle_type(&entry.name), entry.id))
            .collect();

        info!(
            "catalog refreshed: {} sites, {} vehicle types",
            sites.len(),
            vehicle_types.len()
        );
        Ok(Catalog::new(sites, vehicle_types))
    }

    async fn fetch_slots(&self, url: &str) -> Result<BTreeSet<NaiveDateTime>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| UpstreamError::Closed)?;
        let resp = self.http.get(url).timeout(self.config.timeout).send().await?;
        match resp.status() {
            StatusCode::OK => {
                let payload: AvailabilityPayload = resp.json().await?;
                flatten_availability(&payload)
            }
            StatusCode::BAD_REQUEST => {
                // Documented "no technical results" body means zero slots,
                // not a failure.
                let body: TechnicalError = resp.json().await?;
                if body.is_no_results() {
                    Ok(BTreeSet::new())
                } else {
                    Err(UpstreamError::UnexpectedStatus {
                        status: 400,
                        body: format!("code={} type={}", body.code, body.kind),
                    })
                }
            }
            status => Err(UpstreamError::UnexpectedStatus {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// One GET per (user type x control type x vehicle type x site)
    /// combination, concurrency capped by the permit pool. A failing key is
    /// recorded as [`SlotSet::Failed`] and never taints the other keys.
    pub async fn fetch_availability(&self, catalog: &Catalog) -> Snapshot {
        let (start, end) = self.booking_window();
        let combos = catalog.keys_with_ids();
        debug!("refreshing availability over {} combinations", combos.len());

        let fetches = combos.into_iter().map(|(key, vehicle_id, site_id)| {
            let url = self.availability_url(start, end, vehicle_id, site_id, &key);
            async move { (key, self.fetch_slots(&url).await) }
        });

        let mut snapshot = Snapshot::new();
        let mut slot_count = 0usize;
        for (key, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(slots) => {
                    counter!("upstream_requests_total", "outcome" => "ok").increment(1);
                    slot_count += slots.len();
                    snapshot.insert(key, SlotSet::Slots(slots));
                }
                Err(err) => {
                    counter!("upstream_requests_total", "outcome" => "error").increment(1);
                    warn!("availability fetch failed for {key}: {err}");
                    snapshot.insert(key, SlotSet::Failed);
                }
            }
        }

        info!(
            "availability refreshed: {slot_count} slots over {} keys",
            snapshot.len()
        );
        snapshot
    }
}
