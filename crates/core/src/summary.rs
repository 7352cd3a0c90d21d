//! Family payment summary: fetch, filter, totals and display formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use harvest_api::FamilySummary;
use harvest_api_client::{ApiClient, ApiError, Transport};
use tracing::debug;

pub const NOT_AVAILABLE: &str = "N/A";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load families";

/// Fetch every family summary.
pub async fn list<T: Transport>(client: &ApiClient<T>) -> Result<Vec<FamilySummary>, ApiError> {
    let resp = client.list_families().await?;
    debug!(count = resp.data.len(), "fetched family summaries");
    Ok(resp.data)
}

/// Where the provider is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// One formatted table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub family_id: i64,
    pub family_name: String,
    pub child_count: String,
    pub amount_paid: String,
    pub last_payment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFooter {
    pub total: String,
    pub shown: usize,
    pub available: usize,
}

impl SummaryFooter {
    pub fn total_line(&self) -> String {
        format!("Total amount: {}", self.total)
    }

    pub fn count_line(&self) -> String {
        format!("Showing {} of {} families", self.shown, self.available)
    }
}

/// Holds the last fetched list and tracks which refresh generation it
/// answers. Filtered rows and totals are derived on every call.
#[derive(Debug, Clone, Default)]
pub struct SummaryProvider {
    families: Vec<FamilySummary>,
    state: LoadState,
    requested: Option<u64>,
    loaded: Option<u64>,
}

impl SummaryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn records(&self) -> &[FamilySummary] {
        &self.families
    }

    /// True when nothing has been fetched for `generation` yet.
    pub fn needs_fetch(&self, generation: u64) -> bool {
        !self.is_loading() && self.loaded != Some(generation)
    }

    /// Forget the loaded generation so the next check refetches. A fetch
    /// still in flight is abandoned; its result will be dropped.
    pub fn invalidate(&mut self) {
        self.loaded = None;
        if self.is_loading() {
            self.state = LoadState::Idle;
            self.requested = None;
        }
    }

    pub fn begin_fetch(&mut self, generation: u64) {
        self.state = LoadState::Loading;
        self.requested = Some(generation);
    }

    /// Apply a fetch result. Returns false when a newer fetch has been
    /// started since and the result was dropped.
    pub fn finish_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<FamilySummary>, ApiError>,
    ) -> bool {
        if self.requested != Some(generation) {
            debug!(generation, "dropping stale summary result");
            return false;
        }
        self.loaded = Some(generation);
        match result {
            Ok(families) => {
                self.families = families;
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                self.families.clear();
                self.state = LoadState::Failed(load_error_message(&e));
            }
        }
        true
    }

    /// Case-insensitive substring match on the family name. An empty term
    /// keeps everything.
    pub fn filter(&self, term: &str) -> Vec<&FamilySummary> {
        let needle = term.to_lowercase();
        self.families
            .iter()
            .filter(|f| f.family_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Sum over the whole list, regardless of any filter. Unparseable
    /// amounts count as zero.
    pub fn total_paid(&self) -> f64 {
        self.families
            .iter()
            .map(|f| f.total_paid().unwrap_or(0.0))
            .sum()
    }

    pub fn rows(&self, term: &str) -> Vec<SummaryRow> {
        self.filter(term)
            .into_iter()
            .map(|f| SummaryRow {
                family_id: f.id,
                family_name: f.family_name.clone(),
                child_count: f.child_count.to_string(),
                amount_paid: format_currency(f.total_paid()),
                last_payment: format_date(f.last_payment_date.as_deref()),
            })
            .collect()
    }

    pub fn footer(&self, term: &str) -> SummaryFooter {
        SummaryFooter {
            total: format_currency(Some(self.total_paid())),
            shown: self.filter(term).len(),
            available: self.families.len(),
        }
    }
}

/// What the summary screen shows when a fetch fails. Only a server-supplied
/// reason is passed through.
fn load_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Rejected(reason) => reason.clone(),
        _ => LOAD_FAILED_MESSAGE.to_string(),
    }
}

/// `$x.yy`, or `N/A` for a missing amount.
pub fn format_currency(amount: Option<f64>) -> String {
    match amount {
        Some(v) if v.is_finite() => format!("${v:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `Mon D, YYYY` in the timestamp's own offset, or `N/A`.
pub fn format_date(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_date)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
