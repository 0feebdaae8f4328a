//! Read-only dashboard views over requests and the scan ledger.
//!
//! Every query takes a tenant id and only ever sees that tenant's rows; the
//! filter is applied by the store, never here. Results may trail concurrent
//! scans by one write.

use crate::clock::Clock;
use crate::config::GatepassConfig;
use crate::model::{ApprovalStatus, ScanRecord, TenantId, VisitorPass};
use crate::policy::window::has_lapsed;
use crate::report::calendar::{is_on, local_date, month_slot, week_start, weekday_slot};
use crate::store::{Directory, PassStore, ScanLedger};
use crate::GatepassError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Entries and exits recorded today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryExitCounts {
    /// Entries recorded today.
    pub entries: u64,
    /// Exits recorded today.
    pub exits: u64,
}

/// Request totals for the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCounts {
    /// All requests ever submitted.
    pub total: u64,
    /// Pending requests whose window has not lapsed.
    pub pending_active: u64,
}

/// Scans first recorded on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    /// Day of the week.
    pub weekday: Weekday,
    /// Number of scans.
    pub count: u64,
}

/// Scans per day of the current ISO week, Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekHistogram {
    /// Monday of the week.
    pub week_start: NaiveDate,
    /// Seven entries, Monday through Sunday.
    pub days: Vec<DayCount>,
}

/// Scans first recorded in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    /// Month number, 1 through 12.
    pub month: u32,
    /// Number of scans.
    pub count: u64,
}

/// A ledger entry decorated with reference-data names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    /// The ledger entry.
    #[serde(flatten)]
    pub record: ScanRecord,
    /// Department display name, when known.
    pub department_name: Option<String>,
    /// Staff display name, when known.
    pub person_to_meet_name: Option<String>,
}

/// Tenant-scoped reporting queries.
pub struct Reports {
    passes: Arc<dyn PassStore>,
    scans: Arc<dyn ScanLedger>,
    directory: Arc<dyn Directory>,
    clock: Arc<dyn Clock>,
    config: GatepassConfig,
}

impl Reports {
    /// Create the reporting view.
    pub fn new(
        passes: Arc<dyn PassStore>,
        scans: Arc<dyn ScanLedger>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        config: GatepassConfig,
    ) -> Self {
        Self {
            passes,
            scans,
            directory,
            clock,
            config,
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.local_now(&self.config.utc_offset)
    }

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Approved passes whose visit date is today.
    pub fn passes_today(&self, tenant: &TenantId) -> Result<u64, GatepassError> {
        let today = self.today();
        let passes = self.passes.list_passes(tenant)?;
        Ok(count(passes.iter().filter(|p| p.is_approved() && p.visit_date == today)))
    }

    /// Entries and exits timestamped today.
    pub fn entry_exit_today(&self, tenant: &TenantId) -> Result<EntryExitCounts, GatepassError> {
        let today = self.today();
        let offset = &self.config.utc_offset;
        let records = self.scans.list_scans(tenant)?;

        let on_today = |at: Option<DateTime<Utc>>| at.map_or(false, |at| is_on(at, today, offset));
        Ok(EntryExitCounts {
            entries: count(records.iter().filter(|r| on_today(r.entry_at))),
            exits: count(records.iter().filter(|r| on_today(r.exit_at))),
        })
    }

    /// Visitors first scanned today.
    pub fn visitors_today(&self, tenant: &TenantId) -> Result<u64, GatepassError> {
        let today = self.today();
        let records = self.scans.list_scans(tenant)?;
        Ok(count(
            records
                .iter()
                .filter(|r| is_on(r.scanned_at, today, &self.config.utc_offset)),
        ))
    }

    /// First scans per day of the current ISO week.
    pub fn weekday_histogram(&self, tenant: &TenantId) -> Result<WeekHistogram, GatepassError> {
        let today = self.today();
        let mut counts = [0u64; 7];
        for record in self.scans.list_scans(tenant)? {
            let day = local_date(record.scanned_at, &self.config.utc_offset);
            if let Some(slot) = weekday_slot(day, today) {
                counts[slot] += 1;
            }
        }

        let mut weekday = Weekday::Mon;
        let mut days = Vec::with_capacity(7);
        for n in counts {
            days.push(DayCount { weekday, count: n });
            weekday = weekday.succ();
        }
        Ok(WeekHistogram {
            week_start: week_start(today),
            days,
        })
    }

    /// First scans per month of the current year, January first.
    pub fn month_histogram(&self, tenant: &TenantId) -> Result<Vec<MonthCount>, GatepassError> {
        let today = self.today();
        let mut counts = [0u64; 12];
        for record in self.scans.list_scans(tenant)? {
            let day = local_date(record.scanned_at, &self.config.utc_offset);
            if let Some(slot) = month_slot(day, today) {
                counts[slot] += 1;
            }
        }
        Ok((1u32..)
            .zip(counts)
            .map(|(month, n)| MonthCount { month, count: n })
            .collect())
    }

    /// Total requests and pending requests that can still be decided in time.
    pub fn request_counts(&self, tenant: &TenantId) -> Result<RequestCounts, GatepassError> {
        let now = self.now();
        let passes = self.passes.list_passes(tenant)?;
        Ok(RequestCounts {
            total: count(passes.iter()),
            pending_active: count(
                passes
                    .iter()
                    .filter(|p| p.status == ApprovalStatus::Pending)
                    .filter(|p| !has_lapsed(&p.window, p.visit_date, now)),
            ),
        })
    }

    /// Pending requests whose window closed before anyone decided them.
    pub fn missed_out_count(&self, tenant: &TenantId) -> Result<u64, GatepassError> {
        let now = self.now();
        let passes = self.passes.list_passes(tenant)?;
        Ok(count(passes.iter().filter(|p| {
            p.status == ApprovalStatus::Pending && has_lapsed(&p.window, p.visit_date, now)
        })))
    }

    /// Scanned visitors matching `query`, newest first.
    ///
    /// Matches a case-insensitive substring of name, email, phone or pass id.
    ///
    /// # Errors
    /// - `ValidationError` - the query is blank
    pub fn search(&self, tenant: &TenantId, query: &str) -> Result<Vec<ScanView>, GatepassError> {
        let needle = normalize_query(query)?;
        let records = self.scans.list_scans(tenant)?;
        let matches = records.into_iter().filter(|r| {
            let contact = &r.visitor.contact;
            [
                contact.name.as_str(),
                contact.email.as_str(),
                contact.phone.as_str(),
                r.pass_id.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        });
        Ok(self.views(tenant, newest_first(matches.collect())))
    }

    /// Every request of the tenant, newest submission first.
    pub fn requests(&self, tenant: &TenantId) -> Result<Vec<VisitorPass>, GatepassError> {
        let mut passes = self.passes.list_passes(tenant)?;
        passes.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(passes)
    }

    /// Submitted requests matching `query` on name, email or phone.
    ///
    /// # Errors
    /// - `ValidationError` - the query is blank
    pub fn search_requests(&self, tenant: &TenantId, query: &str) -> Result<Vec<VisitorPass>, GatepassError> {
        let needle = normalize_query(query)?;
        let mut passes: Vec<VisitorPass> = self
            .passes
            .list_passes(tenant)?
            .into_iter()
            .filter(|p| {
                [&p.visitor.name, &p.visitor.email, &p.visitor.phone]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();
        passes.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(passes)
    }

    /// The most recent scans, up to the configured limit.
    pub fn recent_scans(&self, tenant: &TenantId) -> Result<Vec<ScanView>, GatepassError> {
        let mut records = newest_first(self.scans.list_scans(tenant)?);
        records.truncate(self.config.recent_scan_limit);
        Ok(self.views(tenant, records))
    }

    /// Every scan, newest first.
    pub fn all_scans(&self, tenant: &TenantId) -> Result<Vec<ScanView>, GatepassError> {
        let records = newest_first(self.scans.list_scans(tenant)?);
        Ok(self.views(tenant, records))
    }

    fn views(&self, tenant: &TenantId, records: Vec<ScanRecord>) -> Vec<ScanView> {
        records
            .into_iter()
            .map(|record| {
                let department_name = record
                    .visitor
                    .department
                    .as_deref()
                    .and_then(|id| self.directory.department_name(tenant, id));
                let person_to_meet_name = record
                    .visitor
                    .person_to_meet
                    .as_deref()
                    .and_then(|id| self.directory.staff_name(tenant, id));
                ScanView {
                    record,
                    department_name,
                    person_to_meet_name,
                }
            })
            .collect()
    }
}

fn count<T>(items: impl Iterator<Item = T>) -> u64 {
    items.count() as u64
}

fn normalize_query(query: &str) -> Result<String, GatepassError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(GatepassError::ValidationError(
            "search query is required".to_string(),
        ));
    }
    Ok(query.to_lowercase())
}

fn newest_first(mut records: Vec<ScanRecord>) -> Vec<ScanRecord> {
    records.sort_by(|a, b| {
        b.scanned_at
            .cmp(&a.scanned_at)
            .then_with(|| b.pass_id.cmp(&a.pass_id))
    });
    records
}
