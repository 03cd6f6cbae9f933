//! Stable, public-facing helpers that wrap the internal service layer.
//!
//! Frontends (CLI, HTTP handlers) call these instead of the services directly.
//! Every entry point is scoped to one user and rejects oversized or reversed
//! date ranges before any computation starts.

use chrono::NaiveDate;
use uuid::Uuid;

use cashflow_domain::{DateWindow, Reconciliation, TransactionInstance};

use crate::{
    dashboard_service::{Dashboard, DashboardOptions, DashboardService},
    forecast_service::{AccountForecast, ForecastService},
    reconciliation_service::{ReconciliationRequest, ReconciliationService},
    recurrence_service::RecurrenceService,
    storage::PlannerStore,
    time::Clock,
    CoreError,
};

/// Largest windows callers may request, in days between start and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    pub max_expansion_days: i64,
    pub max_forecast_days: i64,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            max_expansion_days: 730,
            max_forecast_days: 1096,
        }
    }
}

/// Builds the window `[from, to]`, rejecting reversed ranges and spans above `max_days`.
pub fn check_window(from: NaiveDate, to: NaiveDate, max_days: i64) -> Result<DateWindow, CoreError> {
    let window = DateWindow::new(from, to)?;
    let days = window.span_days();
    if days > max_days {
        return Err(CoreError::RangeTooLarge {
            days,
            max: max_days,
        });
    }
    Ok(window)
}

/// Expanded instances of every rule the user owns inside `[from, to]`.
pub fn api_expand_instances<S, C>(
    store: &S,
    clock: &C,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    limits: WindowLimits,
) -> Result<Vec<TransactionInstance>, CoreError>
where
    S: PlannerStore,
    C: Clock + ?Sized,
{
    let window = check_window(from, to, limits.max_expansion_days)?;
    RecurrenceService::expand(store, user_id, window, clock.today())
}

/// Daily balance projection of the user's active accounts.
pub fn api_calculate_forecast<S, C>(
    store: &S,
    clock: &C,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    account_ids: Option<&[Uuid]>,
    limits: WindowLimits,
) -> Result<Vec<AccountForecast>, CoreError>
where
    S: PlannerStore,
    C: Clock + ?Sized,
{
    let window = check_window(from, to, limits.max_forecast_days)?;
    ForecastService::forecast(store, user_id, window, account_ids, clock.today())
}

pub fn api_get_dashboard<S, C>(
    store: &S,
    clock: &C,
    user_id: Uuid,
    options: DashboardOptions,
) -> Result<Dashboard, CoreError>
where
    S: PlannerStore,
    C: Clock + ?Sized,
{
    if options.history_days < 0 || options.forecast_days < 0 || options.upcoming_days < 0 {
        return Err(CoreError::Validation(
            "dashboard day counts must not be negative".into(),
        ));
    }
    DashboardService::dashboard(store, user_id, clock.today(), options)
}

pub fn api_create_reconciliation<S, C>(
    store: &mut S,
    clock: &C,
    request: ReconciliationRequest,
) -> Result<Reconciliation, CoreError>
where
    S: PlannerStore,
    C: Clock + ?Sized,
{
    ReconciliationService::reconcile(store, clock, request)
}

pub fn api_list_reconciliations<S: PlannerStore>(
    store: &S,
    user_id: Uuid,
    account_id: Option<Uuid>,
) -> Result<Vec<Reconciliation>, CoreError> {
    ReconciliationService::list(store, user_id, account_id)
}

pub fn api_delete_reconciliation<S: PlannerStore>(
    store: &mut S,
    user_id: Uuid,
    reconciliation_id: Uuid,
) -> Result<(), CoreError> {
    ReconciliationService::delete(store, user_id, reconciliation_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_limits_are_inclusive_of_the_cap() {
        assert!(check_window(date(2025, 1, 1), date(2027, 1, 1), 730).is_ok());
        let err = check_window(date(2025, 1, 1), date(2027, 1, 2), 730).unwrap_err();
        assert!(matches!(err, CoreError::RangeTooLarge { days: 731, max: 730 }));
    }

    #[test]
    fn reversed_window_is_rejected() {
        let err = check_window(date(2025, 2, 1), date(2025, 1, 1), 730).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange(_)));
    }
}
