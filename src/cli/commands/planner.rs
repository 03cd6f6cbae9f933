use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use cashflow_core::{
    api_calculate_forecast, api_expand_instances, api_get_dashboard, ConfirmTarget,
    ConfirmationService, ForecastService, TrendPoint, UNKNOWN_LABEL,
};
use cashflow_domain::{CategoryKind, TransactionInstance};

use crate::cli::{
    output::{money, signed_money},
    CliContext, ConfirmArgs, DashboardArgs, RangeArgs,
};
use crate::errors::{CliError, CliResult};

pub fn expand(ctx: &mut CliContext, range: RangeArgs) -> CliResult {
    let instances = api_expand_instances(
        &ctx.store,
        ctx.clock(),
        ctx.user()?,
        range.from,
        range.to,
        ctx.window_limits(),
    )?;
    if ctx.out.is_json() {
        return ctx.out.json(&instances);
    }

    ctx.out
        .header(format!("Transactions {} .. {}", range.from, range.to));
    let kinds = ForecastService::category_kinds(&ctx.store, &instances)?;
    let rows = instance_rows(ctx, &instances, &kinds);
    ctx.out
        .table(&["Date", "Name", "Amount", "Account", "Status"], &rows);
    Ok(())
}

pub fn forecast(ctx: &mut CliContext, range: RangeArgs, accounts: &[Uuid]) -> CliResult {
    let account_ids = (!accounts.is_empty()).then_some(accounts);
    let forecasts = api_calculate_forecast(
        &ctx.store,
        ctx.clock(),
        ctx.user()?,
        range.from,
        range.to,
        account_ids,
        ctx.window_limits(),
    )?;
    if ctx.out.is_json() {
        return ctx.out.json(&forecasts);
    }

    ctx.out
        .header(format!("Forecast {} .. {}", range.from, range.to));
    let rows: Vec<Vec<String>> = forecasts
        .iter()
        .map(|forecast| {
            let low = forecast
                .points
                .iter()
                .map(|point| point.balance)
                .min()
                .unwrap_or(forecast.starting_balance);
            vec![
                forecast.name.clone(),
                forecast.kind.to_string(),
                money(forecast.starting_balance, &forecast.currency),
                money(low, &forecast.currency),
                money(forecast.closing_balance(), &forecast.currency),
            ]
        })
        .collect();
    ctx.out
        .table(&["Account", "Kind", "Opening", "Lowest", "Closing"], &rows);
    Ok(())
}

pub fn dashboard(ctx: &mut CliContext, args: DashboardArgs) -> CliResult {
    let defaults = ctx.dashboard_options();
    let options = cashflow_core::DashboardOptions {
        history_days: args.history_days.unwrap_or(defaults.history_days),
        forecast_days: args.forecast_days.unwrap_or(defaults.forecast_days),
        upcoming_days: args.upcoming_days.unwrap_or(defaults.upcoming_days),
        upcoming_limit: args.limit.unwrap_or(defaults.upcoming_limit),
    };
    let dashboard = api_get_dashboard(&ctx.store, ctx.clock(), ctx.user()?, options)?;
    if ctx.out.is_json() {
        return ctx.out.json(&dashboard);
    }

    let currency = ctx.config.currency.clone();
    let summary = &dashboard.summary;
    ctx.out.header(format!("Dashboard for {}", ctx.today()));
    ctx.out.pairs(&[
        ("Net worth", money(summary.net_worth, &currency)),
        ("Liquid", money(summary.liquid_assets, &currency)),
        ("Investments", money(summary.investments, &currency)),
        ("Credit used", money(summary.credit_used, &currency)),
        ("Receivable", money(summary.loans_receivable, &currency)),
        ("Accounts", summary.account_count.to_string()),
        ("Rules", dashboard.scheduled_count.to_string()),
    ]);

    println!();
    ctx.out.header("Upcoming");
    let rows: Vec<Vec<String>> = dashboard
        .upcoming
        .iter()
        .map(|item| {
            vec![
                item.date.to_string(),
                item.name.clone(),
                money(item.amount, &item.currency),
                item.account_name.clone(),
                item.category_name.clone(),
            ]
        })
        .collect();
    ctx.out
        .table(&["Date", "Name", "Amount", "Account", "Category"], &rows);

    println!();
    ctx.out.header("Overall balance");
    let trend = |points: &[TrendPoint]| -> Option<(Decimal, Decimal)> {
        Some((points.first()?.balance, points.last()?.balance))
    };
    match trend(&dashboard.trends.overall) {
        Some((first, last)) => ctx.out.pairs(&[
            ("From", money(first, &currency)),
            ("To", money(last, &currency)),
            ("Change", signed_money(last - first, &currency)),
        ]),
        None => ctx.out.note("(no history)"),
    }
    Ok(())
}

pub fn pending(ctx: &mut CliContext, lookback_days: Option<i64>) -> CliResult {
    let lookback = lookback_days.unwrap_or(ctx.config.limits.confirmation_lookback_days);
    if lookback < 0 {
        return Err(CliError::Input("--lookback-days must not be negative".into()));
    }
    let instances = ConfirmationService::pending(&ctx.store, ctx.user()?, ctx.today(), lookback)?;
    if ctx.out.is_json() {
        return ctx.out.json(&instances);
    }
    ctx.out
        .header(format!("Awaiting confirmation ({})", instances.len()));
    let kinds = ForecastService::category_kinds(&ctx.store, &instances)?;
    let rows = instance_rows(ctx, &instances, &kinds);
    ctx.out
        .table(&["Date", "Name", "Amount", "Account", "Status"], &rows);
    Ok(())
}

pub fn confirm(ctx: &mut CliContext, args: ConfirmArgs) -> CliResult {
    let target = if args.all {
        ConfirmTarget::All
    } else if args.past {
        ConfirmTarget::Past
    } else if !args.date.is_empty() {
        ConfirmTarget::Dates(args.date)
    } else {
        return Err(CliError::Input("pass --all, --past or at least one --date".into()));
    };

    let user = ctx.user()?;
    let today = ctx.today();
    let count = ConfirmationService::bulk_confirm(
        &mut ctx.store,
        user,
        args.rule,
        args.account,
        target,
        today,
        ctx.config.limits.confirmation_lookback_days,
        ctx.clock.now(),
    )?;
    if ctx.out.is_json() {
        return ctx.out.json(&json!({ "confirmed": count }));
    }
    ctx.out.success(format!("Confirmed {count} occurrence(s)"));
    Ok(())
}

fn instance_rows(
    ctx: &CliContext,
    instances: &[TransactionInstance],
    kinds: &HashMap<Uuid, CategoryKind>,
) -> Vec<Vec<String>> {
    let accounts: HashMap<Uuid, &str> = ctx
        .store
        .data()
        .accounts
        .iter()
        .map(|account| (account.id, account.name.as_str()))
        .collect();
    let account_name = |id: Uuid| accounts.get(&id).copied().unwrap_or(UNKNOWN_LABEL);

    instances
        .iter()
        .map(|instance| {
            let (amount, account) = match instance.to_account_id {
                Some(to) => (
                    money(instance.amount, &instance.currency),
                    format!("{} -> {}", account_name(instance.account_id), account_name(to)),
                ),
                None => {
                    let signed = match kinds.get(&instance.category_id) {
                        Some(CategoryKind::Income) => instance.amount,
                        _ => -instance.amount,
                    };
                    (
                        signed_money(signed, &instance.currency),
                        account_name(instance.account_id).to_string(),
                    )
                }
            };
            vec![
                instance.date.to_string(),
                instance.name.clone(),
                amount,
                account,
                instance.status.to_string(),
            ]
        })
        .collect()
}
