use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use cashflow_core::{occurrence, EditMode, RuleDeletion, RuleService, RuleUpdate};
use cashflow_domain::{RecurrenceRule, RuleDraft, RulePatch};

use crate::cli::{
    output::money, CliContext, RuleAddArgs, RuleCommand, RuleEditArgs, Scope, ScopeArgs,
};
use crate::errors::{CliError, CliResult};

pub fn run(ctx: &mut CliContext, action: RuleCommand) -> CliResult {
    match action {
        RuleCommand::Add(args) => add(ctx, args),
        RuleCommand::List => list(ctx),
        RuleCommand::Edit(args) => edit(ctx, args),
        RuleCommand::Delete { rule, scope } => {
            let user = ctx.user()?;
            let outcome = RuleService::delete(&mut ctx.store, user, rule, edit_mode(scope)?)?;
            let summary = match outcome {
                RuleDeletion::Deleted { exceptions_removed } => {
                    json!({ "deleted": rule, "exceptions_removed": exceptions_removed })
                }
                RuleDeletion::Skipped(exception) => {
                    json!({ "skipped": exception.date, "exception_id": exception.id })
                }
                RuleDeletion::Ended(ended) => json!({ "ended": ended.id, "end_date": ended.end_date }),
            };
            if ctx.out.is_json() {
                return ctx.out.json(&summary);
            }
            ctx.out.success(format!("Rule {rule} updated: {summary}"));
            Ok(())
        }
    }
}

fn add(ctx: &mut CliContext, args: RuleAddArgs) -> CliResult {
    let user = ctx.user()?;
    let currency = args.currency.unwrap_or_else(|| ctx.config.currency.clone());
    let mut draft = RuleDraft::one_time(
        user,
        args.account,
        args.category,
        args.name,
        args.amount,
        currency,
        args.start,
    );
    match (args.monthly, args.yearly, args.month) {
        (Some(day), None, None) => draft = draft.monthly(day),
        (None, Some(day), Some(month)) => draft = draft.yearly(day, month),
        (None, None, None) => {}
        _ => {
            return Err(CliError::Input(
                "use --monthly DAY, or --yearly DAY together with --month".into(),
            ))
        }
    }
    if let Some(until) = args.until {
        draft = draft.until(until);
    }
    if let Some(to_account) = args.to_account {
        draft = draft.transfer_to(to_account);
    }
    if let Some(note) = args.note {
        draft = draft.with_note(note);
    }

    let rule = RuleService::create(&mut ctx.store, draft)?;
    if ctx.out.is_json() {
        return ctx.out.json(&rule);
    }
    ctx.out.success(format!(
        "Created rule {} ({}), {}",
        rule.name,
        rule.id,
        rule.schedule.label()
    ));
    Ok(())
}

/// A rule as listed, with the next date its schedule fires.
#[derive(Serialize)]
struct ListedRule<'a> {
    #[serde(flatten)]
    rule: &'a RecurrenceRule,
    next_occurrence: Option<NaiveDate>,
}

fn list(ctx: &CliContext) -> CliResult {
    let rules = RuleService::list(&ctx.store, ctx.user()?)?;
    let today = ctx.today();
    let listed: Vec<ListedRule<'_>> = rules
        .iter()
        .map(|rule| ListedRule {
            rule,
            next_occurrence: occurrence::next_occurrence(rule, today),
        })
        .collect();
    if ctx.out.is_json() {
        return ctx.out.json(&listed);
    }
    ctx.out.header(format!("Rules ({})", rules.len()));
    let rows: Vec<Vec<String>> = listed
        .iter()
        .map(|ListedRule { rule, next_occurrence }| {
            vec![
                rule.id.to_string(),
                rule.name.clone(),
                money(rule.amount, &rule.currency),
                rule.schedule.label(),
                rule.start_date.to_string(),
                rule.end_date.map(|d| d.to_string()).unwrap_or_default(),
                next_occurrence.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    ctx.out.table(
        &["ID", "Name", "Amount", "Schedule", "Start", "End", "Next"],
        &rows,
    );
    Ok(())
}

fn edit(ctx: &mut CliContext, args: RuleEditArgs) -> CliResult {
    let user = ctx.user()?;
    let patch = edit_patch(&args);
    if patch.is_empty() {
        return Err(CliError::Input("nothing to change".into()));
    }

    let outcome = RuleService::update(&mut ctx.store, user, args.rule, edit_mode(args.scope)?, patch)?;
    let summary = match outcome {
        RuleUpdate::Replaced(rule) => json!({ "replaced": rule.id }),
        RuleUpdate::Overridden(exception) => {
            json!({ "overridden": exception.date, "exception_id": exception.id })
        }
        RuleUpdate::Split {
            original,
            successor,
        } => json!({
            "original": original.id,
            "original_end_date": original.end_date,
            "successor": successor.id,
            "successor_start_date": successor.start_date,
        }),
    };
    if ctx.out.is_json() {
        return ctx.out.json(&summary);
    }
    ctx.out.success(format!("Rule {} updated: {summary}", args.rule));
    Ok(())
}

fn edit_patch(args: &RuleEditArgs) -> RulePatch {
    RulePatch {
        name: args.name.clone(),
        amount: args.amount,
        account_id: args.account,
        to_account_id: set_or_clear(args.to_account, args.clear_transfer),
        note: set_or_clear(args.note.clone(), args.clear_note),
        ..RulePatch::default()
    }
}

/// `Some(None)` asks the merge to clear the field.
fn set_or_clear<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    match value {
        Some(value) => Some(Some(value)),
        None => clear.then_some(None),
    }
}

fn edit_mode(scope: ScopeArgs) -> CliResult<EditMode> {
    match (scope.scope, scope.date) {
        (Scope::All, _) => Ok(EditMode::All),
        (Scope::This, Some(date)) => Ok(EditMode::ThisOnly(date)),
        (Scope::Future, Some(date)) => Ok(EditMode::ThisAndFuture(date)),
        (_, None) => Err(CliError::Input(
            "--date is required with --scope this or --scope future".into(),
        )),
    }
}
