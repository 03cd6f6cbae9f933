use serde_json::json;

use cashflow_core::{
    api_create_reconciliation, api_delete_reconciliation, api_list_reconciliations,
    ReconciliationRequest,
};

use crate::cli::{
    output::{money, signed_money},
    CliContext, ReconcileCommand,
};
use crate::errors::CliResult;

pub fn run(ctx: &mut CliContext, action: ReconcileCommand) -> CliResult {
    let user = ctx.user()?;
    match action {
        ReconcileCommand::Add {
            account,
            date,
            balance,
            adjust,
            note,
        } => {
            let request = ReconciliationRequest {
                user_id: user,
                account_id: account,
                date,
                actual_balance: balance,
                create_adjustment: adjust,
                note,
            };
            let record = api_create_reconciliation(&mut ctx.store, ctx.clock.as_ref(), request)?;
            if ctx.out.is_json() {
                return ctx.out.json(&record);
            }
            let currency = ctx.config.currency.clone();
            ctx.out.header(format!("Reconciled on {}", record.date));
            ctx.out.pairs(&[
                ("Expected", money(record.expected_balance, &currency)),
                ("Actual", money(record.actual_balance, &currency)),
                ("Difference", signed_money(record.difference, &currency)),
                (
                    "Adjustment",
                    record
                        .adjustment_rule_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "none".into()),
                ),
            ]);
            Ok(())
        }
        ReconcileCommand::List { account } => {
            let records = api_list_reconciliations(&ctx.store, user, account)?;
            if ctx.out.is_json() {
                return ctx.out.json(&records);
            }
            ctx.out.header(format!("Reconciliations ({})", records.len()));
            let currency = ctx.config.currency.clone();
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|record| {
                    vec![
                        record.id.to_string(),
                        record.date.to_string(),
                        money(record.expected_balance, &currency),
                        money(record.actual_balance, &currency),
                        signed_money(record.difference, &currency),
                    ]
                })
                .collect();
            ctx.out
                .table(&["ID", "Date", "Expected", "Actual", "Difference"], &rows);
            Ok(())
        }
        ReconcileCommand::Delete { id } => {
            api_delete_reconciliation(&mut ctx.store, user, id)?;
            if ctx.out.is_json() {
                return ctx.out.json(&json!({ "deleted": id }));
            }
            ctx.out.success(format!("Deleted reconciliation {id}"));
            Ok(())
        }
    }
}
