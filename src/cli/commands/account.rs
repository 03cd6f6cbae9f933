use tracing::info;

use cashflow_domain::{normalize_currency, Account, Category};

use crate::cli::{output::money, AccountCommand, CategoryCommand, CliContext};
use crate::errors::{CliError, CliResult};

pub fn run(ctx: &mut CliContext, action: AccountCommand) -> CliResult {
    match action {
        AccountCommand::Add {
            name,
            kind,
            balance,
            as_of,
            currency,
            credit_limit,
        } => {
            let user = ctx.user()?;
            let currency = normalize_currency(currency.as_deref().unwrap_or(&ctx.config.currency))?;
            if name.trim().is_empty() {
                return Err(CliError::Input("account name must not be empty".into()));
            }
            let as_of = as_of.unwrap_or_else(|| ctx.today());
            let mut account = Account::new(user, name.trim(), kind, currency, balance, as_of);
            if let Some(limit) = credit_limit {
                account = account.with_credit_limit(limit);
            }
            let id = ctx.store.add_account(account.clone())?;
            info!(account_id = %id, %kind, "account added");
            if ctx.out.is_json() {
                return ctx.out.json(&account);
            }
            ctx.out.success(format!("Added account {} ({id})", account.name));
            Ok(())
        }
        AccountCommand::List => {
            let user = ctx.user()?;
            let accounts: Vec<&Account> = ctx
                .store
                .data()
                .accounts
                .iter()
                .filter(|account| account.user_id == user)
                .collect();
            if ctx.out.is_json() {
                return ctx.out.json(&accounts);
            }
            ctx.out.header("Accounts");
            let rows: Vec<Vec<String>> = accounts
                .iter()
                .map(|account| {
                    vec![
                        account.id.to_string(),
                        account.name.clone(),
                        account.kind.to_string(),
                        money(account.initial_balance, &account.currency),
                        account.initial_balance_date.to_string(),
                        if account.is_active { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            ctx.out
                .table(&["ID", "Name", "Kind", "Balance", "As of", "Active"], &rows);
            Ok(())
        }
    }
}

pub fn run_category(ctx: &mut CliContext, action: CategoryCommand) -> CliResult {
    match action {
        CategoryCommand::Add { name, kind } => {
            let user = ctx.user()?;
            if name.trim().is_empty() {
                return Err(CliError::Input("category name must not be empty".into()));
            }
            let category = Category::new(user, name.trim(), kind);
            let id = ctx.store.add_category(category.clone())?;
            info!(category_id = %id, %kind, "category added");
            if ctx.out.is_json() {
                return ctx.out.json(&category);
            }
            ctx.out.success(format!("Added category {} ({id})", category.name));
            Ok(())
        }
        CategoryCommand::List => {
            let user = ctx.user()?;
            let categories: Vec<&Category> = ctx
                .store
                .data()
                .categories
                .iter()
                .filter(|category| category.is_system || category.user_id == Some(user))
                .collect();
            if ctx.out.is_json() {
                return ctx.out.json(&categories);
            }
            ctx.out.header("Categories");
            let rows: Vec<Vec<String>> = categories
                .iter()
                .map(|category| {
                    vec![
                        category.id.to_string(),
                        category.name.clone(),
                        category.kind.to_string(),
                        if category.is_system { "system" } else { "" }.to_string(),
                    ]
                })
                .collect();
            ctx.out.table(&["ID", "Name", "Kind", ""], &rows);
            Ok(())
        }
    }
}
