use serde_json::json;

use crate::cli::{BackupCommand, CliContext};
use crate::errors::CliResult;

pub fn run(ctx: &mut CliContext, action: BackupCommand) -> CliResult {
    match action {
        BackupCommand::Create { note } => {
            let info = ctx.store.backup(note.as_deref())?;
            if ctx.out.is_json() {
                return ctx.out.json(&json!({ "id": info.id, "path": info.path }));
            }
            ctx.out.success(format!("Backup written: {}", info.id));
            Ok(())
        }
        BackupCommand::List => {
            let backups = ctx.store.list_backups()?;
            if ctx.out.is_json() {
                let ids: Vec<&str> = backups.iter().map(|info| info.id.as_str()).collect();
                return ctx.out.json(&ids);
            }
            ctx.out.header(format!("Backups ({})", backups.len()));
            let rows: Vec<Vec<String>> = backups
                .iter()
                .map(|info| {
                    vec![
                        info.id.clone(),
                        info.created_at
                            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "?".into()),
                        format!("{} B", info.size_bytes),
                    ]
                })
                .collect();
            ctx.out.table(&["ID", "Created", "Size"], &rows);
            Ok(())
        }
        BackupCommand::Restore { id } => {
            ctx.store.restore_backup(&id)?;
            if ctx.out.is_json() {
                return ctx.out.json(&json!({ "restored": id }));
            }
            ctx.out.success(format!("Restored {id}"));
            Ok(())
        }
    }
}
