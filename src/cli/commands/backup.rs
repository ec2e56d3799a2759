use crate::cli::context::{require_arg, CliError, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::storage::{StateStore, StorageKey};

const USAGE: &str = "backup list [document] | create [document] [note] | restore <document> <name|index>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "backup",
        "List, create or restore document snapshots",
        USAGE,
        cmd_backup,
    )
    .with_subcommands(&["list", "create", "restore"])]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().map(|action| action.to_lowercase()).as_deref() {
        None | Some("list") => list(context, args.get(1).copied()),
        Some("create") => create(context, &args[1..]),
        Some("restore") => restore(context, &args[1..]),
        Some(_) => Err(CommandError::InvalidArguments(format!("usage: {USAGE}"))),
    }
}

fn document(input: Option<&str>) -> Result<StorageKey, CommandError> {
    match input {
        None => Ok(StorageKey::Ledger),
        Some(name) => StorageKey::parse(name).ok_or_else(|| {
            let known: Vec<_> = StorageKey::ALL.iter().map(|key| key.file_stem()).collect();
            CommandError::InvalidArguments(format!(
                "unknown document `{}` (one of: {})",
                name,
                known.join(", ")
            ))
        }),
    }
}

fn list(context: &mut ShellContext, input: Option<&str>) -> CommandResult {
    let key = document(input)?;
    let backups = context.storage.list_backups(key)?;
    if backups.is_empty() {
        output::warning(format!("No backups for {}.", key.file_stem()));
        return Ok(());
    }
    output::section(format!("Backups of {}", key.file_stem()));
    for (idx, name) in backups.iter().enumerate() {
        output::info(format!("  {:>2}. {}", idx + 1, name));
    }
    Ok(())
}

fn create(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = document(args.first().copied())?;
    let note = (args.len() > 1).then(|| args[1..].join(" "));
    match context.storage.backup(key, note.as_deref())? {
        Some(name) => output::success(format!("Backup {} created.", name)),
        None => output::warning(format!("Nothing to back up for {}.", key.file_stem())),
    }
    Ok(())
}

fn restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = document(Some(require_arg(args, 0, USAGE)?))?;
    let reference = require_arg(args, 1, USAGE)?;
    let name = match reference.parse::<usize>() {
        Ok(index) => {
            let backups = context.storage.list_backups(key)?;
            index
                .checked_sub(1)
                .and_then(|idx| backups.get(idx).cloned())
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!(
                        "backup index {} out of range (1-{})",
                        index,
                        backups.len()
                    ))
                })?
        }
        Err(_) => reference.to_string(),
    };

    if !context.confirm(&format!("Restore {} over {}?", name, key.file_stem()))? {
        output::info("Restore cancelled.");
        return Ok(());
    }
    context.storage.restore(key, &name)?;
    let mode = context.mode;
    let base = context.storage.base_dir().to_path_buf();
    *context = ShellContext::with_base_dir(mode, base).map_err(|err| match err {
        CliError::Core(core) => CommandError::Core(core),
        other => CommandError::Message(other.to_string()),
    })?;
    output::success(format!("{} restored from {}.", key.file_stem(), name));
    Ok(())
}
