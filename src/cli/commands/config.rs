use crate::cli::context::{require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::ledger::{Role, Session};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "config",
            "Show or change settings",
            "config [show | set <key> <value>]",
            cmd_config,
        )
        .with_subcommands(&["show", "set"]),
        CommandEntry::new(
            "role",
            "Switch the active operator and role",
            "role <admin|cajero> [operator]",
            cmd_role,
        )
        .with_subcommands(&["admin", "cajero"]),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied().unwrap_or("show") {
        "show" => {
            let config = &context.config;
            output::section("Configuration");
            output::info(format!("  locale            : {}", config.locale));
            output::info(format!("  show_ars          : {}", config.show_ars));
            output::info(format!("  operator          : {}", config.operator));
            output::info(format!("  role              : {}", config.role));
            output::info(format!("  default_register  : {}", config.default_register));
            output::info(format!("  history_limit     : {}", config.history_limit));
            output::info(format!("  activity_capacity : {}", config.activity_capacity));
            output::info(format!(
                "  file              : {}",
                context.config_manager.path().display()
            ));
            Ok(())
        }
        "set" => {
            let usage = "config set <key> <value>";
            let key = require_arg(args, 1, usage)?;
            let value = args[2..].join(" ");
            if value.trim().is_empty() {
                return Err(CommandError::InvalidArguments(format!("usage: {usage}")));
            }
            context.config.set(key, &value)?;
            context.persist_config()?;
            if matches!(key, "operator" | "role") {
                sync_session(context);
            }
            output::success(format!("{key} updated."));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{other}`"
        ))),
    }
}

fn cmd_role(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "role <admin|cajero> [operator]";
    let raw = require_arg(args, 0, usage)?;
    let role = Role::parse(raw)
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown role `{raw}`")))?;
    context.config.role = role;
    if let Some(actor) = args.get(1).map(|actor| actor.trim()).filter(|a| !a.is_empty()) {
        context.config.operator = actor.to_string();
    }
    context.persist_config()?;
    sync_session(context);
    output::success(format!(
        "Now operating as {} ({}).",
        context.config.operator, role
    ));
    Ok(())
}

fn sync_session(context: &mut ShellContext) {
    let session = Session::new(context.config.operator.clone(), context.config.role);
    context.comandas.set_session(session);
}
