use std::path::PathBuf;

use crate::activity::{ActivityAction, ActivityEntry};
use crate::cli::context::{parse_date, require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::export::{export_activity_to_path, export_comandas_to_path};
use crate::ledger::{CashRegister, ComandaFilter, DateRange};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            "Totals for completed comandas in a date range",
            "summary [from] [to]",
            cmd_summary,
        ),
        CommandEntry::new(
            "validate-range",
            "Validate every completed comanda in a date range (admin)",
            "validate-range <from> <to>",
            cmd_validate_range,
        ),
        CommandEntry::new(
            "traspaso",
            "Move validated comandas between registers (admin)",
            "traspaso <from-register> <to-register> <from> <to>",
            cmd_traspaso,
        ),
        CommandEntry::new(
            "dedupe",
            "Remove duplicated comandas",
            "dedupe",
            cmd_dedupe,
        ),
        CommandEntry::new(
            "export",
            "Write comandas or the activity log as CSV",
            "export <comandas|actividad> <path> [from] [to]",
            cmd_export,
        )
        .with_subcommands(&["comandas", "actividad"]),
        CommandEntry::new(
            "log",
            "Show recent activity",
            "log [limit]",
            cmd_log,
        ),
    ]
}

/// `[from] [to]`, defaulting to today and to `from`.
fn range_args(context: &ShellContext, args: &[&str]) -> Result<DateRange, CommandError> {
    let from = match args.first() {
        Some(raw) => parse_date(raw)?,
        None => context.clock.today(),
    };
    let to = match args.get(1) {
        Some(raw) => parse_date(raw)?,
        None => from,
    };
    Ok(DateRange::new(from, to)?)
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let range = range_args(context, args)?;
    let summary = context.comandas.summarize(range);
    output::section(format!("Summary {} to {}", range.from(), range.to()));
    output::info(format!(
        "  Completed : {} ({} validated, {} pending validation)",
        summary.count, summary.validated, summary.unvalidated
    ));
    output::info(format!(
        "  Income    : {} ({})",
        context.money(summary.income_total),
        summary.income_count
    ));
    output::info(format!(
        "  Expense   : {} ({})",
        context.money(summary.expense_total),
        summary.expense_count
    ));
    output::info(format!("  Net       : {}", context.money(summary.net)));
    Ok(())
}

fn cmd_validate_range(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "validate-range <from> <to>";
    let from = parse_date(require_arg(args, 0, usage)?)?;
    let to = parse_date(require_arg(args, 1, usage)?)?;
    let range = DateRange::new(from, to)?;
    if !context.confirm(&format!("Validate all completed comandas from {from} to {to}?"))? {
        output::info("Nothing validated.");
        return Ok(());
    }
    let ids = context.comandas.validate_range(range)?;
    output::success(format!("{} comandas validated.", ids.len()));
    Ok(())
}

fn parse_register(raw: &str) -> Result<CashRegister, CommandError> {
    CashRegister::parse(raw)
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown register `{raw}`")))
}

fn cmd_traspaso(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "traspaso <from-register> <to-register> <from> <to>";
    let source = parse_register(require_arg(args, 0, usage)?)?;
    let target = parse_register(require_arg(args, 1, usage)?)?;
    let range = DateRange::new(
        parse_date(require_arg(args, 2, usage)?)?,
        parse_date(require_arg(args, 3, usage)?)?,
    )?;
    let traspaso = context.comandas.transfer(source, target, range)?;
    output::success(format!(
        "Traspaso of {} comandas from {} to {}: {}",
        traspaso.comanda_ids.len(),
        traspaso.from,
        traspaso.to,
        context.money(traspaso.total_usd)
    ));
    Ok(())
}

fn cmd_dedupe(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let removed = context.comandas.deduplicate()?;
    if removed == 0 {
        output::info("No duplicated comandas found.");
    } else {
        output::success(format!("{removed} duplicated comandas removed."));
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "export <comandas|actividad> <path> [from] [to]";
    let target = require_arg(args, 0, usage)?;
    let path = PathBuf::from(require_arg(args, 1, usage)?);
    let rows = match target {
        "comandas" => {
            let mut filter = ComandaFilter::default();
            if args.len() > 2 {
                filter.range = Some(range_args(context, &args[2..])?);
            }
            let rate = context.rate();
            export_comandas_to_path(context.comandas.ledger().filter(&filter), rate, &path)?
        }
        "actividad" | "activity" => {
            let entries: Vec<ActivityEntry> = context.comandas.activity().entries().to_vec();
            export_activity_to_path(&entries, &path)?
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown export target `{other}`"
            )))
        }
    };
    context.comandas.record_activity(
        ActivityAction::Export,
        format!("Exportación de {target} ({rows} filas)"),
        Some(path.display().to_string()),
    )?;
    output::success(format!("{rows} rows written to {}.", path.display()));
    Ok(())
}

fn cmd_log(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let limit = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid limit `{raw}`")))?,
        None => 20,
    };
    let entries = context.comandas.activity().recent(limit);
    output::section("Activity");
    if entries.is_empty() {
        output::info("No activity recorded yet.");
    }
    for entry in entries {
        output::info(format!(
            "  {}  {:<10} {:<28} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.actor,
            entry.action.label(),
            entry.description
        ));
    }
    Ok(())
}
