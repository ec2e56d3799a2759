use crate::activity::ActivityAction;
use crate::cli::context::{parse_amount, require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::currency::{convert, format_amount, format_money, Currency, FALLBACK_RATE};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "rate",
            "Show, set or list the USD/ARS exchange rate",
            "rate [show | set <value> | history [limit]]",
            cmd_rate,
        )
        .with_subcommands(&["show", "set", "history"]),
        CommandEntry::new(
            "convert",
            "Convert an amount between USD and ARS",
            "convert <amount> <usd|ars>",
            cmd_convert,
        ),
    ]
}

fn cmd_rate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied().unwrap_or("show") {
        "show" => show_rate(context),
        "set" => {
            let raw = require_arg(args, 1, "rate set <value>")?;
            let value = parse_amount(raw)?;
            let rate = context.rates.save_manual(value)?;
            context.comandas.record_activity(
                ActivityAction::RateUpdated,
                format!("Tipo de cambio manual {:.2}", rate.sell_value),
                None,
            )?;
            output::success(format!(
                "Exchange rate set to {}.",
                format_amount(&context.config.locale_config(), rate.sell_value)
            ));
            Ok(())
        }
        "history" => {
            let limit = match args.get(1) {
                Some(raw) => raw.parse::<usize>().map_err(|_| {
                    CommandError::InvalidArguments(format!("invalid limit `{raw}`"))
                })?,
                None => context.config.history_limit,
            };
            let history = context.rates.load_history(limit);
            output::section("Exchange rate history");
            if history.is_empty() {
                output::info("No rates recorded yet.");
            }
            let locale = context.config.locale_config();
            for rate in history {
                output::info(format!(
                    "  {}  {:>12}  {}{}",
                    rate.date.format("%Y-%m-%d %H:%M"),
                    format_amount(&locale, rate.sell_value),
                    rate.source,
                    if rate.is_manual { " (manual)" } else { "" }
                ));
            }
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown rate action `{other}`"
        ))),
    }
}

fn show_rate(context: &ShellContext) -> CommandResult {
    let rate = context.rates.current();
    let locale = context.config.locale_config();
    output::section("Exchange rate");
    if rate.is_usable() {
        output::info(format!(
            "  Sell: {}  Buy: {}",
            format_amount(&locale, rate.sell_value),
            format_amount(&locale, rate.buy_value)
        ));
        output::info(format!(
            "  Source: {}{}  ({})",
            rate.source,
            if rate.is_manual { " (manual)" } else { "" },
            rate.date.format("%Y-%m-%d %H:%M")
        ));
    } else {
        output::warning(format!(
            "No exchange rate loaded; conversions use {}.",
            format_amount(&locale, FALLBACK_RATE)
        ));
    }
    if let Some(err) = context.rates.last_error() {
        output::hint(err);
    }
    Ok(())
}

fn cmd_convert(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "convert <amount> <usd|ars>";
    let amount = parse_amount(require_arg(args, 0, usage)?)?;
    let from = Currency::parse(require_arg(args, 1, usage)?)
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))?;
    let to = match from {
        Currency::Usd => Currency::Ars,
        Currency::Ars => Currency::Usd,
    };
    let locale = context.config.locale_config();
    let converted = convert(amount, from, to, context.rate());
    output::info(format!(
        "{} = {}",
        format_money(&locale, amount, from),
        format_money(&locale, converted, to)
    ));
    Ok(())
}
