use crate::activity::ActivityAction;
use crate::cli::context::{parse_amount, require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::discounts::PaymentMethod;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "discount",
        "Show or change payment-method discounts",
        "discount [show | set <method> <pct> | reset | apply <method> <amount>]",
        cmd_discount,
    )
    .with_subcommands(&["show", "set", "reset", "apply"])]
}

fn parse_method(raw: &str) -> Result<PaymentMethod, CommandError> {
    PaymentMethod::parse(raw).ok_or_else(|| {
        let known: Vec<_> = PaymentMethod::ALL.iter().map(|m| m.key()).collect();
        CommandError::InvalidArguments(format!(
            "unknown payment method `{raw}` (use one of: {})",
            known.join(", ")
        ))
    })
}

fn cmd_discount(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied().unwrap_or("show") {
        "show" => {
            output::section("Discounts by payment method");
            for (method, pct) in context.discounts.table().iter() {
                output::info(format!("  {:<16} {:>6.2}%", method.key(), pct));
            }
            Ok(())
        }
        "set" => {
            let usage = "discount set <method> <pct>";
            let method = parse_method(require_arg(args, 1, usage)?)?;
            let raw = args[2..].join(" ");
            if raw.trim().is_empty() {
                return Err(CommandError::InvalidArguments(format!("usage: {usage}")));
            }
            let stored = context.discounts.update_from_input(method, &raw)?;
            context.comandas.record_activity(
                ActivityAction::DiscountUpdated,
                format!("Descuento {} = {:.2}%", method.key(), stored),
                Some(method.key().to_string()),
            )?;
            output::success(format!("Discount for {} set to {:.2}%.", method.key(), stored));
            Ok(())
        }
        "reset" => {
            if !context.confirm("Restore default discounts?")? {
                output::info("Discounts unchanged.");
                return Ok(());
            }
            context.discounts.reset()?;
            context.comandas.record_activity(
                ActivityAction::DiscountUpdated,
                "Descuentos restablecidos",
                None,
            )?;
            output::success("Discounts restored to defaults.");
            Ok(())
        }
        "apply" => {
            let usage = "discount apply <method> <amount>";
            let method = parse_method(require_arg(args, 1, usage)?)?;
            let amount = parse_amount(require_arg(args, 2, usage)?)?;
            let net = context.discounts.apply(method, amount);
            output::info(format!(
                "{} with {} ({:.2}%): {}",
                context.money(amount),
                method.key(),
                context.discounts.discount_for(method),
                context.money(net)
            ));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown discount action `{other}`"
        ))),
    }
}
