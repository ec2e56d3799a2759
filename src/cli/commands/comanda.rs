use crate::cli::context::{parse_amount, require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::currency::Currency;
use crate::directory::{Directory, DirectoryEntry};
use crate::discounts::PaymentMethod;
use crate::ledger::{
    BusinessState, CashRegister, Comanda, ComandaFilter, ComandaKind, ItemKind, LineItem,
    PartyRef, Payment,
};

const USAGE: &str = "comanda <new|item|pay|deposit|state|validate|reverse|delete|list|show> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "comanda",
        "Create, edit, validate and list comandas",
        "comanda new <ingreso|egreso> <client> <staff> [unit] [register]\n         \
         comanda item <n> <producto|servicio> <name> <qty> <price> [discount%]\n         \
         comanda item <n> <catalog item> [qty] [discount%]\n         \
         comanda pay <n> <method> <amount> [usd|ars]\n         \
         comanda deposit <n> <client> <amount> <usd|ars>\n         \
         comanda state <n> <completado|incompleto>\n         \
         comanda validate <n> | reverse <n> <reason> | delete <n>\n         \
         comanda list [pendiente|completado|incompleto|validadas|no_validadas] | show <n>",
        cmd_comanda,
    )
    .with_subcommands(&[
        "new", "item", "pay", "deposit", "state", "validate", "reverse", "delete", "list", "show",
    ])]
}

fn cmd_comanda(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = require_arg(args, 0, USAGE)?;
    let rest = &args[1..];
    match action {
        "new" => new_comanda(context, rest),
        "item" => add_item(context, rest),
        "pay" => add_payment(context, rest),
        "deposit" => apply_deposit(context, rest),
        "state" => change_state(context, rest),
        "validate" => {
            let number = require_arg(rest, 0, "comanda validate <n>")?;
            context.comandas.validate(number)?;
            output::success(format!("Comanda {number} validated."));
            Ok(())
        }
        "reverse" => {
            let usage = "comanda reverse <n> <reason>";
            let number = require_arg(rest, 0, usage)?;
            let reason = rest[1..].join(" ");
            context.comandas.reverse_validation(number, &reason)?;
            output::warning(format!("Validation of comanda {number} reversed."));
            Ok(())
        }
        "delete" => {
            let number = require_arg(rest, 0, "comanda delete <n>")?;
            if !context.confirm(&format!("Delete comanda {number}?"))? {
                output::info("Nothing deleted.");
                return Ok(());
            }
            let removed = context.comandas.delete(number)?;
            output::success(format!("Comanda {} deleted.", removed.number));
            Ok(())
        }
        "list" => list_comandas(context, rest),
        "show" => {
            let number = require_arg(rest, 0, "comanda show <n>")?;
            let comanda = context.comandas.find(number)?.clone();
            print_detail(context, &comanda);
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown comanda action `{other}`"
        ))),
    }
}

/// Links to an active directory entry when the name matches one exactly.
fn party<T: DirectoryEntry>(directory: &Directory<T>, name: &str) -> PartyRef {
    directory
        .find_by_name(name)
        .filter(|entry| entry.is_active())
        .map(|entry| PartyRef::with_id(entry.id(), entry.name()))
        .unwrap_or_else(|| PartyRef::named(name.trim()))
}

fn new_comanda(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "comanda new <ingreso|egreso> <client> <staff> [unit] [register]";
    let kind_raw = require_arg(args, 0, usage)?;
    let kind = ComandaKind::parse(kind_raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("unknown comanda kind `{kind_raw}`"))
    })?;
    let client = party(&context.clients, require_arg(args, 1, usage)?);
    let staff = party(&context.staff, require_arg(args, 2, usage)?);
    let unit = args.get(3).copied().unwrap_or("general");
    let register = match args.get(4) {
        Some(raw) => CashRegister::parse(raw)
            .ok_or_else(|| CommandError::InvalidArguments(format!("unknown register `{raw}`")))?,
        None => context.config.default_register,
    };

    let mut comanda = Comanda::new(context.clock.now(), unit, client, staff, kind);
    comanda.register = register;
    let id = context.comandas.create(comanda)?;
    let number = context
        .comandas
        .ledger()
        .comanda(id)
        .map(|c| c.number.clone())
        .unwrap_or_default();
    output::success(format!("Comanda {number} created ({}, {register}).", kind.label()));
    Ok(())
}

fn parse_quantity(raw: &str) -> Result<u32, CommandError> {
    match raw.parse::<u32>() {
        Ok(qty) if qty > 0 => Ok(qty),
        _ => Err(CommandError::InvalidArguments(format!(
            "quantity `{raw}` must be a positive integer"
        ))),
    }
}

fn add_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "comanda item <n> <producto|servicio> <name> <qty> <price> [discount%]";
    let number = require_arg(args, 0, usage)?;
    let second = require_arg(args, 1, usage)?;

    let item = match ItemKind::parse(second) {
        Some(kind) => {
            let name = require_arg(args, 2, usage)?;
            let qty = parse_quantity(require_arg(args, 3, usage)?)?;
            let price = parse_amount(require_arg(args, 4, usage)?)?;
            let pct = args.get(5).map(|raw| parse_amount(raw)).transpose()?;
            LineItem::new(kind, name, qty, price, pct.unwrap_or(0.0))
        }
        None => {
            let catalog_item = context
                .catalog
                .find_by_name(second)
                .filter(|item| item.active)
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!(
                        "`{second}` is neither an item kind nor an active catalog item"
                    ))
                })?;
            let qty = args.get(2).map(|raw| parse_quantity(raw)).transpose()?;
            let pct = args.get(3).map(|raw| parse_amount(raw)).transpose()?;
            catalog_item.to_line_item(qty.unwrap_or(1), pct.unwrap_or(0.0))
        }
    };

    let label = item.name.clone();
    context
        .comandas
        .edit(number, move |comanda| comanda.line_items.push(item))?;
    let total = context.comandas.find(number)?.final_total;
    output::success(format!(
        "Added {label} to comanda {number}. Total: {}",
        context.money(total)
    ));
    Ok(())
}

fn add_payment(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "comanda pay <n> <method> <amount> [usd|ars]";
    let number = require_arg(args, 0, usage)?;
    let method_raw = require_arg(args, 1, usage)?;
    let method = PaymentMethod::parse(method_raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("unknown payment method `{method_raw}`"))
    })?;
    let amount = parse_amount(require_arg(args, 2, usage)?)?;
    if amount <= 0.0 {
        return Err(CommandError::InvalidArguments(
            "payment amount must be greater than zero".into(),
        ));
    }
    let currency = match args.get(3) {
        Some(raw) => Currency::parse(raw)
            .ok_or_else(|| CommandError::InvalidArguments(format!("unknown currency `{raw}`")))?,
        None => Currency::Usd,
    };
    context.comandas.edit(number, move |comanda| {
        comanda.payments.push(Payment {
            method,
            amount,
            currency,
        })
    })?;
    let balance = context.comandas.find(number)?.balance_due(context.rate());
    output::success(format!(
        "Payment registered. Balance due: {}",
        context.money(balance)
    ));
    Ok(())
}

fn apply_deposit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "comanda deposit <n> <client> <amount> <usd|ars>";
    let number = require_arg(args, 0, usage)?;
    let client_name = require_arg(args, 1, usage)?;
    let amount = parse_amount(require_arg(args, 2, usage)?)?;
    let currency_raw = require_arg(args, 3, usage)?;
    let currency = Currency::parse(currency_raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("unknown currency `{currency_raw}`"))
    })?;
    let client_id = party(&context.clients, client_name).id.ok_or_else(|| {
        CommandError::InvalidArguments(format!("client `{client_name}` not found"))
    })?;

    let applied = context.comandas.apply_deposit(
        number,
        &mut context.clients,
        client_id,
        currency,
        amount,
    )?;
    output::success(format!(
        "Deposit of {:.2} {} applied ({}).",
        applied.amount,
        applied.currency,
        context.money(applied.amount_usd)
    ));
    Ok(())
}

fn change_state(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "comanda state <n> <completado|incompleto>";
    let number = require_arg(args, 0, usage)?;
    let raw = require_arg(args, 1, usage)?;
    let next = BusinessState::parse(raw)
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown state `{raw}`")))?;
    context.comandas.set_business_state(number, next)?;
    output::success(format!("Comanda {number} is now {}.", next.label()));
    Ok(())
}

fn list_comandas(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut filter = ComandaFilter::default();
    match args.first().copied() {
        None => {}
        Some("validadas") => filter.validated = Some(true),
        Some("no_validadas") => filter.validated = Some(false),
        Some(raw) => {
            filter.business_state = Some(BusinessState::parse(raw).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown filter `{raw}`"))
            })?)
        }
    }
    let comandas: Vec<Comanda> = context
        .comandas
        .ledger()
        .filter(&filter)
        .into_iter()
        .cloned()
        .collect();
    output::section(format!("Comandas ({})", comandas.len()));
    for comanda in &comandas {
        output::info(format!(
            "  {}  {}  {:<8} {:<12} {:<12} {:<20} {}",
            comanda.number,
            comanda.date.format("%Y-%m-%d"),
            comanda.kind.label(),
            comanda.business_state.label(),
            comanda.validation.label(),
            comanda.client.name,
            context.money(comanda.final_total)
        ));
    }
    Ok(())
}

fn print_detail(context: &ShellContext, comanda: &Comanda) {
    output::section(format!("Comanda {}", comanda.number));
    output::info(format!("  Date      : {}", comanda.date.format("%Y-%m-%d %H:%M")));
    output::info(format!("  Unit      : {}", comanda.business_unit));
    output::info(format!("  Register  : {}", comanda.register));
    output::info(format!("  Client    : {}", comanda.client.name));
    output::info(format!("  Staff     : {}", comanda.staff_member.name));
    output::info(format!(
        "  State     : {} / {}",
        comanda.business_state.label(),
        comanda.validation.label()
    ));
    for item in &comanda.line_items {
        output::info(format!(
            "    {} x{} @ {:.2} -{:.2}% = {:.2}",
            item.name, item.quantity, item.unit_price, item.discount_pct, item.subtotal
        ));
    }
    output::info(format!("  Subtotal  : {}", context.money(comanda.subtotal)));
    output::info(format!("  Discounts : {}", context.money(comanda.total_discounts)));
    output::info(format!("  Deposit   : {}", context.money(comanda.total_deposit)));
    output::info(format!("  Total     : {}", context.money(comanda.final_total)));
    output::info(format!(
        "  Balance   : {}",
        context.money(comanda.balance_due(context.rate()))
    ));
}
