use crate::activity::ActivityAction;
use crate::cli::context::{parse_amount, require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::currency::{format_dual, Currency};
use crate::directory::{
    CatalogItem, Client, Directory, DirectoryEntry, Page, PageRequest, StaffMember,
};
use crate::ledger::ItemKind;

const PAGE_SIZE: usize = 20;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "client",
            "Manage clients and their deposits",
            "client add <name> [phone] [email] | list [page] [--all] | search <text>\n         \
             client deposit <name> <amount> <usd|ars> | delete <name> | restore <name>",
            cmd_client,
        )
        .with_subcommands(&["add", "list", "search", "deposit", "delete", "restore"]),
        CommandEntry::new(
            "staff",
            "Manage staff members",
            "staff add <name> <specialty> | list [page] [--all] | toggle <name>",
            cmd_staff,
        )
        .with_subcommands(&["add", "list", "toggle"]),
        CommandEntry::new(
            "catalog",
            "Manage the product and service catalog",
            "catalog add <name> <producto|servicio> <unit> <price> | list [page] [--all] | toggle <name>",
            cmd_catalog,
        )
        .with_subcommands(&["add", "list", "toggle"]),
    ]
}

/// `[page] [--all]` in any order.
fn page_args(args: &[&str]) -> Result<(PageRequest, bool), CommandError> {
    let mut page = 1;
    let mut include_inactive = false;
    for raw in args {
        if *raw == "--all" {
            include_inactive = true;
            continue;
        }
        page = raw
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid page `{raw}`")))?;
    }
    Ok((PageRequest::new(page, PAGE_SIZE), include_inactive))
}

fn lookup<T: DirectoryEntry>(directory: &Directory<T>, name: &str) -> Result<T, CommandError> {
    directory
        .find_by_name(name)
        .cloned()
        .ok_or_else(|| CommandError::InvalidArguments(format!("{} `{name}` not found", T::LABEL)))
}

fn print_page<T, F>(title: &str, page: &Page<T>, row: F)
where
    F: Fn(&T) -> String,
{
    output::section(format!(
        "{title} ({} total, page {}/{})",
        page.total, page.page, page.total_pages
    ));
    if page.items.is_empty() {
        output::info("  Nothing to show.");
    }
    for item in &page.items {
        output::info(format!("  {}", row(item)));
    }
}

fn inactive_marker(active: bool) -> &'static str {
    if active {
        ""
    } else {
        " [inactivo]"
    }
}

fn cmd_client(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "client <add|list|search|deposit|delete|restore> ...";
    let action = require_arg(args, 0, usage)?;
    let rest = &args[1..];
    match action {
        "add" => {
            let name = require_arg(rest, 0, "client add <name> [phone] [email]")?;
            let client = Client::new(name, context.clock.now()).with_contact(
                rest.get(1).copied().unwrap_or_default(),
                rest.get(2).copied().unwrap_or_default(),
            );
            context.clients.insert(client)?;
            output::success(format!("Client {name} added."));
            Ok(())
        }
        "list" => {
            let (request, include_inactive) = page_args(rest)?;
            let page = context.clients.list(request, include_inactive);
            print_page("Clients", &page, |client| {
                format!(
                    "{:<24} {:<14} {:<28} seña USD {:.2} / ARS {:.2}{}",
                    client.name,
                    client.phone,
                    client.email,
                    client.deposits.usd,
                    client.deposits.ars,
                    inactive_marker(client.active)
                )
            });
            Ok(())
        }
        "search" => {
            let query = rest.join(" ");
            let hits = context.clients.search(&query);
            output::section(format!("Clients matching `{query}` ({})", hits.len()));
            for client in hits {
                output::info(format!("  {:<24} {}", client.name, client.phone));
            }
            Ok(())
        }
        "deposit" => {
            let usage = "client deposit <name> <amount> <usd|ars>";
            let client = lookup(&context.clients, require_arg(rest, 0, usage)?)?;
            let amount = parse_amount(require_arg(rest, 1, usage)?)?;
            let currency_raw = require_arg(rest, 2, usage)?;
            let currency = Currency::parse(currency_raw).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown currency `{currency_raw}`"))
            })?;
            if !client.active {
                return Err(CommandError::InvalidArguments(format!(
                    "client `{}` is inactive",
                    client.name
                )));
            }
            let balance = context
                .clients
                .try_update(client.id, |entry| entry.add_deposit(currency, amount))?;
            context.comandas.record_activity(
                ActivityAction::DepositApplied,
                format!("Seña de {} {:.2} {}", client.name, amount, currency),
                Some(client.id.to_string()),
            )?;
            output::success(format!(
                "Deposit registered for {}. Balance: {:.2} {}",
                client.name, balance, currency
            ));
            Ok(())
        }
        "delete" => {
            let client = lookup(&context.clients, require_arg(rest, 0, "client delete <name>")?)?;
            if !context.confirm(&format!("Deactivate client {}?", client.name))? {
                output::info("Client unchanged.");
                return Ok(());
            }
            context.clients.soft_delete(client.id)?;
            output::success(format!("Client {} deactivated.", client.name));
            Ok(())
        }
        "restore" => {
            let client = lookup(&context.clients, require_arg(rest, 0, "client restore <name>")?)?;
            context.clients.restore(client.id)?;
            output::success(format!("Client {} restored.", client.name));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown client action `{other}`"
        ))),
    }
}

fn cmd_staff(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "staff <add|list|toggle> ...";
    let action = require_arg(args, 0, usage)?;
    let rest = &args[1..];
    match action {
        "add" => {
            let usage = "staff add <name> <specialty>";
            let name = require_arg(rest, 0, usage)?;
            let specialty = require_arg(rest, 1, usage)?;
            context.staff.insert(StaffMember::new(name, specialty))?;
            output::success(format!("Staff member {name} added."));
            Ok(())
        }
        "list" => {
            let (request, include_inactive) = page_args(rest)?;
            let page = context.staff.list(request, include_inactive);
            print_page("Staff", &page, |member| {
                format!(
                    "{:<24} {:<16}{}",
                    member.name,
                    member.specialty,
                    inactive_marker(member.active)
                )
            });
            Ok(())
        }
        "toggle" => {
            let member = lookup(&context.staff, require_arg(rest, 0, "staff toggle <name>")?)?;
            let active = context.staff.toggle_active(member.id)?;
            output::success(format!(
                "Staff member {} is now {}.",
                member.name,
                if active { "active" } else { "inactive" }
            ));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown staff action `{other}`"
        ))),
    }
}

fn cmd_catalog(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "catalog <add|list|toggle> ...";
    let action = require_arg(args, 0, usage)?;
    let rest = &args[1..];
    match action {
        "add" => {
            let usage = "catalog add <name> <producto|servicio> <unit> <price>";
            let name = require_arg(rest, 0, usage)?;
            let kind_raw = require_arg(rest, 1, usage)?;
            let kind = ItemKind::parse(kind_raw).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown item kind `{kind_raw}`"))
            })?;
            let unit = require_arg(rest, 2, usage)?;
            let price = parse_amount(require_arg(rest, 3, usage)?)?;
            context
                .catalog
                .insert(CatalogItem::new(name, kind, unit, price))?;
            output::success(format!("{} {name} added to the catalog.", kind.label()));
            Ok(())
        }
        "list" => {
            let (request, include_inactive) = page_args(rest)?;
            let page = context.catalog.list(request, include_inactive);
            let rate = context.rate();
            let show_ars = context.config.show_ars;
            print_page("Catalog", &page, |item| {
                format!(
                    "{:<24} {:<9} {:<14} {}{}",
                    item.name,
                    item.kind.label(),
                    item.business_unit,
                    format_dual(item.price, rate, show_ars),
                    inactive_marker(item.active)
                )
            });
            Ok(())
        }
        "toggle" => {
            let item = lookup(&context.catalog, require_arg(rest, 0, "catalog toggle <name>")?)?;
            let active = context.catalog.toggle_active(item.id)?;
            output::success(format!(
                "{} is now {}.",
                item.name,
                if active { "active" } else { "inactive" }
            ));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown catalog action `{other}`"
        ))),
    }
}
