pub mod backup;
pub mod comanda;
pub mod config;
pub mod directory;
pub mod discount;
pub mod rate;
pub mod report;
pub mod system;

use crate::cli::registry::CommandEntry;

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(rate::definitions());
    commands.extend(discount::definitions());
    commands.extend(comanda::definitions());
    commands.extend(report::definitions());
    commands.extend(directory::definitions());
    commands.extend(config::definitions());
    commands.extend(backup::definitions());
    commands.extend(system::definitions());
    commands
}
