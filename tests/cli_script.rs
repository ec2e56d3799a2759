mod common;

use assert_cmd::Command;
use predicates::str::contains;

fn caja(base: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("caja_cli").unwrap();
    cmd.env("CAJA_CORE_CLI_SCRIPT", "1")
        .env("CAJA_CORE_HOME", base)
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn script_mode_runs_comanda_flow() {
    let base = common::temp_base();
    let export = base.join("comandas.csv");
    let input = format!(
        "# turno mañana\n\
         role admin mery\n\
         rate set 1200\n\
         client add \"Ana Gómez\" \"11 4444 2222\"\n\
         client deposit \"Ana Gómez\" 10 usd\n\
         comanda new ingreso \"Ana Gómez\" Bruno peluqueria\n\
         comanda item 1 servicio Corte 1 30\n\
         comanda deposit 1 \"Ana Gómez\" 10 usd\n\
         comanda state 1 completado\n\
         comanda validate 1\n\
         export comandas {}\n\
         exit\n",
        export.display()
    );

    caja(&base)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Comanda 00001 created"))
        .stdout(contains("Comanda 1 validated."))
        .stdout(contains("1 rows written"));

    let csv = std::fs::read_to_string(&export).unwrap();
    assert!(csv.starts_with("Numero,Fecha"));
    assert!(csv.contains("00001"));
    assert!(base.join("data").join("comandas.json").exists());
}

#[test]
fn cashier_cannot_validate_from_script() {
    let base = common::temp_base();
    caja(&base)
        .write_stdin(
            "comanda new ingreso Lucia Carla\n\
             comanda state 1 completado\n\
             comanda validate 1\n\
             exit\n",
        )
        .assert()
        .success()
        .stdout(contains("only an admin may validate comandas"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let base = common::temp_base();
    caja(&base)
        .write_stdin("ratee\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `ratee`"))
        .stdout(contains("Suggestion: `rate`?"));
}

#[test]
fn settings_persist_between_runs() {
    let base = common::temp_base();
    caja(&base)
        .write_stdin("config set show_ars no\nrole admin mery\nexit\n")
        .assert()
        .success()
        .stdout(contains("Now operating as mery (admin)."));

    caja(&base)
        .write_stdin("config show\nexit\n")
        .assert()
        .success()
        .stdout(contains("show_ars          : false"))
        .stdout(contains("operator          : mery"));
}

#[test]
fn backups_can_be_listed_and_restored() {
    let base = common::temp_base();
    caja(&base)
        .write_stdin(
            "comanda new ingreso Lucia Carla\n\
             comanda new ingreso Marta Bruno\n\
             backup list\n\
             backup restore comandas 1\n\
             comanda list\n\
             exit\n",
        )
        .assert()
        .success()
        .stdout(contains("Backups of comandas"))
        .stdout(contains("comandas restored from"));

    let ledger = std::fs::read_to_string(base.join("data").join("comandas.json")).unwrap();
    assert!(ledger.contains("Lucia"));
    assert!(!ledger.contains("Marta"));
}
