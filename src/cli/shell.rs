use std::{
    collections::BTreeMap,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::context::{CliError, CliMode, LoopControl, ShellContext};
use crate::cli::output;

pub const SCRIPT_ENV: &str = "CAJA_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    if let Some(err) = context.rates.last_error() {
        tracing::debug!(error = err, "starting with cached exchange rate");
    }

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CajaCompleter, DefaultHistory>::new()?;
    editor.set_helper(Some(CajaCompleter::from_context(context)));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    output::section("Caja");
    output::info("Type `help` to list commands.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.trim()).ok();
                }
                if feed(context, &line)? == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Reads commands from stdin until `exit` or end of input.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        if !context.running || feed(context, &line?)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Runs one input line. Blank lines and `#` comments are skipped; command
/// failures are reported and the shell keeps going.
fn feed(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = match shell_words::split(line) {
        Ok(tokens) if !tokens.is_empty() => tokens,
        Ok(_) => return Ok(LoopControl::Continue),
        Err(err) => {
            output::warning(format!("Could not parse `{line}`: {err}"));
            return Ok(LoopControl::Continue);
        }
    };

    let (raw, rest) = (&tokens[0], &tokens[1..]);
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.to_string());

    match context.dispatch(&raw.to_lowercase(), raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        Ok(LoopControl::Continue) => Ok(LoopControl::Continue),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

/// Completes command names, then the action word of commands that take one
/// (`comanda va<TAB>` becomes `comanda validate`).
struct CajaCompleter {
    commands: BTreeMap<&'static str, &'static [&'static str]>,
}

impl CajaCompleter {
    fn from_context(context: &ShellContext) -> Self {
        Self {
            commands: context
                .registry
                .list()
                .map(|entry| (entry.name, entry.subcommands))
                .collect(),
        }
    }

    fn candidates(&self, line: &str) -> (usize, Vec<&'static str>) {
        let words: Vec<&str> = line.split_whitespace().collect();
        let starting_word = line.is_empty() || line.ends_with(char::is_whitespace);
        let start = if starting_word {
            line.len()
        } else {
            line.len() - words.last().map_or(0, |word| word.len())
        };
        let needle = if starting_word {
            String::new()
        } else {
            words.last().map(|word| word.to_lowercase()).unwrap_or_default()
        };

        let position = if starting_word { words.len() } else { words.len() - 1 };
        let pool: Vec<&'static str> = match position {
            0 => self.commands.keys().copied().collect(),
            1 => self
                .commands
                .get(words[0].to_lowercase().as_str())
                .map(|subs| subs.to_vec())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let matches = pool
            .into_iter()
            .filter(|candidate| candidate.starts_with(&needle))
            .collect();
        (start, matches)
    }
}

impl Completer for CajaCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(&line[..pos]);
        let pairs = matches
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for CajaCompleter {
    type Hint = String;
}

impl Highlighter for CajaCompleter {}

impl Validator for CajaCompleter {}

impl Helper for CajaCompleter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer() -> CajaCompleter {
        CajaCompleter {
            commands: BTreeMap::from([
                ("comanda", &["new", "validate", "list"][..]),
                ("config", &["show", "set"][..]),
                ("convert", &[][..]),
            ]),
        }
    }

    #[test]
    fn completes_command_names() {
        let (start, matches) = completer().candidates("con");
        assert_eq!(start, 0);
        assert_eq!(matches, vec!["config", "convert"]);
    }

    #[test]
    fn completes_actions_after_the_command() {
        let (start, matches) = completer().candidates("comanda va");
        assert_eq!(start, 8);
        assert_eq!(matches, vec!["validate"]);

        let (start, all) = completer().candidates("config ");
        assert_eq!(start, 7);
        assert_eq!(all, vec!["show", "set"]);
    }

    #[test]
    fn later_words_are_left_alone() {
        assert!(completer().candidates("comanda new ingreso ").1.is_empty());
        assert!(completer().candidates("convert 10 ").1.is_empty());
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = shell_words::split("comanda new ingreso \"Ana Gómez\" Bruno").unwrap();
        assert_eq!(tokens, vec!["comanda", "new", "ingreso", "Ana Gómez", "Bruno"]);
        assert!(shell_words::split("client add \"Ana").is_err());
    }
}
