//! shline: parse shell input lines and print their structure.
//!
//! Reads lines from stdin (or a single line from `-c`), parses each into
//! commands, pipeline stages, tokens and redirections, and prints the
//! result as an indented tree, JSON, or re-quoted shell text.
//!
//! Lines ending inside quotes or after a trailing `|` are joined with the
//! following line before being reported.

use shline::config::{Config, OutputFormat};
use shline::parse::{Command, Feed, LineAccumulator, SyntaxError};
use shline::{logging, render};
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

const USAGE: &str = "\
usage: shline [options] [-c LINE]

options:
  -c LINE          parse LINE and exit (status 2 on syntax error)
  --tree           print an indented tree (default)
  --json           print one JSON object per input
  --shell          print commands re-rendered as shell text
  --offsets        include byte offsets in tree output
  --config PATH    read overrides from PATH instead of ~/.config/shline/config.toml
  --dump-config    print the effective configuration and exit
  -h, --help       show this help";

#[derive(Debug, Default)]
struct Options {
    command: Option<String>,
    format: Option<OutputFormat>,
    show_offsets: bool,
    config_path: Option<PathBuf>,
    dump_config: bool,
    help: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => {
                opts.command = Some(args.next().ok_or("-c requires an argument")?);
            }
            "--tree" => opts.format = Some(OutputFormat::Tree),
            "--json" => opts.format = Some(OutputFormat::Json),
            "--shell" => opts.format = Some(OutputFormat::Shell),
            "--offsets" => opts.show_offsets = true,
            "--config" => {
                let path = args.next().ok_or("--config requires a path")?;
                opts.config_path = Some(PathBuf::from(path));
            }
            "--dump-config" => opts.dump_config = true,
            "-h" | "--help" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(opts)
}

/// Print one parse result in the configured format. Returns false on a syntax error.
fn report(
    config: &Config,
    text: &str,
    result: &Result<Vec<Command>, SyntaxError>,
    out: &mut impl Write,
) -> std::io::Result<bool> {
    logging::log_parse(text, result);

    if config.output.format == OutputFormat::Json {
        writeln!(out, "{}", render::json(text, result))?;
        return Ok(result.is_ok());
    }

    match result {
        Ok(commands) => {
            let rendered = match config.output.format {
                OutputFormat::Shell => render::shell(commands),
                _ => render::tree(commands, config.output.show_offsets),
            };
            write!(out, "{rendered}")?;
            Ok(true)
        }
        Err(e) => {
            eprint!("{}", render::error(text, e));
            Ok(false)
        }
    }
}

fn run_stdin(config: &Config) -> std::io::Result<bool> {
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = std::io::stdout();
    let mut acc = LineAccumulator::new();
    let mut all_ok = true;

    let prompt = |stdout: &mut std::io::Stdout, pending: bool| -> std::io::Result<()> {
        if interactive {
            let p = if pending {
                &config.repl.continuation_prompt
            } else {
                &config.repl.prompt
            };
            write!(stdout, "{p}")?;
            stdout.flush()?;
        }
        Ok(())
    };

    prompt(&mut stdout, false)?;
    for line in stdin.lock().lines() {
        let line = line?;
        if let Feed::Complete { text, result } = acc.feed(&line) {
            all_ok &= report(config, &text, &result, &mut stdout)?;
        }
        prompt(&mut stdout, acc.is_pending())?;
    }
    if let Some(Feed::Complete { text, result }) = acc.finish() {
        all_ok &= report(config, &text, &result, &mut stdout)?;
    }
    if interactive {
        writeln!(stdout)?;
    }
    Ok(all_ok)
}

fn main() {
    let opts = match parse_args(std::env::args().skip(1)) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("shline: {e}\n{USAGE}");
            std::process::exit(1);
        }
    };
    if opts.help {
        println!("{USAGE}");
        return;
    }

    let mut config = Config::load(opts.config_path.as_deref());
    if let Some(format) = opts.format {
        config.output.format = format;
    }
    if opts.show_offsets {
        config.output.show_offsets = true;
    }

    if opts.dump_config {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("shline: cannot serialize config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    logging::init(&config.logging);

    let outcome = match &opts.command {
        Some(line) => {
            let result = shline::parse(line);
            report(&config, line, &result, &mut std::io::stdout())
        }
        None => run_stdin(&config),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("shline: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_flags() {
        let opts = parse_args(args(&["--json", "--offsets", "-c", "ls | wc"])).unwrap();
        assert_eq!(opts.format, Some(OutputFormat::Json));
        assert!(opts.show_offsets);
        assert_eq!(opts.command.as_deref(), Some("ls | wc"));
    }

    #[test]
    fn last_format_flag_wins() {
        let opts = parse_args(args(&["--json", "--shell"])).unwrap();
        assert_eq!(opts.format, Some(OutputFormat::Shell));
    }

    #[test]
    fn missing_values_are_errors() {
        assert!(parse_args(args(&["-c"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }

    #[test]
    fn report_json_line() {
        let mut config = Config::default_config();
        config.output.format = OutputFormat::Json;
        let mut out = Vec::new();
        let result = shline::parse("echo hi");
        assert!(report(&config, "echo hi", &result, &mut out).unwrap());
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["commands"][0]["subcommands"][0]["tokens"][0]["text"], "echo");
    }

    #[test]
    fn report_error_is_false() {
        let config = Config::default_config();
        let mut out = Vec::new();
        let result = shline::parse("| wc");
        assert!(!report(&config, "| wc", &result, &mut out).unwrap());
        assert!(out.is_empty());
    }
}
