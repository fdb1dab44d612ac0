use crate::config::LoggingConfig;
use crate::parse::{Command, SyntaxError};
use log::info;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

/// Install the global logger: stderr at the configured level, plus an
/// appending file logger when `logging.file` is set.
///
/// Best-effort: an unopenable log file or an already-installed logger is
/// reported and otherwise ignored.
pub fn init(config: &LoggingConfig) {
    let level = config.level_filter();
    if level == LevelFilter::Off {
        return;
    }

    let term_config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        term_config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = config.file_path() {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => loggers.push(WriteLogger::new(level, simplelog::Config::default(), file)),
            Err(e) => eprintln!("shline: cannot open log file {}: {e}", path.display()),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("shline: logger already initialized: {e}");
    }
}

/// Record the outcome of parsing one input line.
pub fn log_parse(line: &str, result: &Result<Vec<Command>, SyntaxError>) {
    // Compact single-line form of the input
    let line_oneline = line.replace('\n', "\\n");
    let truncated: String = line_oneline.chars().take(200).collect();
    match result {
        Ok(commands) => info!("parsed {} command(s)\t{truncated}", commands.len()),
        Err(e) => info!("syntax error: {e}\t{truncated}"),
    }
}
