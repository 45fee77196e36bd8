use std::fmt;
use std::str::FromStr;

use clap::ArgMatches;
use clap::parser::ValueSource;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::OptionsError;

pub const CONSOLE_FORMAT: &str = "console";
pub const JSON_FORMAT: &str = "json";
pub const DEFAULT_LEVEL: &str = "info";

/// Output encoding of log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text.
    Console,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            CONSOLE_FORMAT => Ok(Self::Console),
            JSON_FORMAT => Ok(Self::Json),
            _ => Err(OptionsError::InvalidFormat(s.to_owned())),
        }
    }
}

/// Parse a level name into a `tracing` level.
///
/// Accepts `trace`, `debug`, `info` (also the empty string), `warn`, `error`,
/// and the severities above error (`dpanic`, `panic`, `fatal`), which all map
/// to [`Level::ERROR`]. Matching ignores ASCII case.
///
/// # Errors
/// Returns [`OptionsError::UnrecognizedLevel`] for any other name.
pub fn parse_level(name: &str) -> Result<Level, OptionsError> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "" | "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" | "dpanic" | "panic" | "fatal" => Ok(Level::ERROR),
        _ => Err(OptionsError::UnrecognizedLevel(name.to_owned())),
    }
}

/// Logging configuration.
///
/// Field names are kebab-case on the wire (`enable-color`, `output-paths`, ...),
/// and every field has a matching `--log.<name>` flag.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, clap::Args)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// The name of the logger.
    #[arg(long = "log.name", default_value = "")]
    pub name: String,

    /// Minimum log output LEVEL.
    #[arg(long = "log.level", value_name = "LEVEL", default_value = DEFAULT_LEVEL)]
    pub level: String,

    /// Log output FORMAT, console or json.
    #[arg(long = "log.format", value_name = "FORMAT", default_value = CONSOLE_FORMAT)]
    pub format: String,

    /// Development mode: debug floor and span timings.
    #[arg(long = "log.development")]
    pub development: bool,

    /// Enable ANSI colors in console format logs.
    #[arg(long = "log.enable-color")]
    pub enable_color: bool,

    /// Disable output of caller information (file and line) in the log.
    #[arg(long = "log.disable-caller")]
    pub disable_caller: bool,

    /// Disable span context on JSON records.
    #[arg(long = "log.disable-stacktrace")]
    pub disable_stacktrace: bool,

    /// Output paths of log: stdout, stderr, or a file path.
    #[arg(long = "log.output-paths", value_delimiter = ',', default_value = "stdout")]
    pub output_paths: Vec<String>,

    /// Output paths that additionally receive error records.
    ///
    /// This is a second copy, not a redirect: an error record goes to every
    /// entry of `output_paths` as well, so with the defaults errors appear on
    /// both stdout and stderr. Set this to an empty list to avoid the duplicate.
    #[arg(long = "log.error-output-paths", value_delimiter = ',', default_value = "stderr")]
    pub error_output_paths: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: DEFAULT_LEVEL.to_owned(),
            format: CONSOLE_FORMAT.to_owned(),
            development: false,
            enable_color: false,
            disable_caller: false,
            disable_stacktrace: false,
            output_paths: vec!["stdout".to_owned()],
            error_output_paths: vec!["stderr".to_owned()],
        }
    }
}

impl Options {
    /// Check every field, collecting all problems rather than stopping at the first.
    #[must_use]
    pub fn validate(&self) -> Vec<OptionsError> {
        let mut errs = Vec::new();
        if let Err(e) = parse_level(&self.level) {
            errs.push(e);
        }
        if let Err(e) = self.format.parse::<LogFormat>() {
            errs.push(e);
        }
        errs
    }

    /// Effective minimum level, with the development floor applied.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnrecognizedLevel`] if `level` does not parse.
    pub fn effective_level(&self) -> Result<Level, OptionsError> {
        let level = parse_level(&self.level)?;
        if self.development && level == Level::INFO {
            return Ok(Level::DEBUG);
        }
        Ok(level)
    }

    /// # Errors
    /// Returns [`OptionsError::InvalidFormat`] if `format` is not console or json.
    pub fn log_format(&self) -> Result<LogFormat, OptionsError> {
        self.format.parse()
    }

    /// Copy over the fields of `cli` that were given explicitly on the command line.
    ///
    /// `cli` and `matches` come from the same parse of a command that flattens
    /// [`Options`]. Fields holding only their flag default are left alone, so a
    /// config file keeps precedence over flag defaults.
    pub fn apply_cli(&mut self, cli: &Options, matches: &ArgMatches) {
        let given = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);

        if given("name") {
            self.name.clone_from(&cli.name);
        }
        if given("level") {
            self.level.clone_from(&cli.level);
        }
        if given("format") {
            self.format.clone_from(&cli.format);
        }
        if given("development") {
            self.development = cli.development;
        }
        if given("enable_color") {
            self.enable_color = cli.enable_color;
        }
        if given("disable_caller") {
            self.disable_caller = cli.disable_caller;
        }
        if given("disable_stacktrace") {
            self.disable_stacktrace = cli.disable_stacktrace;
        }
        if given("output_paths") {
            self.output_paths.clone_from(&cli.output_paths);
        }
        if given("error_output_paths") {
            self.error_output_paths.clone_from(&cli.error_output_paths);
        }
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches, Parser};

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        log: Options,
    }

    fn parse(args: &[&str]) -> (Options, ArgMatches) {
        let matches = Cli::command()
            .try_get_matches_from(std::iter::once("test").chain(args.iter().copied()))
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        (cli.log, matches)
    }

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.level, "info");
        assert_eq!(opts.format, "console");
        assert_eq!(opts.output_paths, vec!["stdout"]);
        assert_eq!(opts.error_output_paths, vec!["stderr"]);
        assert!(!opts.development && !opts.enable_color);
        assert!(opts.name.is_empty());
        assert!(opts.validate().is_empty());
    }

    #[test]
    fn validate_collects_every_error() {
        let opts = Options {
            level: "test".to_owned(),
            format: "test".to_owned(),
            enable_color: true,
            ..Options::default()
        };

        let rendered: Vec<String> = opts.validate().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                r#"unrecognized level: "test""#,
                r#"not a valid log format: "test""#
            ]
        );
    }

    #[test]
    fn format_is_case_insensitive() {
        for format in ["console", "JSON", "Json", "CONSOLE"] {
            let opts = Options {
                format: format.to_owned(),
                ..Options::default()
            };
            assert!(opts.validate().is_empty(), "{format} should be accepted");
        }
    }

    #[test]
    fn level_names_map_onto_tracing() {
        assert_eq!(parse_level("debug"), Ok(Level::DEBUG));
        assert_eq!(parse_level("WARN"), Ok(Level::WARN));
        assert_eq!(parse_level(""), Ok(Level::INFO));
        for above_error in ["dpanic", "panic", "fatal"] {
            assert_eq!(parse_level(above_error), Ok(Level::ERROR));
        }
        assert_eq!(
            parse_level("verbose"),
            Err(OptionsError::UnrecognizedLevel("verbose".to_owned()))
        );
    }

    #[test]
    fn development_lowers_default_level_only() {
        let mut opts = Options {
            development: true,
            ..Options::default()
        };
        assert_eq!(opts.effective_level(), Ok(Level::DEBUG));

        opts.level = "warn".to_owned();
        assert_eq!(opts.effective_level(), Ok(Level::WARN));
    }

    #[test]
    fn display_renders_kebab_case_json() {
        let value: serde_json::Value =
            serde_json::from_str(&Options::default().to_string()).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["enable-color"], false);
        assert_eq!(value["output-paths"], serde_json::json!(["stdout"]));
        assert_eq!(value["error-output-paths"], serde_json::json!(["stderr"]));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let opts: Options = serde_json::from_str(r#"{"level":"debug","enable-color":true}"#).unwrap();
        assert_eq!(opts.level, "debug");
        assert!(opts.enable_color);
        assert_eq!(opts.format, "console");
        assert_eq!(opts.output_paths, vec!["stdout"]);
    }

    #[test]
    fn flags_bind_to_fields() {
        let (opts, _) = parse(&[
            "--log.name",
            "api",
            "--log.level",
            "debug",
            "--log.format",
            "json",
            "--log.enable-color",
            "--log.disable-caller",
            "--log.output-paths",
            "stdout,/var/log/app.log",
            "--log.development",
        ]);
        assert_eq!(opts.name, "api");
        assert_eq!(opts.level, "debug");
        assert_eq!(opts.format, "json");
        assert!(opts.enable_color && opts.disable_caller && opts.development);
        assert!(!opts.disable_stacktrace);
        assert_eq!(opts.output_paths, vec!["stdout", "/var/log/app.log"]);
        assert_eq!(opts.error_output_paths, vec!["stderr"]);
    }

    #[test]
    fn flag_defaults_match_default_impl() {
        let (opts, _) = parse(&[]);
        assert_eq!(opts, Options::default());
    }

    #[test]
    fn apply_cli_only_touches_explicit_flags() {
        let (cli, matches) = parse(&["--log.level", "warn", "--log.enable-color"]);
        let mut from_file = Options {
            format: "json".to_owned(),
            output_paths: vec!["/tmp/app.log".to_owned()],
            ..Options::default()
        };

        from_file.apply_cli(&cli, &matches);

        assert_eq!(from_file.level, "warn");
        assert!(from_file.enable_color);
        assert_eq!(from_file.format, "json");
        assert_eq!(from_file.output_paths, vec!["/tmp/app.log"]);
    }
}
