use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};
use thiserror::Error;

/// The one flag the process accepts.
pub const DATABASE_FLAG: &str = "--bd";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Unreported arguments: --bd is required")]
    NoArguments,

    #[error("{0} arguments were given; only one is allowed")]
    TooManyArguments(usize),

    #[error("--bd (IP of the database) parameter must be entered, got {0:?}")]
    MissingFlag(String),
}

/// The validated startup argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupArguments {
    raw: String,
}

impl StartupArguments {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The value given as `--bd=<host>` (or `--bd:<host>`), if any.
    ///
    /// A bare `--bd` leaves the host to configuration.
    pub fn database_host(&self) -> Option<&str> {
        let (_, rest) = self.raw.split_once(DATABASE_FLAG)?;
        let value = rest
            .strip_prefix('=')
            .or_else(|| rest.strip_prefix(':'))?
            .trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Accepts exactly one argument, and only if it contains `--bd`.
pub fn validate(args: &[String]) -> Result<StartupArguments, ArgumentError> {
    match args {
        [] => Err(ArgumentError::NoArguments),
        [arg] if arg.contains(DATABASE_FLAG) => Ok(StartupArguments { raw: arg.clone() }),
        [arg] => Err(ArgumentError::MissingFlag(arg.clone())),
        _ => Err(ArgumentError::TooManyArguments(args.len())),
    }
}

/// Command-line surface, used to render the diagnostic shown on rejection.
///
/// Arguments are never parsed through clap: `--help` is just another argument
/// without the flag.
#[must_use]
pub fn command() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("bd")
                .help("IP of the database")
                .long("bd")
                .value_name("IP")
                .num_args(0..=1)
                .require_equals(true)
                .required(true),
        )
}

/// The usage text listing the accepted flag.
pub fn usage() -> String {
    command().render_help().to_string()
}
