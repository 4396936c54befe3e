use clap::{App, Arg};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_CONFIG_FILE: &str = "reconcile.toml";

pub struct Args {
    pub config_file: PathBuf,
    pub variants: Vec<String>,
    pub strict: bool,
    pub verbosity: u64,
}

impl Args {
    pub fn parse() -> Self {
        Self::parse_from(std::env::args_os())
    }

    pub fn parse_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = App::new("map2-reconcile")
            .version("0.1.0")
            .about("Checks that the Map2 allocation datasets sum to their expected totals")
            .arg(Arg::with_name("config")
                .short("c").long("config").takes_value(true).default_value(DEFAULT_CONFIG_FILE)
                .help("path of the TOML file describing the variants to reconcile"))
            .arg(Arg::with_name("variant")
                .long("variant").takes_value(true).multiple(true).number_of_values(1)
                .help("only reconcile the named variant (may be repeated)"))
            .arg(Arg::with_name("strict")
                .long("strict")
                .help("exit with status 2 when a total is outside its tolerance"))
            .arg(Arg::with_name("verbose")
                .short("v").multiple(true)
                .help("log more detail to stderr (repeat for more)"))
            .get_matches_from(args);

        Self {
            config_file: PathBuf::from(matches.value_of("config").unwrap_or(DEFAULT_CONFIG_FILE)),
            variants: matches
                .values_of("variant")
                .map(|values| values.map(String::from).collect())
                .unwrap_or_default(),
            strict: matches.is_present("strict"),
            verbosity: matches.occurrences_of("verbose"),
        }
    }

    /// The most detailed log level to emit, starting at warnings.
    pub fn log_level(&self) -> Level {
        match self.verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
