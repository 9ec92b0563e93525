//! CLI command definitions for drouet
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.
//! Flag names are spelled exactly like the settings they feed, so the
//! long name of a flag is its config key.

use crate::config::{FlagSet, Value};
use crate::logging::LogOptions;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Static site generator
#[derive(Parser, Debug)]
#[command(name = "drouet", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub build: BuildArgs,

    /// Render to memory (only useful for benchmark testing)
    #[arg(long = "renderToMemory")]
    pub render_to_memory: bool,

    /// Watch filesystem for changes and recreate as needed
    #[arg(short, long)]
    pub watch: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file(s), comma separated (default: ./config.(toml|yaml|yml|json))
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable logging
    #[arg(long, global = true)]
    pub log: bool,

    /// Log file path (if set, also enable logging)
    #[arg(long = "logFile", global = true)]
    pub log_file: Option<String>,

    /// Build in quiet mode
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Verbose logging
    #[arg(long = "verboseLog", global = true)]
    pub verbose_log: bool,
}

impl GlobalArgs {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            quiet: self.quiet,
            debug: self.debug,
            verbose: self.verbose,
            log: self.log,
            verbose_log: self.verbose_log,
            log_file: self.log_file.as_ref().map(PathBuf::from),
        }
    }
}

/// Flags shared by the commands that build a site.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Hostname (and path) to the root, e.g. http://example.com/
    #[arg(short = 'b', long = "baseURL")]
    pub base_url: Option<String>,

    /// Include content marked as draft
    #[arg(short = 'D', long = "buildDrafts")]
    pub build_drafts: bool,

    /// Include expired content
    #[arg(short = 'E', long = "buildExpired")]
    pub build_expired: bool,

    /// Include content with publishdate in the future
    #[arg(short = 'F', long = "buildFuture")]
    pub build_future: bool,

    /// Filesystem path to cache directory (default: $TMPDIR/hugo_cache/)
    #[arg(long = "cacheDir")]
    pub cache_dir: Option<String>,

    /// (deprecated) If true, all relative URLs canonicalized against baseURL
    #[arg(long = "canonifyURLs")]
    pub canonify_urls: bool,

    /// Before build, remove files from destination not found in static directories
    #[arg(long = "cleanDestinationDir")]
    pub clean_destination_dir: bool,

    /// Filesystem path to content directory
    #[arg(short = 'c', long = "contentDir")]
    pub content_dir: Option<String>,

    /// Filesystem path to write files to
    #[arg(short = 'd', long)]
    pub destination: Option<String>,

    /// Disable different kind of pages (home, RSS etc.)
    #[arg(long = "disableKinds", value_delimiter = ',')]
    pub disable_kinds: Vec<String>,

    /// Add Git revision, date and author info to the pages
    #[arg(long = "enableGitInfo")]
    pub enable_git_info: bool,

    /// Copy all files when static is changed
    #[arg(long = "forceSyncStatic")]
    pub force_sync_static: bool,

    /// Run cleanup tasks (like removing unused cache files) after the build
    #[arg(long)]
    pub gc: bool,

    /// Print missing translations
    #[arg(long = "i18n-warnings")]
    pub i18n_warnings: bool,

    /// Ignores the cache directory
    #[arg(long = "ignoreCache")]
    pub ignore_cache: bool,

    /// Filesystem path to layout directory
    #[arg(short = 'l', long = "layoutDir")]
    pub layout_dir: Option<String>,

    /// Don't sync permission mode of files
    #[arg(long = "noChmod")]
    pub no_chmod: bool,

    /// Don't sync modification time of files
    #[arg(long = "noTimes")]
    pub no_times: bool,

    /// (deprecated) Pluralize titles in lists
    #[arg(
        long = "pluralizeListTitles",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub pluralize_list_titles: bool,

    /// (deprecated) Preserve taxonomy names as written
    #[arg(long = "preserveTaxonomyNames")]
    pub preserve_taxonomy_names: bool,

    /// Filesystem path to read files relative from
    #[arg(short = 's', long)]
    pub source: Option<String>,

    /// Display metrics about template executions
    #[arg(long = "templateMetrics")]
    pub template_metrics: bool,

    /// Calculate some improvement hints when combined with --templateMetrics
    #[arg(long = "templateMetricsHints")]
    pub template_metrics_hints: bool,

    /// Theme to use (located in /themes/THEMENAME/)
    #[arg(short = 't', long)]
    pub theme: Option<String>,

    /// Filesystem path to themes directory
    #[arg(long = "themesDir")]
    pub themes_dir: Option<String>,

    /// (deprecated) If true, use /filename.html instead of /filename/
    #[arg(long = "uglyURLs")]
    pub ugly_urls: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the site configuration, both default and custom settings
    Config(ConfigArgs),

    /// Build the site and rebuild on changes
    #[command(alias = "serve")]
    Server(ServerArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Filesystem path to read files relative from
    #[arg(short = 's', long)]
    pub source: Option<String>,

    /// Theme to use (located in /themes/THEMENAME/)
    #[arg(short = 't', long)]
    pub theme: Option<String>,

    /// Filesystem path to themes directory
    #[arg(long = "themesDir")]
    pub themes_dir: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Append port to baseURL
    #[arg(
        long = "appendPort",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub append_port: bool,

    /// Interface to which the server will bind
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Enables full re-renders on changes
    #[arg(long = "disableFastRender")]
    pub disable_fast_render: bool,

    /// Watch without enabling live browser reload on rebuild
    #[arg(long = "disableLiveReload")]
    pub disable_live_reload: bool,

    /// Port for live reloading (i.e. 443 in HTTPS proxy situations)
    #[arg(long = "liveReloadPort", default_value_t = -1, allow_negative_numbers = true)]
    pub live_reload_port: i64,

    /// Prevent HTTP caching
    #[arg(long = "noHTTPCache")]
    pub no_http_cache: bool,

    /// Port on which the server will listen
    #[arg(short, long, default_value_t = 1313)]
    pub port: u16,

    /// Render to destination path (default is render to memory)
    #[arg(long = "renderToDisk")]
    pub render_to_disk: bool,

    /// Watch filesystem for changes and recreate as needed
    #[arg(
        short,
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub watch: bool,
}

/// Flag sets for the invoked command chain, leaf command first.
///
/// `command` must be the definition `matches` were parsed with. Each set
/// holds the arguments declared on that command; global arguments belong
/// to the root. A flag is changed only if its value came from the command
/// line.
pub fn flag_sets(command: &clap::Command, matches: &ArgMatches) -> Vec<FlagSet> {
    let mut sets = Vec::new();
    collect_flag_sets(command, matches, &mut sets);
    sets.reverse();
    sets
}

fn collect_flag_sets(command: &clap::Command, matches: &ArgMatches, sets: &mut Vec<FlagSet>) {
    let mut set = FlagSet::new(command.get_name());
    for arg in command.get_arguments() {
        if let Some((value, changed)) = read_arg(arg, matches) {
            let id = arg.get_id().as_str();
            set.push(arg.get_long().unwrap_or(id), value, changed);
        }
    }
    sets.push(set);

    if let Some((name, sub_matches)) = matches.subcommand()
        && let Some(sub) = command.find_subcommand(name)
    {
        collect_flag_sets(sub, sub_matches, sets);
    }
}

fn read_arg(arg: &Arg, matches: &ArgMatches) -> Option<(Value, bool)> {
    let id = arg.get_id().as_str();
    let value = match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => Value::Bool(matches.get_flag(id)),
        ArgAction::Count => Value::Int(i64::from(matches.get_count(id))),
        ArgAction::Append => Value::List(
            matches
                .try_get_many::<String>(id)
                .ok()
                .flatten()
                .map(|values| values.map(|v| Value::String(v.clone())).collect())
                .unwrap_or_default(),
        ),
        ArgAction::Set => single_value(matches, id),
        _ => return None,
    };
    let changed = matches.value_source(id) == Some(ValueSource::CommandLine);
    Some((value, changed))
}

fn single_value(matches: &ArgMatches, id: &str) -> Value {
    if let Ok(Some(v)) = matches.try_get_one::<String>(id) {
        return Value::String(v.clone());
    }
    if let Ok(Some(v)) = matches.try_get_one::<bool>(id) {
        return Value::Bool(*v);
    }
    if let Ok(Some(v)) = matches.try_get_one::<i64>(id) {
        return Value::Int(*v);
    }
    if let Ok(Some(v)) = matches.try_get_one::<u16>(id) {
        return Value::Int(i64::from(*v));
    }
    Value::String(String::new())
}
