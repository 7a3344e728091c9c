//! Command-line flags naming the plugin to run.

use clap::Parser;
use skein_plugins::PluginReference;

/// Plugin reference flags accepted by `skein`.
///
/// Every flag is optional; an empty value means "not supplied". A matching
/// alias for `--name` replaces `--repo`, `--ref`, and `--sha`.
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "skein", version, about)]
pub(crate) struct Cli {
    /// Plugin alias to look up in the alias table.
    #[arg(long, default_value = "")]
    pub(crate) name: String,
    /// Repository holding the plugin source.
    #[arg(long, default_value = "")]
    pub(crate) repo: String,
    /// Branch or tag to fetch.
    #[arg(long = "ref", value_name = "REF", default_value = "")]
    pub(crate) git_ref: String,
    /// Commit to fetch; wins over `--ref`.
    #[arg(long, default_value = "")]
    pub(crate) sha: String,
}

impl From<Cli> for PluginReference {
    fn from(cli: Cli) -> Self {
        Self::new(cli.name, cli.repo, cli.git_ref, cli.sha)
    }
}
