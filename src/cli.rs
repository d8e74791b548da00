use crate::repository::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, RepositoryRef};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "bbdeps",
    about = "Update one npm dependency in a BitBucket repository and open a pull request",
    version,
    author
)]
pub struct Cli {
    /// Repository, project or workspace access token (prompted when omitted)
    #[arg(short, long, env = "BITBUCKET_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository URL, e.g. https://bitbucket.org/{workspace}/{repository} (prompted when omitted)
    #[arg(short, long, value_name = "URL", value_parser = RepositoryRef::parse)]
    pub repository: Option<RepositoryRef>,

    /// Base URL of the BitBucket REST API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Timeout for each API request, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}
