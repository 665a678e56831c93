use clap::Parser;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "Static-site interception cache",
    long_about = "Drives the siteward interception engine from the command line.\n\
                  \n\
                  Loads a precache manifest, runs the install/activate lifecycle, then\n\
                  resolves each requested URL through the caching policy: precached\n\
                  resources are served without touching the network again, everything\n\
                  else falls back to a single fetch, and byte-range requests are\n\
                  answered as partial content cut from the fully cached body."
)]
pub struct CliArgs {
    /// URL(s) to resolve through the interception policy
    #[arg(required = true, help = "URL(s) to resolve through the interception policy")]
    pub urls: Vec<String>,

    /// Precache manifest file
    #[arg(
        short,
        long,
        help = "Path to the precache manifest, a JSON array of {url, revision} entries"
    )]
    pub manifest: Option<PathBuf>,

    /// Worker scope
    #[arg(
        short,
        long,
        help = "Scope relative manifest URLs resolve against (default: origin of the first URL)"
    )]
    pub scope: Option<String>,

    /// Cache generation name prefix
    #[arg(long, default_value = "siteward", help = "Prefix for cache generation names")]
    pub prefix: String,

    /// Cache generation version suffix
    #[arg(
        long = "cache-version",
        default_value = "v1",
        help = "Version suffix for cache generation names"
    )]
    pub cache_version: String,

    /// Byte-range header to send with each request
    #[arg(
        short,
        long,
        help = "Range header value for each request, e.g. \"bytes=100-\""
    )]
    pub range: Option<String>,

    /// Output directory for resolved bodies
    #[arg(
        short,
        long,
        help = "Directory where resolved bodies are written (default: ./out)"
    )]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
