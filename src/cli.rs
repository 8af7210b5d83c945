use crate::backoff::PollConfig;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "dpw", version = VERSION, about = "Provisioning Pipeline Watcher TUI")]
pub struct Cli {
    /// Base URL of the operator backend
    #[arg(long, env = "DPW_BASE_URL")]
    pub base_url: String,

    /// Bearer token for the operator backend
    #[arg(long, env = "DPW_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Polling constants to use
    #[arg(long, value_enum, default_value_t = Flow::Deployment)]
    pub flow: Flow,

    /// Disable desktop notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Write debug logs to the state directory
    #[arg(long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch an already-triggered pipeline
    Watch {
        #[arg(long)]
        project_id: u64,
        #[arg(long)]
        pipeline_id: u64,
    },
    /// Submit a provisioning request, then watch the resulting pipeline
    Submit {
        /// Resource kind, e.g. "vm" or "cluster"
        #[arg(long)]
        choice: String,
        /// Human-readable name for the resource
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        desc: String,
        /// Cluster subnet in CIDR form, e.g. 10.10.10.0/24
        #[arg(long)]
        subnet: String,
        /// Sizing spec: "cpu/ram overcommit%", e.g. "2/4 30%"
        #[arg(long)]
        flavor: String,
        #[arg(long)]
        cloud_project_id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Deployment,
    Listing,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deployment => f.write_str("deployment"),
            Self::Listing => f.write_str("listing"),
        }
    }
}

impl Flow {
    pub fn poll_config(self) -> PollConfig {
        match self {
            Self::Deployment => PollConfig::deployment(),
            Self::Listing => PollConfig::listing(),
        }
    }
}

/// Pre-flight check so an unusable subnet is rejected before the backend
/// sees it. The first four addresses of the range are reserved, and at
/// least three usable ones must remain, so /29 is the smallest prefix.
pub fn validate_subnet(subnet: &str) -> Result<()> {
    let (addr, prefix) = subnet
        .split_once('/')
        .ok_or_else(|| eyre!("subnet must be in CIDR form, e.g. 10.10.10.0/24"))?;
    addr.parse::<std::net::Ipv4Addr>()
        .map_err(|_| eyre!("invalid IPv4 address in subnet: {addr}"))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| eyre!("invalid prefix length in subnet: {prefix}"))?;
    if prefix > 29 {
        return Err(eyre!("subnet /{prefix} is too small, /29 or larger required"));
    }
    if prefix < 8 {
        return Err(eyre!("subnet /{prefix} is implausibly large"));
    }
    Ok(())
}

/// Flavor spec like "2/4 30%": vCPU count, RAM in GiB, CPU overcommit.
pub fn validate_flavor(flavor: &str) -> Result<()> {
    let malformed = || eyre!("flavor must look like \"2/4 30%\" (cpu/ram overcommit)");
    let (cpu, rest) = flavor.split_once('/').ok_or_else(malformed)?;
    let mut parts = rest.split_whitespace();
    let ram = parts.next().ok_or_else(malformed)?;
    let overcommit = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    cpu.trim().parse::<u32>().map_err(|_| malformed())?;
    ram.parse::<u32>().map_err(|_| malformed())?;
    overcommit
        .trim_end_matches('%')
        .parse::<u32>()
        .map_err(|_| malformed())?;
    Ok(())
}
