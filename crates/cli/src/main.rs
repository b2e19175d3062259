use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cointick_core::ConfigLoader;
use cointick_provision::config::DEFAULT_CONFIG_PATH;
use cointick_provision::{
    CreateDropletRequest, DropletClient, ProvisionConfig, Provisioner, SshRunner,
};
use cointick_scheduler::{SnapshotRunner, SnapshotScheduler};
use std::path::Path;
use tracing::info;

#[derive(Parser)]
#[command(name = "cointick")]
#[command(about = "Cryptocurrency snapshot poller and host provisioning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both snapshot cycles on their cadences
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Run one ticker snapshot cycle and exit
    Snapshot {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Run one mining snapshot cycle and exit
    MiningSnapshot {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Run a provisioning task (and its prerequisites) on the remote host
    Provision {
        /// Task name from the registry
        #[arg(default_value = "deploy")]
        task: String,
        /// Print the execution plan without running anything
        #[arg(long)]
        dry_run: bool,
        /// Provisioning config file path
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        provision_config: String,
    },
    /// Create the provisioning config template
    InitConfig {
        /// Open the file in $EDITOR after creating it
        #[arg(long)]
        edit: bool,
        /// Provisioning config file path
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        provision_config: String,
    },
    /// Manage the DigitalOcean droplet that runs the poller
    Droplet {
        #[command(subcommand)]
        command: DropletCommands,
        /// Provisioning config file path
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        provision_config: String,
    },
}

#[derive(Subcommand)]
enum DropletCommands {
    /// Create a droplet and store its address in the provisioning config
    Create {
        /// Droplet name
        name: String,
        /// Droplet size slug
        #[arg(long, default_value = "s-1vcpu-512mb-10gb")]
        size: String,
        /// Region slug
        #[arg(long, default_value = "nyc1")]
        region: String,
        /// Do not store the new address in the provisioning config
        #[arg(long)]
        no_store: bool,
    },
    /// List all droplets on the account
    Ls,
    /// Destroy a droplet by id
    Destroy {
        /// Droplet id
        id: u64,
    },
    /// Open an interactive SSH session to a droplet
    Ssh {
        /// Droplet name; may be omitted when only one droplet exists
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => run_scheduler(&config).await?,
        Commands::Snapshot { config } => run_ticker_once(&config).await?,
        Commands::MiningSnapshot { config } => run_mining_once(&config).await?,
        Commands::Provision {
            task,
            dry_run,
            provision_config,
        } => run_provision(&task, dry_run, &provision_config).await?,
        Commands::InitConfig {
            edit,
            provision_config,
        } => run_init_config(edit, &provision_config)?,
        Commands::Droplet {
            command,
            provision_config,
        } => run_droplet(command, &provision_config).await?,
    }

    Ok(())
}

async fn run_scheduler(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    SnapshotScheduler::new(&config)?.start().await
}

async fn run_ticker_once(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let count = SnapshotRunner::new(&config)?.ticker_cycle().await?;
    println!("downloaded {count} ticker records");
    Ok(())
}

async fn run_mining_once(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let count = SnapshotRunner::new(&config)?.mining_cycle().await?;
    println!("downloaded {count} mining records");
    Ok(())
}

async fn run_provision(task: &str, dry_run: bool, config_path: &str) -> anyhow::Result<()> {
    let config = ProvisionConfig::load(Path::new(config_path))?;
    let runner = SshRunner::from_config(&config)?;
    let provisioner = Provisioner::new(runner);

    if dry_run {
        println!("plan for '{task}':");
        for step in provisioner.plan(task)? {
            println!("  {} - {}", step.name, step.summary);
        }
        return Ok(());
    }

    provisioner.run(task).await?;
    Ok(())
}

fn run_init_config(edit: bool, config_path: &str) -> anyhow::Result<()> {
    let path = Path::new(config_path);
    if ProvisionConfig::write_template(path)? {
        println!("created {config_path}; fill in api_key, ssh_keyfile, user, and host");
    } else {
        println!("{config_path} already exists");
    }

    if edit {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
        let status = std::process::Command::new(editor).arg(path).status()?;
        if !status.success() {
            bail!("editor exited with status {status}");
        }
    }
    Ok(())
}

async fn run_droplet(command: DropletCommands, config_path: &str) -> anyhow::Result<()> {
    let path = Path::new(config_path);
    let mut config = ProvisionConfig::load(path)?;
    let client = DropletClient::new(config.require_api_key()?);

    match command {
        DropletCommands::Create {
            name,
            size,
            region,
            no_store,
        } => {
            let mut request = CreateDropletRequest::new(name.clone());
            request.size = size;
            request.region = region;

            client.create_droplet(&request).await?;
            let droplet = client.wait_until_active(&name).await?;
            let ip = droplet
                .public_ip()
                .context("active droplet has no public address")?;
            println!("{} {} {}", droplet.id, droplet.name, ip);

            if !no_store {
                config.host = ip.to_string();
                config.save(path)?;
                info!(host = ip, "Stored droplet address in provisioning config");
            }
        }
        DropletCommands::Ls => {
            let mut droplets = client.list_droplets().await?;
            droplets.sort_by(|a, b| a.name.cmp(&b.name));
            for droplet in droplets {
                println!(
                    "{} {} {}",
                    droplet.id,
                    droplet.name,
                    droplet.public_ip().unwrap_or("-")
                );
            }
        }
        DropletCommands::Destroy { id } => {
            client.destroy_droplet(id).await?;
            println!("destroyed droplet {id}");
        }
        DropletCommands::Ssh { name } => {
            let droplets = client.list_droplets().await?;
            let droplet = match name {
                Some(ref name) => droplets
                    .into_iter()
                    .find(|d| &d.name == name)
                    .with_context(|| format!("no droplet named {name}"))?,
                None => {
                    if droplets.len() != 1 {
                        bail!("more than one droplet; specify a droplet name");
                    }
                    droplets.into_iter().next().unwrap()
                }
            };
            let ip = droplet
                .public_ip()
                .context("droplet has no public address")?;
            let destination = format!("{}@{}", config.user, ip);
            let status = std::process::Command::new("ssh").arg(&destination).status()?;
            if !status.success() {
                bail!("ssh exited with status {status}");
            }
        }
    }
    Ok(())
}
