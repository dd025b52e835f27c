//! bitboot - Main entry point
//!
//! CLI for decentralized peer discovery: announce this process under a
//! network name, look up peers announced by others, or poll continuously.

use anyhow::{Context, Result};
use bitboot::{
    cli::{build_session_config, load_network_names, ConfigFile},
    BackendRegistry, BitBoot, CliArgs, KnownHost, NetworkRegistry,
};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse_args();
    init_logging(&args);
    info!("bitboot starting");
    debug!("CLI arguments: {:?}", args);

    let file_config = match &args.config {
        Some(path) => ConfigFile::load(path).context("Failed to load config file")?,
        None => ConfigFile::default(),
    };

    let announce_names = args.announce.clone();
    let mut lookup_names = args.lookup.clone();
    let continuous_names = args.continuous.clone();

    // Extra names from the file and config join the requested lookups.
    let mut extra_names = file_config.network_names.clone();
    if let Some(path) = &args.network_names_file {
        extra_names.extend(load_network_names(path).context("Failed to load network names")?);
    }
    for name in extra_names {
        if !lookup_names.contains(&name) && !announce_names.contains(&name) {
            lookup_names.push(name);
        }
    }

    if announce_names.is_empty() && lookup_names.is_empty() && continuous_names.is_empty() {
        eprintln!("Nothing to do; pass --announce, --lookup or --continuous (see --help)");
        std::process::exit(2);
    }

    let session_config =
        build_session_config(&args, &file_config).context("Invalid configuration")?;
    let networks = NetworkRegistry::with_builtins();
    let backends = BackendRegistry::with_builtins();

    info!(
        "Creating session on network '{}' (registered networks: {})",
        session_config.network_name,
        networks.list().join(", ")
    );
    let session = BitBoot::create(session_config, &networks, &backends)
        .await
        .context("Failed to create discovery session")?;

    let peer = KnownHost::new(args.peer_host.clone(), args.peer_port);

    let result = run(
        &session,
        peer,
        &announce_names,
        &lookup_names,
        &continuous_names,
    )
    .await;

    session.stop().await.ok();
    if let Err(e) = &result {
        error!("bitboot failed: {}", e);
    } else {
        info!("bitboot finished");
    }
    result
}

async fn run(
    session: &BitBoot,
    peer: KnownHost,
    announce_names: &[String],
    lookup_names: &[String],
    continuous_names: &[String],
) -> Result<()> {
    for name in announce_names.iter() {
        session
            .announce_peer(name, peer.clone())
            .await
            .with_context(|| format!("Failed to announce in '{}'", name))?;
        println!("announced {} in {}", peer, name);
    }

    for name in lookup_names.iter() {
        let hosts = session
            .lookup(name)
            .await
            .with_context(|| format!("Failed to look up '{}'", name))?;
        if hosts.is_empty() {
            println!("{}: no peers announced yet", name);
        } else {
            for host in hosts {
                println!("{}: {}", name, host);
            }
        }
    }

    if !continuous_names.is_empty() {
        run_continuous(session, continuous_names).await?;
    }

    Ok(())
}

/// Poll the given networks until interrupted, printing every change
async fn run_continuous(session: &BitBoot, names: &[String]) -> Result<()> {
    info!("Entering continuous mode for: {}", names.join(", "));

    let mut tasks = Vec::new();
    for name in names {
        let mut handle = session.continuous_poll(name, None);
        let name = name.clone();
        tasks.push(tokio::spawn(async move {
            let mut last_count: Option<usize> = None;
            while let Some(snapshot) = handle.next().await {
                if last_count != Some(snapshot.len()) {
                    if snapshot.is_empty() {
                        println!("{}: no peers", name);
                    } else {
                        for host in &snapshot {
                            println!("{}: {}", name, host);
                        }
                    }
                    last_count = Some(snapshot.len());
                }
            }
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Interrupted; stopping continuous mode");

    for task in tasks {
        task.abort();
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                warn!("Poll task ended abnormally: {}", e);
            }
        }
    }
    Ok(())
}

/// Initialize logging based on verbosity settings
fn init_logging(args: &CliArgs) {
    let level = args.log_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if args.is_verbose() {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}
