use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::process;
use std::sync::Arc;

use hostgather::{
    config::{GatherConfig, SaveMode},
    discovery::{Backend, BackendKind, DiscoveryEngine, HoneyscoreClient, Query, RequestConfig},
    scanner::{locate, NmapConfig, NmapEngine, ScanTarget},
    sink::{HostSink, HostStore},
    utils::{Logger, PolicyPrompter, Prompter, Spinner, TerminalPrompter},
    GatherError,
};

fn cli() -> Command {
    Command::new("hostgather")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Gather exposed hosts from search-engine indexes and scan them with nmap")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to ~/.hostgather.toml)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("non-interactive")
                .long("non-interactive")
                .help("Never prompt; answer from the configured policy")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("search")
                .about("Query discovery backends and save the hosts they report")
                .arg(Arg::new("query").value_name("QUERY").required(true).index(1))
                .arg(Arg::new("censys").short('C').long("censys").action(ArgAction::SetTrue))
                .arg(Arg::new("shodan").short('S').long("shodan").action(ArgAction::SetTrue))
                .arg(Arg::new("zoomeye").short('Z').long("zoomeye").action(ArgAction::SetTrue))
                .arg(
                    Arg::new("all")
                        .short('A')
                        .long("all")
                        .help("Use every backend")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("proxy").long("proxy").value_name("URL"))
                .arg(Arg::new("agent").long("agent").value_name("USER_AGENT"))
                .arg(
                    Arg::new("random-agent")
                        .long("random-agent")
                        .help("Pick a User-Agent from the agents file")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("append")
                        .long("append")
                        .help("Append to an existing hosts file without asking")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("overwrite"),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .help("Overwrite an existing hosts file without asking")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Run nmap against one host, or every host in the store")
                .arg(Arg::new("host").value_name("HOST").index(1))
                .arg(
                    Arg::new("ports")
                        .short('p')
                        .long("ports")
                        .value_name("PORTS")
                        .help("Port range, e.g. 22,80,8000-8100"),
                )
                .arg(
                    Arg::new("args")
                        .value_name("NMAP_ARGS")
                        .index(2)
                        .help("Extra nmap arguments (after --)")
                        .num_args(1..)
                        .last(true),
                ),
        )
        .subcommand(
            Command::new("hosts")
                .about("Maintain the hosts file")
                .subcommand_required(true)
                .subcommand(Command::new("clean").about("Remove duplicate addresses"))
                .subcommand(Command::new("backup").about("Copy the hosts file into the backup directory"))
                .subcommand(Command::new("show").about("Print every stored host"))
                .subcommand(
                    Command::new("add")
                        .about("Add comma-separated IPv4 addresses")
                        .arg(Arg::new("hosts").value_name("HOSTS").required(true))
                        .arg(
                            Arg::new("home-ok")
                                .long("home-ok")
                                .help("Allow loopback and unspecified addresses")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("honeyscore")
                .about("Look up how likely an address is to be a honeypot")
                .arg(Arg::new("ip").value_name("IP").required(true)),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<GatherConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => GatherConfig::from_toml_file(path)?,
        None => GatherConfig::load_default_config(),
    };
    if matches.get_flag("non-interactive") {
        config.non_interactive.enabled = true;
    }
    Ok(config)
}

fn prompter_for(config: &GatherConfig) -> Arc<dyn Prompter> {
    if config.non_interactive.enabled {
        Arc::new(PolicyPrompter::new(config.non_interactive.clone()))
    } else {
        Arc::new(TerminalPrompter)
    }
}

async fn run_search(matches: &ArgMatches, config: &GatherConfig) -> anyhow::Result<bool> {
    let text = matches
        .get_one::<String>("query")
        .cloned()
        .unwrap_or_default();

    let kinds: Vec<BackendKind> = if matches.get_flag("all") {
        BackendKind::all().to_vec()
    } else {
        BackendKind::all()
            .into_iter()
            .filter(|kind| matches.get_flag(kind.as_str()))
            .collect()
    };
    if kinds.is_empty() {
        anyhow::bail!("no backend selected, pass --censys, --shodan, --zoomeye or --all");
    }

    let request = RequestConfig::configure(
        matches.get_one::<String>("proxy").map(String::as_str),
        matches.get_one::<String>("agent").map(String::as_str),
        matches.get_flag("random-agent"),
        &config.agents_file,
    );
    let query = Query::new(text).with_request(request);

    let spinner = Spinner::start(format!("searching for '{}'", query.text));
    let sink = HostSink::new(&config.host_file, prompter_for(config)).with_progress(spinner.token());

    let mut engine = DiscoveryEngine::new(sink);
    if matches.get_flag("append") {
        engine = engine.with_save_mode(SaveMode::Append);
    } else if matches.get_flag("overwrite") {
        engine = engine.with_save_mode(SaveMode::Overwrite);
    }
    for kind in kinds {
        match Backend::from_config(kind, config) {
            Ok(backend) => engine = engine.with_backend(backend),
            Err(e) => eprintln!("{} {}: {}", "[!]".bright_red(), kind, e),
        }
    }

    let outcomes = engine.run(&query).await;
    spinner.stop().await;

    let mut all_ok = true;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(persisted) if persisted.saved => println!(
                "{} {}: {} hosts saved to {}",
                "[+]".bright_green(),
                outcome.backend,
                persisted.written,
                persisted.path.display()
            ),
            Ok(_) => {
                all_ok = false;
                println!("{} {}: results NOT saved", "[!]".bright_yellow(), outcome.backend);
            }
            Err(e) => {
                all_ok = false;
                eprintln!("{} {}", "[!]".bright_red(), e);
            }
        }
    }
    Ok(all_ok && !outcomes.is_empty())
}

async fn run_scan(matches: &ArgMatches, config: &GatherConfig) -> anyhow::Result<bool> {
    let hosts = match matches.get_one::<String>("host") {
        Some(host) => vec![host.clone()],
        None => HostStore::new(&config.host_file).load()?,
    };
    if hosts.is_empty() {
        anyhow::bail!("nothing to scan, {} is empty", config.host_file.display());
    }

    let nmap_path = locate(&config.nmap_paths).await?;
    let engine = NmapEngine::new(
        NmapConfig::from_gather_config(config, nmap_path),
        prompter_for(config),
    );

    let ports = matches.get_one::<String>("ports").cloned();
    let arguments: Vec<String> = matches
        .get_many::<String>("args")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    // one confirmation round per invocation, shared by every host
    let validated = engine.validated_arguments(&arguments);

    let mut all_ok = true;
    for host in hosts {
        let mut target = ScanTarget::new(&host).with_arguments(arguments.clone());
        if let Some(ports) = &ports {
            target = target.with_ports(ports.clone());
        }

        match engine.scan_with(&target, &validated).await {
            Ok(report) => {
                let stats = &report.nmap_scan.scan_stats;
                println!(
                    "{} {} finished in {:.2}s, {} of {} hosts up",
                    "[*]".bright_blue(),
                    host,
                    stats.elapsed_seconds().unwrap_or_default(),
                    stats.hosts_up_number().unwrap_or_default(),
                    stats.total_hosts_scanned
                );
                for (key, record) in report.hosts() {
                    println!("{} {}", "[+]".bright_green(), key.bold());
                    for port in record.open_ports() {
                        println!(
                            "    {:<6} {:<12} {} {}",
                            port.port, port.name, port.product, port.version
                        );
                    }
                }
            }
            Err(e @ GatherError::ScannerNotFound { .. }) => return Err(e.into()),
            Err(e) => {
                all_ok = false;
                eprintln!("{} {}", "[!]".bright_red(), e);
            }
        }
    }
    Ok(all_ok)
}

fn run_hosts(matches: &ArgMatches, config: &GatherConfig) -> anyhow::Result<bool> {
    let store = HostStore::new(&config.host_file);
    match matches.subcommand() {
        Some(("clean", _)) => {
            let removed = store.clean()?;
            println!("{} removed {} duplicate hosts", "[+]".bright_green(), removed);
        }
        Some(("backup", _)) => {
            let path = store.backup(&config.host_backup_dir())?;
            println!("{} hosts backed up to {}", "[+]".bright_green(), path.display());
        }
        Some(("show", _)) => {
            for host in store.load()? {
                println!("{}", host);
            }
        }
        Some(("add", sub)) => {
            let hosts = sub.get_one::<String>("hosts").cloned().unwrap_or_default();
            let report = store.add_single(&hosts, sub.get_flag("home-ok"))?;
            for rejected in &report.rejected {
                eprintln!("{} '{}' is not a valid address", "[!]".bright_yellow(), rejected);
            }
            println!("{} added {} hosts", "[+]".bright_green(), report.added.len());
            return Ok(report.rejected.is_empty());
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(true)
}

async fn run_honeyscore(matches: &ArgMatches, config: &GatherConfig) -> anyhow::Result<bool> {
    let ip = matches.get_one::<String>("ip").cloned().unwrap_or_default();
    let key = config
        .tokens
        .shodan
        .clone()
        .ok_or_else(|| anyhow::anyhow!("honeyscore lookups need a Shodan API token"))?;
    let client = HoneyscoreClient::new(&config.api.honeyscore_url, &key, config.request_timeout())?;

    let score = client.score(&ip).await;
    let text = format!("{:.1}", score);
    let colored_score = if score >= 0.5 {
        text.bright_red()
    } else {
        text.bright_green()
    };
    println!("{} honeyscore for {}: {}", "[+]".bright_green(), ip, colored_score);
    Ok(true)
}

async fn run(matches: ArgMatches) -> anyhow::Result<bool> {
    let config = load_config(&matches)?;
    log::debug!("{:?}", config);

    match matches.subcommand() {
        Some(("search", sub)) => run_search(sub, &config).await,
        Some(("scan", sub)) => run_scan(sub, &config).await,
        Some(("hosts", sub)) => run_hosts(sub, &config),
        Some(("honeyscore", sub)) => run_honeyscore(sub, &config).await,
        _ => unreachable!("subcommand_required"),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    Logger::init(Logger::level_from_verbosity(matches.get_count("verbose")));

    match run(matches).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "[!] ERROR:".bright_red(), e);
            process::exit(2);
        }
    }
}
