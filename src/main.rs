// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dnsa::{
    config::Settings,
    context::BuildContext,
    metrics,
    model::{record_fqdn, ZoneKind},
    net_range::NetRange,
    reconcilers::{self, publish, BatchReport},
    store::{
        catalog::{self, NewForwardZone, NewGlue, NewRecord, NewReverseZone},
        sqlite::SqliteStore,
    },
};
use hickory_proto::rr::RecordType;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{debug, error, info};

/// Build BIND9 zone files from the CMDB record store and keep reverse zones
/// in step with forward A records.
#[derive(Parser, Debug)]
#[command(name = "dnsa", author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (default: $DNSA_CONFIG, then /etc/dnsa/dnsa.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, env = "RUST_LOG_FORMAT", default_value = "text", ignore_case = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the record store tables
    InitDb,

    /// Build and check zone files, then publish the ones that changed
    #[command(group(ArgGroup::new("target").required(true).args(["zone", "reverse", "all"])))]
    Validate {
        /// Forward zone name
        #[arg(long)]
        zone: Option<String>,
        /// Reverse zone network, e.g. 10.0.0.0
        #[arg(long)]
        reverse: Option<String>,
        /// Every master zone, forward and reverse
        #[arg(long)]
        all: bool,
    },

    /// Reconcile PTR records with the forward zones and rebuild reverse zones
    #[command(group(ArgGroup::new("target").required(true).args(["range", "all"])))]
    BuildReverse {
        /// Reverse zone network, e.g. 192.168.1.0
        #[arg(long)]
        range: Option<String>,
        /// Every master reverse zone
        #[arg(long)]
        all: bool,
    },

    /// Rewrite both named.conf zone lists and reload once
    Commit,

    /// Print a rendered zone without writing anything
    #[command(group(ArgGroup::new("target").required(true).args(["zone", "reverse"])))]
    Display {
        #[arg(long)]
        zone: Option<String>,
        #[arg(long)]
        reverse: Option<String>,
    },

    /// List zones in the store
    ListZones {
        /// List reverse zones instead of forward zones
        #[arg(long)]
        reverse: bool,
        #[arg(long)]
        json: bool,
    },

    /// List addresses with more than one A record; `*` marks the preferred one
    ListDuplicates,

    /// Add a forward zone
    AddZone {
        #[arg(long)]
        name: String,
        #[arg(long)]
        primary_ns: Option<String>,
        #[arg(long)]
        secondary_ns: Option<String>,
        /// Make this a slave zone of the given master
        #[arg(long)]
        slave_master: Option<Ipv4Addr>,
    },

    /// Add a reverse zone
    AddReverseZone {
        /// Network address, e.g. 192.168.1.0
        #[arg(long)]
        range: Ipv4Addr,
        #[arg(long)]
        prefix: u8,
        #[arg(long)]
        primary_ns: Option<String>,
        #[arg(long)]
        secondary_ns: Option<String>,
        #[arg(long)]
        slave_master: Option<Ipv4Addr>,
    },

    /// Add a record to a forward zone
    AddRecord {
        #[arg(long)]
        zone: String,
        #[arg(long)]
        host: String,
        #[arg(long = "type")]
        rtype: String,
        #[arg(long)]
        dest: String,
        #[arg(long)]
        priority: Option<u16>,
        /// SRV service name, e.g. ldap
        #[arg(long, requires = "protocol")]
        service: Option<String>,
        /// SRV protocol, e.g. tcp
        #[arg(long, requires = "service")]
        protocol: Option<String>,
    },

    /// Delete records by owner and type
    DeleteRecord {
        #[arg(long)]
        zone: String,
        #[arg(long)]
        host: String,
        #[arg(long = "type")]
        rtype: String,
    },

    /// Choose which A record owns the PTR record for an address
    AddPreferred {
        #[arg(long)]
        ip: Ipv4Addr,
        /// FQDN of an existing A record for the address
        #[arg(long)]
        fqdn: String,
    },

    /// Remove the preference for an address
    DeletePreferred {
        #[arg(long)]
        ip: Ipv4Addr,
    },

    /// Delegate a child zone
    AddGlue {
        /// Parent zone
        #[arg(long)]
        zone: String,
        #[arg(long)]
        child: String,
        /// One or two nameservers
        #[arg(long, value_delimiter = ',', num_args = 1..=2, required = true)]
        ns: Vec<String>,
        /// Nameserver addresses, in the same order
        #[arg(long, value_delimiter = ',', num_args = 1..=2)]
        ip: Vec<Ipv4Addr>,
    },

    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing(format: LogFormat) {
    // Logs go to stderr so `display` and `list-*` output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "dnsa", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!(database = %settings.database.display(), zone_dir = %settings.zone_dir, "Settings loaded");
    let metrics_file = settings.metrics_file.clone();

    let result = dispatch(cli.command, settings);

    if let Some(path) = metrics_file {
        if let Err(e) = metrics::write_textfile(&path) {
            error!(path = %path.display(), error = %e, "Failed to write metrics textfile");
        }
    }
    result
}

fn dispatch(command: Commands, settings: Settings) -> Result<()> {
    if let Commands::InitDb = command {
        let store = SqliteStore::open(&settings.database)?;
        store.init_schema()?;
        info!(database = %settings.database.display(), "Record store initialised");
        return Ok(());
    }

    let ctx = BuildContext::from_settings(settings).context("Failed to open the record store")?;

    match command {
        Commands::Validate { zone, reverse, all } => {
            if let Some(name) = zone {
                let outcome = reconcilers::validate_forward_zone(&ctx, &name)
                    .with_context(|| format!("Failed to validate zone {name}"))?;
                println!("{name}: {outcome}");
            } else if let Some(net) = reverse {
                let outcome = reconcilers::validate_reverse_zone(&ctx, &net)
                    .with_context(|| format!("Failed to validate reverse zone {net}"))?;
                println!("{net}: {outcome}");
            } else if all {
                let (forward, reverse) = reconcilers::validate_every_zone(&ctx);
                print_report("forward", &forward);
                print_report("reverse", &reverse);
                forward.into_result()?;
                reverse.into_result()?;
            }
        }
        Commands::BuildReverse { range, all } => {
            if let Some(net) = range {
                let outcome = reconcilers::build_reverse(&ctx, &net)
                    .with_context(|| format!("Failed to build reverse zone {net}"))?;
                println!("{net}: {outcome}");
            } else if all {
                let report = reconcilers::build_all_reverse(&ctx);
                print_report("reverse", &report);
                report.into_result()?;
            }
        }
        Commands::Commit => {
            if !publish::commit(&ctx)? {
                println!("Configuration written; reload failed");
            }
        }
        Commands::Display { zone, reverse } => {
            let text = match (zone, reverse) {
                (Some(name), _) => reconcilers::display_forward_zone(&ctx, &name)?,
                (None, Some(net)) => reconcilers::display_reverse_zone(&ctx, &net)?,
                (None, None) => bail!("Either --zone or --reverse is required"),
            };
            print!("{text}");
        }
        Commands::ListZones { reverse, json } => list_zones(&ctx, reverse, json)?,
        Commands::ListDuplicates => list_duplicates(&ctx)?,
        Commands::AddZone {
            name,
            primary_ns,
            secondary_ns,
            slave_master,
        } => {
            let master = slave_master.map(|ip| ip.to_string());
            let secondary = secondary_ns.or_else(|| ctx.settings.secondary_ns.clone());
            catalog::insert_forward_zone(
                ctx.store(),
                &NewForwardZone {
                    name: &name,
                    primary_ns: primary_ns.as_deref().unwrap_or(&ctx.settings.primary_ns),
                    secondary_ns: secondary.as_deref(),
                    hostmaster: &ctx.settings.hostmaster,
                    timers: ctx.settings.timers(),
                    kind: kind_for(master.as_deref()),
                    master: master.as_deref(),
                },
            )
            .with_context(|| format!("Failed to add zone {name}"))?;
            info!(zone = %name, "Zone added");
        }
        Commands::AddReverseZone {
            range,
            prefix,
            primary_ns,
            secondary_ns,
            slave_master,
        } => {
            let net = NetRange::from_addr(range, prefix)?;
            let master = slave_master.map(|ip| ip.to_string());
            let secondary = secondary_ns.or_else(|| ctx.settings.secondary_ns.clone());
            catalog::insert_reverse_zone(
                ctx.store(),
                &NewReverseZone {
                    range: net,
                    primary_ns: primary_ns.as_deref().unwrap_or(&ctx.settings.primary_ns),
                    secondary_ns: secondary.as_deref(),
                    hostmaster: &ctx.settings.hostmaster,
                    timers: ctx.settings.timers(),
                    kind: kind_for(master.as_deref()),
                    master: master.as_deref(),
                },
            )
            .with_context(|| format!("Failed to add reverse zone {net}"))?;
            info!(zone = %net, arpa = %net.arpa_name(), "Reverse zone added");
        }
        Commands::AddRecord {
            zone,
            host,
            rtype,
            dest,
            priority,
            service,
            protocol,
        } => {
            let rtype = parse_type(&rtype)?;
            let zone_row = catalog::forward_zone(ctx.store(), &zone)?;
            catalog::insert_record(
                ctx.store(),
                &NewRecord {
                    zone_id: zone_row.id,
                    host: &host,
                    rtype,
                    destination: &dest,
                    priority,
                    service: service.as_deref(),
                    protocol: protocol.as_deref(),
                },
            )?;
            info!(zone = %zone, host = %host, rtype = %rtype, destination = %dest, "Record added");
        }
        Commands::DeleteRecord { zone, host, rtype } => {
            let rtype = parse_type(&rtype)?;
            let zone_row = catalog::forward_zone(ctx.store(), &zone)?;
            let removed = catalog::delete_records(ctx.store(), zone_row.id, &host, rtype)?;
            if removed == 0 {
                bail!("No {rtype} record for {host} in {zone}");
            }
            info!(zone = %zone, host = %host, rtype = %rtype, removed, "Records deleted");
        }
        Commands::AddPreferred { ip, fqdn } => add_preferred(&ctx, ip, &fqdn)?,
        Commands::DeletePreferred { ip } => {
            if catalog::delete_preferred(ctx.store(), ip)? == 0 {
                bail!("No preferred record for {ip}");
            }
            info!(ip = %ip, "Preferred record removed");
        }
        Commands::AddGlue {
            zone,
            child,
            ns,
            ip,
        } => {
            let zone_row = catalog::forward_zone(ctx.store(), &zone)?;
            catalog::insert_glue(
                ctx.store(),
                &NewGlue {
                    zone_id: zone_row.id,
                    child: &child,
                    primary_ns: &ns[0],
                    secondary_ns: ns.get(1).map(String::as_str),
                    primary_ip: ip.first().copied(),
                    secondary_ip: ip.get(1).copied(),
                },
            )?;
            info!(zone = %zone, child = %child, "Glue added");
        }
        Commands::InitDb | Commands::Completions { .. } => {}
    }
    Ok(())
}

fn kind_for(master: Option<&str>) -> ZoneKind {
    if master.is_some() {
        ZoneKind::Slave
    } else {
        ZoneKind::Master
    }
}

fn parse_type(rtype: &str) -> Result<RecordType> {
    RecordType::from_str(&rtype.to_ascii_uppercase())
        .with_context(|| format!("Unknown record type {rtype}"))
}

fn print_report(side: &str, report: &BatchReport) {
    println!(
        "{side}: {} built, {} unchanged, {} invalid, {} failed",
        report.built, report.unchanged, report.invalid, report.failed
    );
}

fn list_zones(ctx: &BuildContext, reverse: bool, json: bool) -> Result<()> {
    if reverse {
        let zones = catalog::reverse_zones(ctx.store())?;
        if json {
            println!("{}", serde_json::to_string_pretty(&zones)?);
            return Ok(());
        }
        for zone in zones {
            println!(
                "{}/{}\t{}\t{}\t{}",
                zone.net_range,
                zone.prefix,
                zone.kind.as_str(),
                zone.serial,
                zone.validity
            );
        }
    } else {
        let zones = catalog::forward_zones(ctx.store())?;
        if json {
            println!("{}", serde_json::to_string_pretty(&zones)?);
            return Ok(());
        }
        for zone in zones {
            println!(
                "{}\t{}\t{}\t{}",
                zone.name,
                zone.kind.as_str(),
                zone.serial,
                zone.validity
            );
        }
    }
    Ok(())
}

fn list_duplicates(ctx: &BuildContext) -> Result<()> {
    let duplicates = catalog::duplicate_a_records(ctx.store())?;
    let preferred = catalog::preferred_all(ctx.store())?;
    for record in duplicates {
        let mark = if preferred
            .iter()
            .any(|p| p.ip == record.ip && p.record_id == record.record_id)
        {
            "*"
        } else {
            " "
        };
        println!(
            "{}\t{mark} {}",
            record.ip,
            record_fqdn(&record.host, &record.zone)
        );
    }
    Ok(())
}

fn add_preferred(ctx: &BuildContext, ip: Ipv4Addr, fqdn: &str) -> Result<()> {
    let wanted = dnsa::model::fqdn(fqdn);
    let host_range = NetRange::from_addr(ip, 32)?;
    let candidates = catalog::forward_candidates(ctx.store(), &host_range)?;
    let Some(record) = candidates
        .iter()
        .find(|c| record_fqdn(&c.host, &c.zone).eq_ignore_ascii_case(&wanted))
    else {
        bail!("No A record {wanted} points at {ip}");
    };
    catalog::insert_preferred(ctx.store(), ip, record.record_id, &wanted)
        .with_context(|| format!("Failed to prefer {wanted} for {ip}"))?;
    info!(ip = %ip, fqdn = %wanted, record_id = record.record_id, "Preferred record set");
    Ok(())
}
