use anyhow::{anyhow, Context};
use member_identity::{
    config::{self, IdentityConfig},
    member::{MemberIdentity, MemberKind},
    storage::{FileIdentityStorage, IdentityStorage},
    wire::codec,
};
use std::net::IpAddr;
use std::path::PathBuf;

const USAGE: &str = "usage:
  member-identity [--config=FILE] [--verbose] new --addr=IP --port=N [--direct-port=N]
                  [--kind=normal|locator|admin|loner|N] [--name=S] [--group=G]... [--out=FILE]
  member-identity [--config=FILE] [--verbose] show [FILE]
  member-identity [--config=FILE] [--verbose] hex [FILE]";

#[derive(Debug, Default, PartialEq)]
struct NewArgs {
    addr: Option<IpAddr>,
    port: Option<u16>,
    direct_port: u16,
    kind: MemberKind,
    name: Option<String>,
    groups: Vec<String>,
    out: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Command {
    New(NewArgs),
    Show(Option<PathBuf>),
    Hex(Option<PathBuf>),
}

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    verbose: bool,
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args).map_err(|e| anyhow!("{}\n{}", e, USAGE))?;

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let identity_config = match &cli.config {
        Some(path) => IdentityConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IdentityConfig::from_env(),
    };
    let data_dir = identity_config.data_dir.clone();
    config::init(identity_config);

    match cli.command {
        Command::New(args) => run_new(args, data_dir),
        Command::Show(file) => run_show(file, data_dir),
        Command::Hex(file) => run_hex(file, data_dir),
    }
}

fn run_new(args: NewArgs, data_dir: PathBuf) -> anyhow::Result<()> {
    let addr = args.addr.ok_or_else(|| anyhow!("--addr is required"))?;
    let port = args.port.ok_or_else(|| anyhow!("--port is required"))?;

    let mut identity = MemberIdentity::new(addr, port);
    identity.set_direct_port(args.direct_port);
    identity.set_kind(args.kind);
    identity.set_process_id(i32::try_from(std::process::id()).unwrap_or(0));
    identity.set_name(args.name);
    identity.set_groups(args.groups);
    let logical_id = identity.assign_random_logical_id();

    match args.out {
        Some(path) => {
            let bytes = identity.to_bytes()?;
            std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {} to {}", identity, path.display());
        }
        None => {
            let mut storage = FileIdentityStorage::new(data_dir)?;
            storage.save(&identity)?;
            tracing::info!(
                "Saved {} to {}",
                identity,
                storage.identity_file_path().display()
            );
        }
    }

    tracing::debug!("Assigned logical id {}", logical_id);
    Ok(())
}

fn read_identity(file: Option<PathBuf>, data_dir: PathBuf) -> anyhow::Result<(MemberIdentity, Vec<u8>)> {
    let path = match file {
        Some(path) => path,
        None => FileIdentityStorage::new(data_dir)?.identity_file_path(),
    };
    let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let identity = codec::decode_from_slice(&bytes)
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok((identity, bytes))
}

fn run_show(file: Option<PathBuf>, data_dir: PathBuf) -> anyhow::Result<()> {
    let (identity, _) = read_identity(file, data_dir)?;
    let version = member_identity::wire::Version::require(identity.version())?;

    println!("{}", identity);
    println!("  version:        {}", version);
    println!(
        "  address:        {}",
        identity
            .address()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "<unset>".to_string())
    );
    println!("  membership port: {}", identity.membership_port());
    println!("  direct port:    {}", identity.direct_port());
    println!("  process id:     {}", identity.process_id());
    println!("  view id:        {}", identity.view_id());
    println!("  kind:           {}", identity.kind());
    println!("  weight:         {}", identity.weight());
    println!("  coordinator:    {}", identity.is_preferred_coordinator());
    println!("  partition det.: {}", identity.is_partition_detection_enabled());
    println!("  groups:         {}", identity.groups().join(","));
    Ok(())
}

fn run_hex(file: Option<PathBuf>, data_dir: PathBuf) -> anyhow::Result<()> {
    let (_, bytes) = read_identity(file, data_dir)?;
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    println!("{}", hex);
    Ok(())
}

fn parse_kind(value: &str) -> Result<MemberKind, String> {
    match value {
        "normal" => Ok(MemberKind::Normal),
        "locator" => Ok(MemberKind::Locator),
        "admin" => Ok(MemberKind::Admin),
        "loner" => Ok(MemberKind::Loner),
        other => other
            .parse::<i32>()
            .map(MemberKind::from_i32)
            .map_err(|_| format!("Unknown member kind: {}", other)),
    }
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config = None;
    let mut verbose = false;
    let mut rest = args.iter().skip(1).peekable();

    while let Some(arg) = rest.peek() {
        if let Some(path) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(path));
        } else if arg.as_str() == "--verbose" {
            verbose = true;
        } else {
            break;
        }
        rest.next();
    }

    let command = match rest.next().map(String::as_str) {
        Some("new") => {
            let mut new_args = NewArgs::default();
            for arg in rest {
                let (key, value) = arg
                    .split_once('=')
                    .ok_or_else(|| format!("Expected --key=value, got {}", arg))?;
                match key {
                    "--addr" => {
                        new_args.addr = Some(
                            value
                                .parse()
                                .map_err(|_| format!("Invalid address: {}", value))?,
                        )
                    }
                    "--port" => {
                        new_args.port =
                            Some(value.parse().map_err(|_| format!("Invalid port: {}", value))?)
                    }
                    "--direct-port" => {
                        new_args.direct_port = value
                            .parse()
                            .map_err(|_| format!("Invalid direct port: {}", value))?
                    }
                    "--kind" => new_args.kind = parse_kind(value)?,
                    "--name" => new_args.name = Some(value.to_string()),
                    "--group" => new_args.groups.push(value.to_string()),
                    "--out" => new_args.out = Some(PathBuf::from(value)),
                    other => return Err(format!("Unknown option: {}", other)),
                }
            }
            Command::New(new_args)
        }
        Some("show") => Command::Show(single_file_arg(rest)?),
        Some("hex") => Command::Hex(single_file_arg(rest)?),
        Some(other) => return Err(format!("Unknown command: {}", other)),
        None => return Err("No command given".to_string()),
    };

    Ok(Cli {
        config,
        verbose,
        command,
    })
}

fn single_file_arg<'a>(mut rest: impl Iterator<Item = &'a String>) -> Result<Option<PathBuf>, String> {
    let file = rest.next().map(PathBuf::from);
    if let Some(extra) = rest.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    Ok(file)
}
