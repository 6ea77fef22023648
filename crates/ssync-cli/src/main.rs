use clap::{Args as ClapArgs, Parser, Subcommand};
use ssync_core::config::{config_path, credentials_path};
use ssync_core::{Credentials, Layout, LocalStore, SyncConfig, Syncer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ssync",
    about = "Back up and restore Schedule I save slots to an object store",
    version
)]
struct Cli {
    /// Config file (defaults to <config dir>/schedulesync/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Game save base holding one directory per player id
    #[arg(long, global = true, value_name = "DIR")]
    saves_base: Option<PathBuf>,
    /// Root of the directory-backed object store (buckets are sub-directories)
    #[arg(long, global = true, value_name = "DIR", env = "SSYNC_STORE_DIR")]
    store_dir: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the resolved saves root, slot directory and staging directory
    Paths,
    /// List save slots present for the configured player
    Slots,
    /// Archive the active slot and upload it
    Backup,
    /// Download the remote archive and replace the active slot with it
    Restore,
    /// List buckets visible with the credential file
    Buckets,
    /// Show or edit the config file
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Print the config as JSON
    Show,
    /// Update one or more fields
    Set(SetArgs),
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    /// Steam id of the local player
    #[arg(long)]
    player_id: Option<String>,
    /// Active slot, 1-based as shown in game
    #[arg(long, value_parser = clap::value_parser!(i8).range(1..=5))]
    slot: Option<i8>,
    #[arg(long)]
    bucket: Option<String>,
    #[arg(long)]
    blob: Option<String>,
}

struct Ctx {
    config_path: PathBuf,
    layout: Layout,
    store_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = build_ctx(&cli).unwrap_or_else(|e| fail(2, e));
    match cli.cmd {
        Cmd::Paths => cmd_paths(&ctx),
        Cmd::Slots => cmd_slots(&ctx),
        Cmd::Backup => cmd_backup(&ctx),
        Cmd::Restore => cmd_restore(&ctx),
        Cmd::Buckets => cmd_buckets(&ctx),
        Cmd::Config(ConfigCmd::Show) => cmd_config_show(&ctx),
        Cmd::Config(ConfigCmd::Set(a)) => cmd_config_set(&ctx, a),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(code: i32, e: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", e);
    std::process::exit(code);
}

fn build_ctx(cli: &Cli) -> Result<Ctx, String> {
    let config_path = match &cli.config {
        Some(p) => p.clone(),
        None => config_path().map_err(|e| e.to_string())?,
    };
    let layout = match &cli.saves_base {
        Some(base) => Layout::new(base, ssync_core::paths::default_staging_dir()),
        None => Layout::detect()
            .ok_or("could not locate the game save directory; pass --saves-base")?,
    };
    Ok(Ctx { config_path, layout, store_dir: cli.store_dir.clone() })
}

fn load(ctx: &Ctx) -> SyncConfig {
    ssync_core::load_or_init_config(&ctx.config_path, &ctx.layout).unwrap_or_else(|e| fail(2, e))
}

fn syncer(ctx: &Ctx) -> Syncer<LocalStore> {
    let Some(root) = &ctx.store_dir else {
        fail(2, "no object store configured; pass --store-dir or set SSYNC_STORE_DIR");
    };
    Syncer::new(ctx.layout.clone(), LocalStore::new(root))
}

fn cmd_paths(ctx: &Ctx) {
    let cfg = load(ctx);
    let paths = ctx.layout.resolve(&cfg).unwrap_or_else(|e| fail(3, e));
    println!("saves\t{}", paths.saves_root.display());
    println!("slot\t{}", paths.slot_dir.display());
    println!("staging\t{}", paths.staging_dir.display());
}

fn cmd_slots(ctx: &Ctx) {
    let cfg = load(ctx);
    let slots = ssync_core::list_slots(&ctx.layout, &cfg);
    for n in 1..=ssync_core::SLOT_COUNT as u8 {
        let active = if i16::from(n) == cfg.slot_number() { "*" } else { " " };
        if !slots.is_present(n) {
            println!("{}{}\t(empty)", active, n);
            continue;
        }
        let dir = ctx.layout.saves_root(&cfg).join(ssync_core::paths::slot_dir_name(n));
        let modified = std::fs::metadata(&dir)
            .and_then(|m| m.modified())
            .map(|t| {
                let local = chrono::DateTime::<chrono::Local>::from(t);
                local.format("%Y-%m-%d %H:%M").to_string()
            })
            .unwrap_or_default();
        let org = ssync_core::organisation_name(&ctx.layout, &cfg, n);
        println!("{}{}\t{}\t{}", active, n, modified, org);
    }
}

fn cmd_backup(ctx: &Ctx) {
    let cfg = load(ctx);
    match syncer(ctx).backup(&cfg) {
        Ok(remote) => println!("uploaded slot {} to {}", cfg.slot_number(), remote),
        Err(e) => fail(4, e),
    }
}

fn cmd_restore(ctx: &Ctx) {
    let cfg = load(ctx);
    match syncer(ctx).restore(&cfg) {
        Ok(slot) => println!("restored {}", slot.display()),
        Err(e) => fail(4, e),
    }
}

fn cmd_buckets(ctx: &Ctx) {
    let creds = Credentials::new(credentials_path().unwrap_or_else(|e| fail(2, e)));
    if !creds.exists() {
        fail(2, format!("credential file not found: {}", creds.path.display()));
    }
    match syncer(ctx).buckets(&creds) {
        Ok(names) => {
            for n in names {
                println!("{}", n);
            }
        }
        Err(e) => fail(4, e),
    }
}

fn cmd_config_show(ctx: &Ctx) {
    let cfg = load(ctx);
    match serde_json::to_string_pretty(&cfg) {
        Ok(s) => println!("{}", s),
        Err(e) => fail(3, e),
    }
}

fn cmd_config_set(ctx: &Ctx, args: SetArgs) {
    let mut cfg = load(ctx);
    if let Some(id) = args.player_id {
        cfg.player_id = id;
    }
    if let Some(slot) = args.slot {
        cfg.save_slot = slot - 1;
    }
    if let Some(b) = args.bucket {
        cfg.bucket_name = b;
    }
    if let Some(b) = args.blob {
        cfg.blob_name = b;
    }
    ssync_core::save_config(&ctx.config_path, &cfg).unwrap_or_else(|e| fail(5, e));
    tracing::info!(path = %ctx.config_path.display(), "Config saved");
}
