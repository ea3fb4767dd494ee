use clap::{Parser, Subcommand};
use refstore_core::{log_contents, KeyRange, Result};
use refstore_tool::{
    build_range, entry_json, load_dump, pool_info, scan, to_pretty_json, KeyEncoding,
    RangeArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "refstore tool")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the size classes a pool config produces
    PoolInfo {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Borrow one buffer of each of these sizes before reporting
        #[arg(short, long, value_delimiter = ',')]
        acquire: Vec<usize>,
    },
    /// Load a JSON dump and print the entries of a key range
    Scan {
        data: PathBuf,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        stop: Option<String>,
        #[arg(long)]
        exclude_start: bool,
        #[arg(long)]
        exclude_stop: bool,
        #[arg(short, long)]
        reverse: bool,
        #[arg(short, long)]
        limit: Option<usize>,
        /// Keys in the dump and on the command line are hex encoded
        #[arg(long)]
        hex: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let opt: Opt = Opt::parse();
    match opt.command {
        Command::PoolInfo { config, acquire } => {
            let info = pool_info(config.as_deref(), &acquire)?;
            println!("{}", to_pretty_json(&info)?);
        }
        Command::Scan {
            data,
            prefix,
            start,
            stop,
            exclude_start,
            exclude_stop,
            reverse,
            limit,
            hex,
        } => {
            let encoding = if hex { KeyEncoding::Hex } else { KeyEncoding::Utf8 };
            let memtable = load_dump(data, encoding)?;
            log_contents(&memtable, KeyRange::all(), "dump")?;
            let args = RangeArgs {
                prefix,
                start,
                stop,
                exclude_start,
                exclude_stop,
                reverse,
            };
            let range = build_range(&args, encoding)?;
            for entry in scan(&memtable, range, limit)? {
                println!("{}", entry_json(&entry, encoding));
            }
        }
    }
    Ok(())
}
