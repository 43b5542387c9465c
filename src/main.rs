#![allow(clippy::print_stderr)]
#![allow(clippy::exit)]
#![allow(clippy::single_call_fn)]

use clap::{ArgAction, CommandFactory, Parser, ValueHint, value_parser};
use clap_complete::aot::{Shell, generate};
use dsweep::{
    ActionEngine, BufferPool, DirHandle, NameIndex, ProgressReporter, Result, RunConfig,
    SortOrder, SweepError, scan_directory,
};
use std::ffi::OsString;
use std::io::{BufWriter, stdout};
use std::os::unix::ffi::OsStrExt;

/// generate our arguments and parse them.
#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "Prints or deletes every regular file in one directory, in the sorted order \
             that keeps the filesystem's directory index from rebalancing itself to death",
    after_help = "Environment:\n  \
        DSWEEP_DELETE=delete      unlink the files instead of printing them (exact value required)\n  \
        DSWEEP_PROGRESS           emit progress ticks/milestones on stderr\n  \
        DSWEEP_PROGRESS_MINOR     actions per tick (default 1000)\n  \
        DSWEEP_PROGRESS_MAJOR     ticks per milestone (default 50)\n  \
        DSWEEP_NO_STAT_FALLBACK   skip DT_UNKNOWN entries instead of stat-resolving them"
)]
pub struct Args {
    #[arg(
        value_name = "DIRECTORY",
        help = "Directory to sweep; must be fully-qualified (start with /) for safety",
        value_hint = ValueHint::DirPath,
        required_unless_present = "generate"
    )]
    directory: Option<OsString>,

    #[arg(
        long = "generate",
        action = ArgAction::Set,
        value_parser = value_parser!(Shell),
        help = "Generate shell completions"
    )]
    generate: Option<Shell>,
}

fn main() {
    let args = Args::parse();

    if let Some(generator) = args.generate {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_owned();
        generate(generator, &mut cmd, name, &mut stdout());
        return;
    }

    if let Err(error) = run(args) {
        eprintln!("dsweep: {error}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // clap already enforced presence; the error here only guards the --generate path
    let directory = args.directory.ok_or(SweepError::RelativePath)?;
    // refuse relative paths before any filesystem access is attempted
    if !directory.as_bytes().starts_with(b"/") {
        return Err(SweepError::RelativePath);
    }

    // both toggles are resolved before the directory is even opened
    let config = RunConfig::from_env()?;

    let dir = DirHandle::open(&directory)?;
    let mut pool = BufferPool::new();
    let mut index = NameIndex::new(SortOrder::Ascending);
    let total_files = scan_directory(&dir, &mut pool, &mut index, &config)?;

    eprintln!("Total files: {total_files}");
    eprintln!("Performing {}...", config.mode.verb());

    let sink = BufWriter::new(stdout().lock());
    let progress = ProgressReporter::from_config(&config);
    let mut engine = ActionEngine::new(&pool, &dir, config.mode, sink, progress);
    engine.run(&index)?;

    eprintln!("Done");
    Ok(())
}
