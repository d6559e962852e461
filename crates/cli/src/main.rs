//! 32-bit ARM emulation harness CLI.
//!
//! This binary runs a program image on the software core. It performs:
//! 1. **Setup:** Builds a session from defaults or a JSON config file, with command-line overrides.
//! 2. **Load:** Copies an ELF32 ARM executable or a raw image into the binary region.
//! 3. **Run:** Executes from the entry point (or `--start`) to `--end` and reports the outcome.
//!
//! A run that reaches its end address dumps every region under the dump root.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use armemu_core::config::Config;
use armemu_core::cpu::Register;
use armemu_core::sim::{RunOutcome, loader};
use armemu_core::{Emulator, SoftCore};

#[derive(Parser, Debug)]
#[command(
    name = "armemu",
    author,
    version,
    about = "32-bit ARM emulation harness",
    long_about = "Load a program image into a fresh session and run it on the software core.\n\nNumbers may be given in decimal or with a 0x prefix.\n\nExamples:\n  armemu run -f firmware.elf\n  armemu run -f blob.bin --end 0x400100 --dump-dir out\n  armemu run -f blob.bin --config session.json --no-dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load an image and run it until the end address.
    Run {
        /// ELF32 ARM executable or raw binary image.
        #[arg(short, long)]
        file: PathBuf,

        /// Start address (defaults to the image entry point).
        #[arg(long, value_parser = parse_u32)]
        start: Option<u32>,

        /// End address (defaults to one past the last loaded byte).
        #[arg(long, value_parser = parse_u32)]
        end: Option<u32>,

        /// JSON session configuration.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base address of the first region.
        #[arg(long, value_parser = parse_u64)]
        base: Option<u64>,

        /// Directory that receives region dumps.
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Do not dump regions when the run completes.
        #[arg(long)]
        no_dump: bool,

        /// Log every executed instruction.
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            start,
            end,
            config,
            base,
            dump_dir,
            no_dump,
            verbose,
        } => {
            init_logging(verbose);
            let opts = RunOptions {
                start,
                end,
                base,
                dump_dir,
                no_dump,
                verbose,
            };
            match cmd_run(&file, config.as_deref(), &opts) {
                Ok(code) => code,
                Err(err) => {
                    error!("{err}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Command-line overrides applied on top of the configuration.
#[derive(Debug)]
struct RunOptions {
    start: Option<u32>,
    end: Option<u32>,
    base: Option<u64>,
    dump_dir: Option<PathBuf>,
    no_dump: bool,
    verbose: bool,
}

/// Installs a `tracing` subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Builds a session, loads `file` and runs it.
///
/// Returns success when the run completes or is stopped, and failure for a core fault.
fn cmd_run(
    file: &Path,
    config_path: Option<&Path>,
    opts: &RunOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(base) = opts.base {
        config.memory.base = base;
    }
    if let Some(dir) = &opts.dump_dir {
        config.dump.root.clone_from(dir);
    }
    if opts.no_dump {
        config.dump.enabled = false;
    }
    config.general.trace_instructions |= opts.verbose;

    println!(
        "  Base: {:#010x}  Binary: {} MB  Stack: {} MB",
        config.memory.base,
        config.memory.bin_size / 1024 / 1024,
        config.memory.stack_size / 1024 / 1024
    );

    let core = SoftCore::nop().with_trace(config.general.trace_instructions);
    let mut emu = Emulator::new(&config, core)?;
    let image = loader::load_file(&mut emu, file)?;
    println!(
        "[*] Loaded {} ({}): entry {:#010x}, end {:#010x}",
        file.display(),
        if image.elf { "ELF" } else { "raw" },
        image.entry,
        image.end
    );

    let start = match opts.start {
        Some(start) => start,
        None => u32::try_from(image.entry)?,
    };
    let end = match opts.end {
        Some(end) => end,
        None => u32::try_from(image.end)?,
    };

    match emu.start(start, end) {
        Ok(RunOutcome::Completed { dump }) => {
            match dump {
                Some(dir) => println!("\n[*] Completed, regions dumped to {}", dir.display()),
                None => println!("\n[*] Completed"),
            }
            println!("    Instructions: {}", emu.core().executed());
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunOutcome::Stopped { pc }) => {
            println!("\n[*] Stopped at {pc:#010x}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("\n[!] FATAL: {err}");
            eprintln!(
                "    pc = {:#010x}  sp = {:#010x}",
                emu.reg_read(Register::Pc),
                emu.reg_read(Register::Sp)
            );
            emu.core().state().regs().dump();
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
fn parse_u64(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|err| format!("invalid number '{text}': {err}"))
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let value = parse_u64(text)?;
    u32::try_from(value).map_err(|_| format!("'{text}' does not fit in 32 bits"))
}
