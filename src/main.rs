use clap::Parser;
use lc3_vm::emulator;
use lc3_vm::errors::ExecutionError;
use lc3_vm::terminal;
use log::LevelFilter;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const EXIT_LOAD_FAILED: u8 = 1;
const EXIT_EXECUTION_FAILED: u8 = 134;
const EXIT_INTERRUPTED: u8 = 254;

/// Runs LC-3 program images, starting at address 0x3000.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Program images: big-endian words, the first one being the load address
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Log more, repeat for trace output of every instruction
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Raw mode turns CTRL-C into a key press, signals sent by other processes still have to
/// stop the run loop so the terminal gets restored. A second signal exits immediately.
fn register_signal_handlers(interrupt: &Arc<AtomicBool>) {
    for &signal in TERM_SIGNALS {
        let registered = flag::register_conditional_shutdown(
            signal,
            i32::from(EXIT_INTERRUPTED),
            Arc::clone(interrupt),
        )
        .and_then(|_| flag::register(signal, Arc::clone(interrupt)));
        if let Err(e) = registered {
            log::warn!("Could not register handler for signal {signal}: {e}");
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut emu = match emulator::from_images(&args.images) {
        Ok(emu) => emu,
        Err(e) => {
            eprintln!("{e}");
            if let Some(source) = e.source() {
                log::error!("{source}");
            }
            return ExitCode::from(EXIT_LOAD_FAILED);
        }
    };
    register_signal_handlers(&emu.interrupt_flag());

    let result = {
        let lock = terminal::set_terminal_raw(io::stdout());
        emu.output_mut().set_raw(lock.is_enabled());
        emu.execute()
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExecutionError::Interrupted) => {
            println!();
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_EXECUTION_FAILED)
        }
    }
}
