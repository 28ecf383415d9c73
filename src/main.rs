//! condensat - digest lookup tables
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::io::{self, IsTerminal};
use std::process;
use std::time::Instant;

use condensat::cli::{Args, Command, GenerateArgs, LookupArgs};
use condensat::generate::{GenerateConfig, Generator};
use condensat::index::LookupTable;
use condensat::progress::{
    create_spinner, print_banner, print_error, print_header, print_info, print_load_summary,
};
use condensat::session::SessionDriver;

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.command.verbose() {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.command.quiet() && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        let mut source = e.source();
        while let Some(err) = source {
            print_error(&format!("  Caused by: {}", err));
            source = err.source();
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if !args.command.quiet() {
        print_banner();
    }

    match args.command {
        Command::Generate(args) => run_generate(&args),
        Command::Lookup(args) => run_lookup(&args),
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let input = args.input_path()?;
    if !input.exists() {
        anyhow::bail!("Input path does not exist: {:?}", input);
    }

    let config = GenerateConfig::from_args(args)?;

    if config.verbose {
        print_header("Configuration");
        print_info(&format!("Input:        {:?}", input));
        print_info(&format!("Output:       {:?}", config.output));
        print_info(&format!("Algorithm:    {}", config.algorithm));
        print_info(&format!("Recursive:    {}", config.recursive));
        print_info(&format!("Extensions:   {:?}", config.extensions));
        print_info(&format!("Buffer size:  {} MB", config.buffer_size / (1024 * 1024)));
        print_info(&format!("Threads:      {}", args.threads.unwrap_or_else(num_cpus::get)));
    }

    let quiet = config.quiet;
    let algorithm = config.algorithm;
    let output = config.output.clone();

    let stats = Generator::new(config).generate(&input)?;

    if !quiet {
        stats.print_summary(algorithm, &output);
    }

    Ok(())
}

fn run_lookup(args: &LookupArgs) -> anyhow::Result<()> {
    let path = args.table_path()?;

    let spinner = if args.quiet {
        indicatif::ProgressBar::hidden()
    } else {
        print_header(&format!("Loading table {:?}...", path));
        create_spinner("Indexing digests...")
    };

    let start = Instant::now();
    let loaded = LookupTable::load(&path, args.algorithm);
    spinner.finish_and_clear();
    let (table, stats) = loaded?;

    if !args.quiet {
        print_load_summary(&table, &stats, start.elapsed());
        if io::stdin().is_terminal() {
            print_info("Enter digests to resolve (Ctrl+D to finish):");
        }
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();

    SessionDriver::new(table).run(stdin.lock(), stdout.lock(), stderr.lock())?;

    Ok(())
}
