use clap::Parser;
use miette::Result;
use insp::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let global = &cli.global;
    match cli.command {
        Commands::Init(args) => insp::cli::commands::init::run(args, global),
        Commands::Import(args) => insp::cli::commands::import::run(args, global),
        Commands::Stats(args) => insp::cli::commands::stats::run(args, global),
        Commands::Summary(args) => insp::cli::commands::summary::run(args, global),
        Commands::Batches(args) => insp::cli::commands::batches::run(args, global),
        Commands::Years => insp::cli::commands::batches::run_years(global),
        Commands::Catalog(args) => insp::cli::commands::catalog::run(args, global),
        Commands::Completions(args) => insp::cli::commands::completions::run(args),
    }
}

/// Logs go to stderr so stdout stays parseable; RUST_LOG wins unless -v is given
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}
