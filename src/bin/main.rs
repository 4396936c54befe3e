use map2_reconcile::args::Args;
use map2_reconcile::config::ReconcileConfig;
use map2_reconcile::reconciler::Reconciler;
use map2_reconcile::report;
use std::process;

fn main() {
    let args = Args::parse();

    // stdout carries the report, so log records go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match ReconcileConfig::try_from(args.config_file.clone())
        .and_then(|config| config.select(&args.variants))
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {}", err);
            process::exit(1);
        }
    };

    let reconciliation = match Reconciler::new(config).run() {
        Ok(reconciliation) => reconciliation,
        Err(err) => {
            eprintln!("reconciliation aborted: {}", err);
            process::exit(1);
        }
    };
    println!("{}", report::render(&reconciliation));

    if args.strict && !reconciliation.is_consistent() {
        process::exit(2);
    }
}
