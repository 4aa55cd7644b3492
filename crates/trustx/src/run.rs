use {
    crate::{
        domain::{Adapter, Host, placement::HtSlot},
        infra::{cli, config, observe},
    },
    anyhow::Context,
    clap::Parser,
};

/// Runs the binary and exits the process with its status.
pub async fn start(args: impl Iterator<Item = String>) {
    if let Err(err) = run(args).await {
        tracing::error!(?err, "failed to get demand");
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

/// Loads the configuration, requests demand for the slots given on the
/// command line and prints it.
pub async fn run(args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let args = cli::Args::parse_from(args);
    observe::init(&args.log);

    let config = config::file::load(&args.config)
        .await
        .with_context(|| format!("loading {:?}", args.config))?;
    let adapter = Adapter::new(
        config,
        Host {
            page_url: args.page_url,
            global_timeout: args.global_timeout,
        },
    )
    .context("resolving endpoints")?;
    tracing::debug!(profile = ?adapter.profile(), "adapter ready");

    let slots = args
        .slots
        .iter()
        .map(|slot| HtSlot::from(slot.as_str()))
        .collect::<Vec<_>>();
    let demand = adapter.get_demand(&args.correlator, &slots).await?;
    println!("{}", serde_json::to_string_pretty(&demand)?);

    if args.metrics {
        print!(
            "{}",
            ::observe::metrics::encode(::observe::metrics::get_registry())
        );
    }
    Ok(())
}
