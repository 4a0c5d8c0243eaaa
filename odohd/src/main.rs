// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// odohd: Oblivious DoH target and proxy daemon.

use std::sync::Arc;

use clap::Parser;
use rand::rngs::OsRng;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use odoh_common::KeyManager;
use odoh_proxy::Proxy;
use odoh_target::{Target, UdpResolver};
use odohd::config::{Args, Command, Settings};
use odohd::keygen::keygen;
use odohd::metrics::{self, PrometheusSink};
use odohd::{routes, tls};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.log_json);

    if matches!(args.command, Some(Command::Keygen)) {
        let provisioned = keygen(&mut OsRng)?;
        // Seed alone on stdout so `odohd keygen > seed` yields a usable file.
        println!("{}", provisioned.seed);
        eprintln!("key id:      {}", provisioned.key_id());
        eprintln!("odohconfigs: {}", provisioned.configs());
        return Ok(());
    }

    let settings = Settings::from_args(&args)?;
    let tls_config = settings
        .tls
        .as_ref()
        .map(|files| tls::load_tls_config(&files.cert, &files.key))
        .transpose()?;

    let sink = Arc::new(PrometheusSink::new()?);
    let keys = Arc::new(KeyManager::from_store(settings.key_store().as_ref())?);
    let resolver = Arc::new(UdpResolver::new(settings.resolver.clone()));
    let target = Arc::new(Target::new(
        keys,
        resolver,
        sink.clone(),
        settings.target.clone(),
    ));
    let proxy = Arc::new(Proxy::new(settings.proxy.clone(), sink.clone())?);
    let app = routes::router(target, proxy);

    let metrics_listener = TcpListener::bind(&settings.metrics_listen).await?;
    info!(listen = %settings.metrics_listen, "metrics server started");
    let metrics_app = metrics::router(sink);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
            error!(error = %e, "metrics server failed");
        }
    });

    let listener = TcpListener::bind(&settings.listen).await?;
    info!(
        listen = %settings.listen,
        resolver = %settings.resolver,
        tls = tls_config.is_some(),
        resolver_timeout = ?settings.target.resolver_timeout,
        proxy_timeout = ?settings.proxy.timeout,
        "odohd started"
    );

    match tls_config {
        Some(config) => tls::serve_tls(listener, config, app).await,
        None => axum::serve(listener, app).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .from_env_lossy()
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
