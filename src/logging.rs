use std::future::Future;

use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

use crate::config::Config;

const DEFAULT_LOG_DIRECTIVES: &str = "tower_http=debug,teamshook=info,info";

pub struct TracingSetup;

impl TracingSetup {
    /// Install the global subscriber, then run `func` to completion.
    ///
    /// Spans are exported to Jaeger when a telemetry URL is configured.
    pub async fn with_setup<Func, Fut>(config: Config, func: Func) -> color_eyre::Result<()>
    where
        Fut: Future<Output = color_eyre::Result<()>> + Send + 'static,
        Func: FnOnce(Config) -> Fut + Send,
    {
        configure_log_var();

        let registry = Registry::default()
            .with(EnvFilter::from_default_env())
            .with(
                HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true),
            )
            .with(ErrorLayer::default());

        match config.telemetry_url() {
            Some(telemetry_url) => {
                let tracer = opentelemetry_jaeger::new_pipeline()
                    .with_agent_endpoint(telemetry_url)
                    .with_service_name(crate::server_info::APP_NAME)
                    .install_batch(opentelemetry::runtime::Tokio)?;

                registry
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .init();

                let result = tokio::spawn(func(config)).await?;
                opentelemetry::global::shutdown_tracer_provider();
                result
            }
            None => {
                registry.init();
                tokio::spawn(func(config)).await?
            }
        }
    }
}

fn configure_log_var() {
    if std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .is_none()
    {
        std::env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVES);
    }
}
