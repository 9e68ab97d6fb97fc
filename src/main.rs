use clap::Parser;

use teamshook::cmdargs::{Args, SubCommand};
use teamshook::config::{Config, ConfigError};
use teamshook::http::start_server;
use teamshook::logging::TracingSetup;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> color_eyre::Result<()> {
    dotenv::dotenv().ok();
    color_eyre::install().ok();

    let args = Args::parse();
    let config = build_configuration(&args)?;
    let verifier = config.build_verifier()?;

    TracingSetup::with_setup(config, |config| async move {
        match args.command {
            SubCommand::Serve(_) => {
                tracing::info!(
                    identities = verifier.key_store().len(),
                    default_sender = ?verifier.default_sender(),
                    "signing keys loaded"
                );
                start_server(config, verifier).await?
            }
            SubCommand::Sign(sign_args) => {
                let body = sign_args.read_body()?;
                let header = verifier.sign(&sign_args.id, &body)?;
                println!("{}", header);
            }
        }

        Ok(())
    })
    .await
}

fn build_configuration(args: &Args) -> Result<Config, ConfigError> {
    let mut config = Config::from_env()?;

    if let Some(t) = &args.telemetry_url {
        config.set_telemetry_url(t.clone());
    }

    if let Some(k) = &args.signing_keys {
        config.set_signing_keys(k)?;
    }

    if let Some(f) = &args.signing_keys_file {
        config.set_signing_keys_file(f);
    }

    if let Some(s) = &args.default_sender {
        config.set_default_sender(s);
    }

    if let SubCommand::Serve(serve_args) = &args.command {
        if let Some(b) = &serve_args.bind_ip {
            config.set_bind_ip(b);
        }
    }

    config.validate_configuration().map(|_| config)
}
