use std::path::PathBuf;

use clap::Parser;

/// Verify HMAC-signed webhook messages
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Args {
    /// Telemetry URL (disabled as default)
    #[clap(long)]
    pub telemetry_url: Option<String>,

    /// Signing keys, as `id=base64key,id2=base64key2`
    #[clap(long)]
    pub signing_keys: Option<String>,

    /// Signing keys JSON file, as `{"id": "base64key"}`
    #[clap(long)]
    pub signing_keys_file: Option<PathBuf>,

    /// Sender identity to use when a request has none (requests without one are rejected as default)
    #[clap(long)]
    pub default_sender: Option<String>,

    /// Command
    #[clap(subcommand)]
    pub command: SubCommand,
}

#[derive(Parser, Debug)]
pub enum SubCommand {
    /// Run server
    Serve(ServeCommand),
    /// Print the Authorization header value for a message body
    Sign(SignCommand),
}

#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// Bind IP (127.0.0.1:3000 as default)
    #[clap(long)]
    pub bind_ip: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SignCommand {
    /// Sender identity
    #[clap(long)]
    pub id: String,

    /// Message body
    #[clap(long, conflicts_with = "body-file", required_unless_present = "body-file")]
    pub body: Option<String>,

    /// File containing the message body
    #[clap(name = "body-file", long = "body-file")]
    pub body_file: Option<PathBuf>,
}

impl SignCommand {
    pub fn read_body(&self) -> std::io::Result<Vec<u8>> {
        match (&self.body, &self.body_file) {
            (Some(body), _) => Ok(body.as_bytes().to_vec()),
            (None, Some(path)) => std::fs::read(path),
            (None, None) => Ok(Vec::new()),
        }
    }
}
