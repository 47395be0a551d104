#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Email service: sends templated messages over SMTP, driven through HTTP

use anyhow::Result;
use clap::Parser;
use email_service::{
    domain::{config::ConfigParams, email::EmailController},
    infrastructure::{
        email::{
            smtp::{SmtpConfig, SmtpMailerFactory},
            EmailConfig,
        },
        http::{HttpServer, HttpServerConfig},
    },
};
use tracing::info;

const CORRELATION_ID: &str = "email-service";

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// Message defaults and options
    #[clap(flatten)]
    pub email: EmailConfig,

    /// The SMTP connection details
    #[clap(flatten)]
    pub smtp: SmtpConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ConfigParams::from(&args.email);
    config.append(&ConfigParams::from(&args.smtp));

    let mut controller = EmailController::new(SmtpMailerFactory::new());
    controller.configure(&config)?;
    controller.open(CORRELATION_ID).await?;

    info!(port = args.server.http_port, "starting email service");

    let result = HttpServer::new(controller.clone(), args.server)
        .await?
        .run()
        .await;

    controller.close(CORRELATION_ID).await;

    result
}
