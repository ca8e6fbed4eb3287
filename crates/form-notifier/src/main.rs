//! AWS Lambda entry point for the form notifier
//!
//! ## Deployment
//!
//! ```bash
//! # Install cargo-lambda
//! cargo install cargo-lambda
//!
//! # Build for ARM64 (30% cheaper)
//! cargo lambda build --release --arm64
//!
//! # Deploy with a function URL
//! cargo lambda deploy --enable-function-url --iam-role arn:aws:iam::ACCOUNT:role/form-notifier-lambda
//! ```

use anyhow::Context;
use form_notifier::{dispatch, NotificationHandler, NotifierConfig};
use lambda_http::{run, service_fn, Error, Request};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Local runs pick up a .env file; in Lambda the variables come from the function config
    dotenvy::dotenv().ok();

    // CloudWatch-optimized logging
    // See: https://docs.aws.amazon.com/lambda/latest/dg/rust-logging.html
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false) // CloudWatch doesn't support ANSI colors
        .with_current_span(false)
        .without_time() // CloudWatch adds ingestion time
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(form_notifier::LOG_DIRECTIVE.parse()?),
        )
        .init();

    let config = NotifierConfig::from_env().context("Invalid form notifier configuration")?;

    info!(
        version = form_notifier::VERSION,
        provider = ?config.provider,
        "Starting form notifier Lambda"
    );

    // Built once per cold start, shared by every invocation
    let dispatcher = dispatch::from_config(&config).await;
    let handler = NotificationHandler::new(config, dispatcher);

    run(service_fn(move |event: Request| {
        let handler = handler.clone();
        async move { handler.handle(event).await }
    }))
    .await
}
