use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use strava_auth::config::{self, REFRESH_TOKEN_VAR};
use strava_auth::flow::{self, AuthorizeRequest, OutputOptions};
use strava_auth::prelude::*;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Obtain and refresh Strava API tokens for one athlete
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Environment file with CLIENT_ID, CLIENT_SECRET and the refresh token
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Callback address registered for the Strava app
    #[arg(long, global = true, default_value = DEFAULT_REDIRECT_URI)]
    redirect_uri: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the one-time authorization and exchange the pasted code for tokens
    Authorize {
        #[command(flatten)]
        output: TokenOutput,

        /// Show the consent screen even if access was granted before
        #[arg(long)]
        force_approval: bool,

        /// Open the authorization URL in the default browser
        #[arg(long)]
        open_browser: bool,
    },
    /// Refresh the access token and verify it against the athlete profile
    Refresh {
        #[command(flatten)]
        output: TokenOutput,

        /// Print every field of the athlete profile
        #[arg(long)]
        verbose: bool,

        /// Environment variable holding the stored refresh token
        #[arg(long, default_value = REFRESH_TOKEN_VAR)]
        refresh_token_var: String,
    },
}

#[derive(Args, Debug)]
struct TokenOutput {
    /// Print access and refresh tokens (sensitive, do not share)
    #[arg(long)]
    reveal_tokens: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(kind = ?err.kind(), "run failed");
            eprintln!("error: {err}");
            ExitCode::from(err.kind().exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), AuthError> {
    config::load_env_file(cli.env_file.as_deref())?;
    let credentials = Credentials::from_env()?;
    let stdout = io::stdout();

    match cli.command {
        Command::Authorize {
            output,
            force_approval,
            open_browser,
        } => {
            let oauth = OAuthConfig {
                approval_prompt: if force_approval {
                    ApprovalPrompt::Force
                } else {
                    ApprovalPrompt::Auto
                },
                ..Default::default()
            };
            let api = StravaClient::new(oauth)?;
            let request = AuthorizeRequest {
                redirect_uri: &cli.redirect_uri,
                ..AuthorizeRequest::new(&credentials)
            };

            let mut out = stdout.lock();
            let url = flow::show_authorization_url(&api, &request, &mut out)?;
            if open_browser {
                if let Err(err) = webbrowser::open(&url) {
                    warn!(%err, "could not open browser, use the printed URL");
                }
            }

            let options = OutputOptions {
                reveal_tokens: output.reveal_tokens,
                verbose: false,
            };
            flow::exchange_pasted_code(&api, &request, &mut io::stdin().lock(), &mut out, options)?;
        }
        Command::Refresh {
            output,
            verbose,
            refresh_token_var,
        } => {
            let refresh_token = config::refresh_token_from_env(&refresh_token_var)?;
            let api = StravaClient::new(OAuthConfig::default())?;
            let options = OutputOptions {
                reveal_tokens: output.reveal_tokens,
                verbose,
            };
            refresh_and_verify(&api, &credentials, &refresh_token, &mut stdout.lock(), options)?;
        }
    }

    Ok(())
}
