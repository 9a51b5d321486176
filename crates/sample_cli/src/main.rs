//! Command-line handler over the sample service.
//!
//! # Responsibility
//! - Decode arguments and JSON bodies, then call validation and the service.
//! - Print the payload on success, or the structured error envelope.
//!
//! # Invariants
//! - Every failure path prints an `ErrorResponse` and exits with status 1.

use clap::{Parser, Subcommand};
use log::error;
use sample_core::error::message::DEFAULT_LANGUAGE;
use sample_core::{
    init_from_config, validate, AppConfig, Database, ErrorResponse, PageRequest, SampleError,
    SampleId, SampleRequest, SampleService, SeekRequest, SqliteSampleRepository,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sample-cli", version, about = "Sample aggregate CRUD handler")]
struct Cli {
    /// TOML configuration file; defaults plus environment otherwise.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Language for error messages and translated reads.
    #[arg(long, value_name = "CODE", global = true, default_value = DEFAULT_LANGUAGE)]
    language: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a sample from a JSON body.
    Create {
        #[arg(long, value_name = "USER_ID")]
        user: String,
        #[arg(long, value_name = "JSON")]
        body: String,
    },
    /// Fetches one sample.
    Get {
        id: SampleId,
        /// Replace name and description with the `--language` translation.
        #[arg(long)]
        translate: bool,
    },
    /// Replaces a sample and its translations.
    Update {
        id: SampleId,
        #[arg(long, value_name = "N")]
        version: i32,
        #[arg(long, value_name = "USER_ID")]
        user: String,
        #[arg(long, value_name = "JSON")]
        body: String,
    },
    /// Soft-deletes a sample.
    Delete {
        id: SampleId,
        #[arg(long, value_name = "N")]
        version: i32,
        #[arg(long, value_name = "USER_ID")]
        user: String,
    },
    /// Lists samples with offset pagination.
    List {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        size: Option<i64>,
    },
    /// Lists samples with keyset pagination.
    Seek {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        size: Option<i64>,
        #[arg(long = "created-at", value_name = "EPOCH_MS")]
        created_at: Option<i64>,
        #[arg(long = "after-id", value_name = "ID")]
        after_id: Option<SampleId>,
    },
}

/// Handler failure, rendered as an error envelope.
enum Failure {
    Body,
    Service(SampleError),
}

impl From<SampleError> for Failure {
    fn from(value: SampleError) -> Self {
        Self::Service(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let language = cli.language.clone();

    match run(cli) {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(failure) => {
            let response = match failure {
                Failure::Body => ErrorResponse::invalid_body(&language),
                Failure::Service(err) => err.to_response(&language),
            };
            println!("{}", render(&response).unwrap_or_default());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Option<String>, Failure> {
    let config = load_config(cli.config.as_deref())?;
    if let Err(err) = init_from_config(&config.logging) {
        eprintln!("logging disabled: {err}");
    }
    let db = Database::open(&config.database).map_err(SampleError::from)?;
    let service = SampleService::new(SqliteSampleRepository::new(db));

    match cli.command {
        Command::Create { user, body } => {
            let request = validate(decode_body(&body)?)?;
            render(&service.create(&request, &user)?).map(Some)
        }
        Command::Get { id, translate } => {
            let sample = if translate {
                service.get_translated(id, &cli.language)?
            } else {
                service.get(id)?
            };
            render(&sample).map(Some)
        }
        Command::Update {
            id,
            version,
            user,
            body,
        } => {
            let request = validate(decode_body(&body)?)?;
            render(&service.update(id, version, &request, &user)?).map(Some)
        }
        Command::Delete { id, version, user } => {
            service.delete(&user, id, version)?;
            Ok(None)
        }
        Command::List { query, page, size } => {
            let page = PageRequest::with_limits(
                page,
                size,
                config.pagination.default_size,
                config.pagination.max_size,
            );
            render(&service.list(query.as_deref(), &page)?).map(Some)
        }
        Command::Seek {
            query,
            size,
            created_at,
            after_id,
        } => {
            let request = SeekRequest::with_limits(
                size,
                created_at,
                after_id,
                config.pagination.default_size,
                config.pagination.max_size,
            );
            render(&service.seek(query.as_deref(), &request)?).map(Some)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, Failure> {
    let loaded = match path {
        Some(path) => AppConfig::load(path),
        None => AppConfig::from_env(),
    };
    loaded.map_err(|err| {
        eprintln!("configuration error: {err}");
        Failure::Service(SampleError::Internal)
    })
}

fn decode_body(body: &str) -> Result<SampleRequest, Failure> {
    serde_json::from_str(body).map_err(|_| Failure::Body)
}

fn render<T: Serialize>(value: &T) -> Result<String, Failure> {
    serde_json::to_string_pretty(value).map_err(|err| {
        error!("event=render module=cli status=error error_code=serialize_failed error={err}");
        Failure::Service(SampleError::Internal)
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_body, Cli, Command, Failure};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_update_with_global_language() {
        let cli = Cli::parse_from([
            "sample-cli",
            "update",
            "5",
            "--version",
            "2",
            "--user",
            "alice",
            "--body",
            "{}",
            "--language",
            "es",
        ]);
        assert_eq!(cli.language, "es");
        assert!(matches!(
            cli.command,
            Command::Update { id: 5, version: 2, .. }
        ));
    }

    #[test]
    fn undecodable_body_is_a_body_failure() {
        assert!(matches!(decode_body("not json"), Err(Failure::Body)));
        assert!(decode_body(r#"{"name":"Widget"}"#).is_ok());
    }
}
