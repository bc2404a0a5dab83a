use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use synccast_sdk::endpoints;
use synccast_sdk::{DispatchResponse, EventRequest, EventType, SyncCast, SyncCastConfig, SyncCastError};

#[derive(Parser, Debug)]
#[command(name = "synccast", about = "SyncCast event publishing CLI", version)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    api_base: Option<String>,

    #[arg(long)]
    app_id: Option<String>,

    #[arg(long)]
    app_secret: Option<String>,

    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a topic string from scope, channel and segments.
    Topic {
        #[arg(long)]
        scope: String,
        #[arg(long)]
        channel: String,
        #[arg(long = "extra")]
        extras: Vec<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        wildcard: bool,
        #[arg(long)]
        full_wildcard: bool,
        #[arg(long)]
        require_user: bool,
        #[arg(long)]
        json: bool,
    },
    /// Publish one event through a family service.
    Send {
        #[arg(value_enum)]
        family: Family,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        sender_name: Option<String>,
        #[arg(long)]
        sender_role: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        device: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long = "type")]
        event_type: Option<String>,
    },
    /// Check that the API answers.
    Ping,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Family {
    Message,
    Typing,
    Presence,
    Notification,
    Sync,
}

fn main() {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(err) = run(cli) {
        log::error!("synccast: {err:#}");
        eprintln!("{}", error_report(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let sdk = SyncCast::new(config)?;

    match cli.command {
        Command::Topic {
            scope,
            channel,
            extras,
            user,
            wildcard,
            full_wildcard,
            require_user,
            json,
        } => {
            let mut builder = sdk.topic_builder(scope)?;
            builder.require_user(require_user).channel(&channel)?.extra(extras);
            if let Some(user) = user {
                builder.for_user(user);
            }
            if wildcard {
                builder.wildcard();
            }
            if full_wildcard {
                builder.full_wildcard();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&builder.snapshot())?);
            } else {
                println!("{}", builder.build()?);
            }
        }
        Command::Send {
            family,
            user,
            data,
            scope,
            channel,
            target,
            topic,
            sender_name,
            sender_role,
            platform,
            device,
            location,
            event_type,
        } => {
            let request = EventRequest {
                user_id: user,
                data: parse_data(data.as_deref())?,
                scope: scope.map(Into::into),
                channel,
                topic,
                target,
                sender_name,
                sender_role,
                platform,
                device,
                location,
                event_type: event_type.as_deref().map(str::parse::<EventType>).transpose()?,
                ..EventRequest::default()
            };
            let response = match family {
                Family::Message => sdk.message().send_message(&request)?,
                Family::Typing => sdk.typing().send_typing(&request)?,
                Family::Presence => sdk.presence().send_presence(&request)?,
                Family::Notification => sdk.notification().send_notification(&request)?,
                Family::Sync => sdk.stream().send_update(&request)?,
            };
            print_response(&response)?;
        }
        Command::Ping => {
            let response = sdk.dispatcher().get(endpoints::control::PING, None, None)?;
            print_response(&response)?;
        }
    }
    Ok(())
}

/// File (explicit or default location), then `SYNCCAST_*` env, then flags.
fn load_config(cli: &Cli) -> Result<SyncCastConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncCastConfig::from_path(path)?,
        None => {
            let path = SyncCastConfig::default_path()?;
            if path.exists() {
                SyncCastConfig::from_path(&path)?
            } else {
                log::debug!("synccast: no config at {}, using defaults", path.display());
                SyncCastConfig::default()
            }
        }
    };
    config.apply_env();
    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(app_id) = &cli.app_id {
        config.app_id = Some(app_id.clone());
    }
    if let Some(app_secret) = &cli.app_secret {
        config.app_secret = Some(app_secret.clone());
    }
    Ok(config)
}

fn parse_data(raw: Option<&str>) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).context("--data is not valid json")?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        _ => bail!("--data must be a json object"),
    }
}

fn print_response(response: &DispatchResponse) -> Result<()> {
    match response {
        DispatchResponse::Json(value) => println!("{}", serde_json::to_string_pretty(value)?),
        DispatchResponse::Text(text) => println!("{text}"),
    }
    Ok(())
}

fn error_report(err: &anyhow::Error) -> Value {
    match err.downcast_ref::<SyncCastError>() {
        Some(err) => err.to_json(),
        None => json!({
            "error": "cli_error",
            "message": format!("{err:#}"),
            "details": {},
        }),
    }
}
