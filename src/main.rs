use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::BufReader;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lumen::tools::{qualified_name, LIGHTS_PLUGIN_NAME};
use lumen::{
    run_chat_loop, ApiKeyAuth, ChatOptions, ChatSession, Config, GeminiClient, Kernel,
    LightRegistry, LightUpdate, LightsPlugin, SwitchPlugin,
};

/// Lumen - mock smart lights and a Gemini chat loop
#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/lumen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with the model (default)
    Chat(ChatArgs),

    /// Inspect or change the demo lights
    #[command(subcommand)]
    Lights(LightsCommand),
}

#[derive(clap::Args, Debug, Default)]
struct ChatArgs {
    /// Model name, overrides the config file
    #[arg(long)]
    model: Option<String>,

    /// Do not offer plugin functions to the model
    #[arg(long)]
    no_functions: bool,

    /// Also expose the light registry plugin to the model
    #[arg(long)]
    with_registry: bool,
}

#[derive(Subcommand, Debug)]
enum LightsCommand {
    /// Print every light
    List,

    /// Apply one update and print the result
    Set {
        #[arg(long)]
        id: u32,

        /// Switch the light on
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Switch the light off
        #[arg(long)]
        off: bool,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        brightness: Option<u8>,

        /// Color as six hex digits, e.g. FF8800
        #[arg(long)]
        hex: Option<String>,
    },
}

fn init_logging(debug: bool) -> Result<()> {
    let log_file = std::fs::File::create(std::env::temp_dir().join("lumen.log"))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();
    Ok(())
}

async fn chat(config: &Config, args: ChatArgs) -> Result<()> {
    let auth = ApiKeyAuth::resolve(config.gemini.api_key.as_deref(), |name| {
        std::env::var(name).ok()
    })?;
    let model = args.model.unwrap_or_else(|| config.gemini.model.clone());

    let client = GeminiClient::new(auth.api_key(), model, config.gemini.timeout())?
        .with_base_url(config.gemini.base_url.as_str());
    tracing::info!("Starting chat with {}", client.model());

    let mut kernel = Kernel::new();
    kernel.add_plugin(Box::new(SwitchPlugin::new()))?;
    if args.with_registry {
        kernel.add_plugin(Box::new(LightsPlugin::new(LightRegistry::demo())))?;
    }

    let mut options = ChatOptions::from(&config.chat);
    if args.no_functions {
        options.function_calling = false;
    }

    let mut session = ChatSession::new(Arc::new(client))
        .with_kernel(kernel)
        .with_options(options);

    run_chat_loop(&mut session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

fn lights(command: LightsCommand) -> Result<()> {
    let mut kernel = Kernel::new();
    kernel.add_plugin(Box::new(LightsPlugin::new(LightRegistry::demo())))?;

    match command {
        LightsCommand::List => {
            let lights =
                kernel.invoke(&qualified_name(LIGHTS_PLUGIN_NAME, "get_lights"), json!({}))?;
            println!("{}", serde_json::to_string_pretty(&lights)?);
        }
        LightsCommand::Set {
            id,
            on,
            off,
            brightness,
            hex,
        } => {
            let update = LightUpdate {
                id,
                is_on: (on || off).then_some(on),
                brightness,
                hex,
            };
            let updated = kernel.invoke(
                &qualified_name(LIGHTS_PLUGIN_NAME, "change_state"),
                serde_json::to_value(update)?,
            )?;
            match updated {
                Value::Null => println!("Light {} not found", id),
                light => println!("{}", serde_json::to_string_pretty(&light)?),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let args = Args::parse();

    let config_path = Config::source_path(args.config.as_deref());
    let config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };

    init_logging(args.debug || config.general.debug)?;
    match &config_path {
        Some(path) => tracing::debug!("Loaded config from {}", path.display()),
        None => tracing::debug!("No config file, using defaults"),
    }

    match args.command {
        Some(Command::Lights(command)) => lights(command),
        Some(Command::Chat(chat_args)) => chat(&config, chat_args).await,
        None => chat(&config, ChatArgs::default()).await,
    }
}
