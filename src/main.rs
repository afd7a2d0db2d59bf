#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Restriction lints
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::deref_by_slicing,
    clippy::if_then_some_else_none,
    clippy::undocumented_unsafe_blocks,
    clippy::unnecessary_cast,
    clippy::unnecessary_safety_comment
)]
// False positives
#![allow(clippy::needless_pass_by_value)] // for dptree handlers
// Style
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::module_name_repetitions)]

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use argh::FromArgs;
use metrics_exporter_prometheus::PrometheusBuilder;
use teloxide::dispatching::{Dispatcher, ShutdownToken, UpdateFilterExt};
use teloxide::payloads::AnswerCallbackQuerySetters;
use teloxide::requests::Requester;
use teloxide::types::{CallbackQuery, Message, Update};
use teloxide::Bot;

mod common;
mod config;
mod conversation;
mod formatting;
mod metrics;
mod modules;
mod services;
mod utils;

static VERSION: OnceLock<String> = OnceLock::new();

fn version() -> &'static str {
    VERSION.get().map_or("unknown", String::as_str)
}

/// routerbot
#[derive(FromArgs, PartialEq, Debug)]
struct Args {
    #[argh(option, hidden_help = true, long = "-set-revision")]
    set_revision: Option<String>,

    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Bot(SubCommandBot),
}

/// run the bot
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "bot")]
struct SubCommandBot {
    /// config file
    #[argh(positional)]
    config_file: OsString,
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
    let args: Args = argh::from_env();
    VERSION.get_or_init(|| {
        args.set_revision.unwrap_or_else(|| {
            git_version::git_version!(fallback = "unknown").to_string()
        })
    });
    log::info!("Version {}", version());
    match args.subcommand {
        SubCommand::Bot(c) => run_bot(&c.config_file).await?,
    }
    Ok(())
}

async fn run_bot(config_fpath: &OsStr) -> Result<()> {
    let config: crate::config::Config =
        serde_yaml::from_reader(File::open(config_fpath)?)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(config.server_addr)
        .install()?;
    metrics::register_metrics();
    log::info!("Serving metrics on {}", config.server_addr);

    log::info!(
        "Using model {} ({})",
        config.services.openrouter.model_name,
        config.services.openrouter.model
    );
    if config.services.discord.is_none() {
        log::info!("Discord logging is disabled");
    }

    let bot_env = Arc::new(common::BotEnv::new(config)?);
    let bot = Bot::new(&bot_env.config.telegram.token);

    let mut dispatcher = Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| !msg.chat.is_channel())
                    .branch(modules::basic::command_handler())
                    .branch(modules::basic::unknown_command_handler())
                    .branch(modules::chat::message_handler())
                    .branch(modules::media::message_handler())
                    .endpoint(drop_endpoint),
            )
            .branch(
                Update::filter_callback_query()
                    .branch(modules::copy_buttons::callback_handler())
                    .endpoint(drop_callback_query),
            )
            .endpoint(drop_endpoint),
    )
    .dependencies(dptree::deps![Arc::clone(&bot_env)])
    .build();

    run_signal_handler(dispatcher.shutdown_token().clone());
    dispatcher.dispatch().await;

    Ok(())
}

/// Buttons the bot no longer understands, e.g. from before a restart.
async fn drop_callback_query(
    bot: Bot,
    callback_query: CallbackQuery,
) -> Result<()> {
    log::warn!("Unknown callback data: {:?}", callback_query.data);
    bot.answer_callback_query(&callback_query.id)
        .text("This button is no longer supported.")
        .await?;
    Ok(())
}

async fn drop_endpoint() -> Result<()> {
    Ok(())
}

/// Stop the dispatcher on the first ^C, exit right away on the second.
fn run_signal_handler(shutdown_token: ShutdownToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let Ok(shutdown) = shutdown_token.shutdown() else {
                log::info!("^C received while the dispatcher is not running");
                continue;
            };
            log::info!("^C received, stopping the bot...");
            let forced = tokio::select! {
                () = shutdown => false,
                res = tokio::signal::ctrl_c() => res.is_ok(),
            };
            if forced {
                log::info!("Second ^C received, exiting immediately");
                std::process::exit(0);
            }
            log::info!("Bot stopped");
        }
        log::error!("Failed to listen for ^C");
    });
}
