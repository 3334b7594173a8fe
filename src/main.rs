use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::{interval, sleep};

use heraldbot::broadcast::{BroadcastConfig, BroadcastManager};
use heraldbot::cli::{Cli, Commands};
use heraldbot::core::{config, init_logger, log_broadcast_configuration};
use heraldbot::storage::{FileRoster, Roster};
use heraldbot::telegram::notifications::notify_admin_startup;
use heraldbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramMessenger};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, roster, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler to catch panics in dispatcher
    // This allows us to log the panic and continue working instead of terminating
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env before anything reads them
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    // Dispatch to appropriate command
    match cli.command {
        Some(Commands::Run) => {
            log::info!("Running bot in normal mode");
            run_bot().await
        }
        Some(Commands::RunStaging) => {
            log::info!("Running bot in staging mode");
            // Load staging environment variables
            if let Err(e) = dotenvy::from_filename(".env.staging") {
                log::warn!("Failed to load .env.staging: {}", e);
            }
            run_bot().await
        }
        Some(Commands::CheckConfig) => run_check_config().await,
        None => {
            // No command specified - default to running the bot
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

/// Validate configuration and the roster file without starting the bot
async fn run_check_config() -> Result<()> {
    println!("🔧 Heraldbot Configuration Check");
    println!("================================");

    let bot_token = config::BOT_TOKEN.to_string();
    if bot_token.is_empty() {
        println!("❌ Bot token not configured (set BOT_TOKEN or TELOXIDE_TOKEN)");
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }
    let token_preview: String = bot_token.chars().take(8).collect();
    println!("✅ Bot token is configured: {}...", token_preview);

    match config::BOT_API_URL.as_deref() {
        Some(api_url) => println!("✅ Custom Bot API URL: {}", api_url),
        None => println!("✅ Bot API: api.telegram.org (default)"),
    }

    let admin_ids = config::admin::all_admin_ids();
    if admin_ids.is_empty() {
        println!("⚠️ No admins configured (set ADMIN_IDS); broadcast commands will be rejected");
    } else {
        println!("✅ Admins configured: {}", admin_ids.len());
    }

    println!(
        "✅ Broadcast tuning: {} in flight | {}ms pacing | {}ms progress edits | {}s send timeout",
        config::broadcast::MAX_IN_FLIGHT,
        config::broadcast::PACING_DELAY_MS,
        config::broadcast::PROGRESS_EDIT_INTERVAL_MS,
        config::broadcast::SEND_TIMEOUT_SECS,
    );

    let roster_path = config::ROSTER_PATH.as_str();
    match FileRoster::load(roster_path).await {
        Ok(roster) => {
            let count = roster.count().await?;
            println!("✅ Roster file {}: {} subscriber(s)", roster_path, count);
        }
        Err(e) => {
            println!("❌ Roster file {} is unreadable: {}", roster_path, e);
            return Err(e.into());
        }
    }

    if *config::metrics::ENABLED {
        println!("✅ Metrics server enabled on port {}", *config::metrics::PORT);
    } else {
        println!("✅ Metrics collection disabled (METRICS_ENABLED=false)");
    }

    println!();
    println!("🎉 Everything is ready! Run the bot with:");
    println!("   heraldbot run");
    Ok(())
}

/// Run the Telegram bot
async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");

    // Initialize metrics registry
    heraldbot::core::metrics::init_metrics();

    // Log broadcast configuration at startup
    log_broadcast_configuration();

    // Create bot instance
    let bot = create_bot()?;

    let me = bot.get_me().await?;
    let bot_username = me.username.as_deref();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, me.id);

    // Set up the public command menu
    setup_bot_commands(&bot).await?;

    // Notify admins about bot startup/restart
    notify_admin_startup(&bot, bot_username).await;

    // Load the broadcast roster
    let roster: Arc<dyn Roster> = Arc::new(FileRoster::load(config::ROSTER_PATH.as_str()).await?);
    heraldbot::core::metrics::set_roster_size(roster.count().await?);

    let manager = Arc::new(BroadcastManager::new(BroadcastConfig::default()));
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));

    // Start metrics HTTP server if enabled
    if *config::metrics::ENABLED {
        let metrics_port = *config::metrics::PORT;
        log::info!("Starting metrics server on port {}", metrics_port);

        tokio::spawn(async move {
            if let Err(e) = heraldbot::core::metrics_server::start_metrics_server(metrics_port).await {
                log::error!("Metrics server error: {}", e);
            }
        });

        // Start background task to update bot uptime counter every 60 seconds
        tokio::spawn(async {
            let mut interval = interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                heraldbot::core::metrics::BOT_UPTIME_SECONDS.inc_by(60.0);
            }
        });
    } else {
        log::info!("Metrics collection disabled (METRICS_ENABLED=false)");
    }

    // Sweep finished jobs out of the registry every hour
    let manager_purge = Arc::clone(&manager);
    tokio::spawn(async move {
        let mut interval = interval(config::registry::purge_interval());
        loop {
            interval.tick().await;
            let removed = manager_purge.purge_finished().await;
            if removed > 0 {
                log::info!("Purged {} finished broadcast job(s) from the registry", removed);
            }
        }
    });

    // Create handler dependencies for the modular schema
    let handler_deps = HandlerDeps::new(roster, manager, messenger);

    // Create the dispatcher handler tree using the modular schema
    let handler = schema(handler_deps);

    let init_elapsed = bot_init_start.elapsed();
    log::info!("Starting bot in long polling mode");
    log::info!("================================================");
    log::info!("🎉 Bot initialization complete in {:.2}s", init_elapsed.as_secs_f64());
    log::info!("📡 Ready to receive updates!");
    log::info!("================================================");

    let mut retry_count: u32 = 0;
    let max_retries = config::dispatcher::MAX_RESTARTS;

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Create a new dispatcher in a separate task to isolate panics
        // "TX is dead" panics will be caught via the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::prelude::*;
            use teloxide::update_listeners::Polling;

            // Create polling listener that drops pending updates on start
            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                // Dispatcher finished normally
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                // Task was cancelled or panicked
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);

                    if retry_count < max_retries {
                        retry_count += 1;
                        heraldbot::core::metrics::DISPATCHER_RESTARTS_TOTAL.inc();
                        log::info!(
                            "Retrying dispatcher connection after panic (attempt {}/{})...",
                            retry_count,
                            max_retries
                        );
                        sleep(config::dispatcher::restart_delay()).await;
                    } else {
                        log::error!("Max retries reached after panic. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }
    }

    Ok(())
}
