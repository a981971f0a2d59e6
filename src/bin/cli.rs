use srms_admin::config::{self, AdminSettings};
use srms_admin::live::{LiveFeed, PushChannel, SocketIoChannel};
use srms_admin::session::{self, LogNavigator};
use srms_admin::{AdminClient, Args, Command, EventKind, FormData, HttpTransport, SurfaceId, View};

use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;

fn load_settings(args: &Args) -> AdminSettings {
    let mut settings = match &args.config {
        Some(path) => config::load_settings_from(path),
        None => config::load_settings(),
    };
    args.apply_to(&mut settings);
    settings
}

async fn run(args: Args) -> srms_admin::Result<()> {
    let settings = load_settings(&args);

    if let Command::Controls = args.command {
        let registry = srms_admin::HandlerRegistry::with_default_bindings();
        for (control, kind, action) in registry.bindings() {
            println!("{:<24} {:<7} {:?} -> {}", control, kind, action, action.surface());
        }
        return Ok(());
    }

    if let Command::SaveSettings = args.command {
        return match &args.config {
            Some(path) => config::save_settings_to(path, &settings),
            None => config::save_settings(&settings),
        };
    }

    let transport = Arc::new(HttpTransport::new(&settings)?);
    let navigator = Arc::new(LogNavigator::new());
    let client = AdminClient::new(transport.clone(), View::stdout(), navigator);

    if settings.has_credentials() {
        let response = session::login(transport.as_ref(), &settings.username, &settings.password).await?;
        if !response.ok {
            warn!("Continuing without a session: {}", response.data);
        }
    }

    match args.command {
        Command::Click { control } => {
            client
                .trigger(&control, EventKind::Click, &FormData::new())
                .await?
                .into_result()?;
        }
        Command::Submit { form, fields } => {
            let mut data = FormData::new();
            for field in &fields {
                let (name, value) = FormData::parse_assignment(field)?;
                data.insert(name, value);
            }
            client.trigger(&form, EventKind::Submit, &data).await?.into_result()?;
        }
        Command::Logout => client.logout().await,
        Command::Watch => {
            let mut channel = SocketIoChannel::new(&settings)?;
            info!("Following live events at {}", channel.url());
            LiveFeed::start(&mut channel, client.view().surface(SurfaceId::Events)).await?;

            let interrupted = tokio::select! {
                _ = tokio::signal::ctrl_c() => true,
                _ = channel.closed() => false,
            };
            if interrupted {
                info!("Interrupted, closing live events");
                channel.disconnect().await;
            } else {
                warn!("Live event feed ended");
            }
        }
        Command::Controls | Command::SaveSettings => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Configure logging to show only srms_admin logs, filtering out noisy library logs
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn) // Default level for all modules
        .filter_module("srms_admin", log::LevelFilter::Debug) // Our app logs
        .filter_module("reqwest", log::LevelFilter::Warn) // HTTP client
        .filter_module("tungstenite", log::LevelFilter::Warn) // Websocket
        .parse_default_env()
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
