pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod handlers;
#[cfg(feature = "live")]
pub mod live;
pub mod requests;
pub mod session;
pub mod view;

pub use client::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use config::AdminSettings;
pub use error::{AdminError, Result};
pub use form::FormData;
pub use handlers::{Action, AdminClient, Dispatch, Disposition, EventKind, HandlerRegistry};
pub use view::{Surface, SurfaceId, View};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

/// Command-line admin panel for the Smart Restaurant Management System
#[cfg(feature = "cli")]
#[derive(Parser, Debug, Clone)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = "SRMS admin client",
    long_about = None,
    after_help = "Examples:\n\
    \n\
    List the menu:\n\
    srms-admin --host http://127.0.0.1:5013 click refreshMenu\n\
    \n\
    Add a menu item after signing in:\n\
    srms-admin -u admin -p <SECRET> submit addMenuForm -f name=Soup -f category=Starters -f price=4.5\n\
    \n\
    Follow live events:\n\
    srms-admin watch\n\
    "
)]
pub struct Args {
    /// Base URL of the SRMS server
    #[arg(long, help = "Base URL of the SRMS server, like http://127.0.0.1:5013")]
    pub host: Option<String>,

    /// Basic auth string. Format: user:pass
    #[arg(long, help = "Basic Auth credentials for a proxy in front of the server")]
    pub basic_auth: Option<String>,

    /// Username used to sign in before running the command
    #[arg(short, long, help = "Sign in as this user before running the command")]
    pub username: Option<String>,

    /// Password for --username
    #[arg(short, long, help = "Password for --username")]
    pub password: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, help = "HTTP request timeout in seconds (no timeout by default)")]
    pub timeout: Option<u64>,

    /// Settings file (default: ~/.srms/admin_config.json)
    #[arg(long, help = "Path to the settings file")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Press a button of the panel, e.g. refreshMenu
    Click {
        control: String,
    },
    /// Submit a form of the panel, e.g. addMenuForm -f name=Soup -f price=4.5
    Submit {
        form: String,
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
    /// Follow the live event feed until interrupted
    Watch,
    /// End the session
    Logout,
    /// List the controls that can be clicked or submitted
    Controls,
    /// Write the effective settings to the settings file
    SaveSettings,
}

#[cfg(feature = "cli")]
impl Args {
    /// Overlay command-line values on top of the file settings
    pub fn apply_to(&self, settings: &mut AdminSettings) {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(basic_auth) = &self.basic_auth {
            settings.basic_auth = basic_auth.clone();
        }
        if let Some(username) = &self.username {
            settings.username = username.clone();
        }
        if let Some(password) = &self.password {
            settings.password = password.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = Some(timeout);
        }
    }
}
