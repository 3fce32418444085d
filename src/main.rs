mod client;
mod render;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use calapi_core::CustomStatus;
use client::ApiClient;
use render::Render;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8099";

#[derive(Parser)]
#[command(name = "calapi")]
#[command(about = "Query a calapi server for today's events, the current event and custom statuses")]
struct Cli {
    /// Base URL of the calapi server
    #[arg(long, global = true, env = "CALAPI_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show calendars, the current event or a custom status
    Get {
        #[command(subcommand)]
        what: GetCommand,
    },
    /// Set a custom status
    Set {
        #[command(subcommand)]
        what: SetCommand,
    },
    /// Clear a custom status or refresh the calendar cache
    Clear {
        #[command(subcommand)]
        what: ClearCommand,
    },
}

#[derive(Subcommand)]
enum GetCommand {
    /// Today's events, all calendars unless a name is given
    Calendar {
        name: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Output::Text)]
        out: Output,
    },
    /// The event happening right now
    Current {
        name: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Output::Text)]
        out: Output,
    },
    /// The custom status of a calendar
    Status {
        #[arg(short, long)]
        calendar: String,

        #[arg(short, long, value_enum, default_value_t = Output::Text)]
        out: Output,
    },
}

#[derive(Subcommand)]
enum SetCommand {
    /// Pin a custom status to a calendar
    Status {
        /// Status title, e.g. "Do not disturb"
        title: String,

        #[arg(short, long)]
        calendar: String,

        /// Description of the custom status
        #[arg(short = 't', long, default_value = "")]
        description: String,

        /// Icon to use in the custom status
        #[arg(short, long, default_value = "warning_icon")]
        icon: String,

        /// Icon size to display in the custom status
        #[arg(long, default_value_t = 196)]
        icon_size: i32,
    },
}

#[derive(Subcommand)]
enum ClearCommand {
    /// Remove the custom status of a calendar
    Status {
        #[arg(short, long)]
        calendar: String,
    },
    /// Re-fetch every calendar source now
    Calendar,
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Json,
}

fn print<T: Render + Serialize>(value: &T, out: Output) -> Result<()> {
    match out {
        Output::Text => println!("{}", value.render(Utc::now())),
        Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Get { what } => match what {
            GetCommand::Calendar { name, out } => {
                print(&client.calendar(name.as_deref()).await?, out)
            }
            GetCommand::Current { name, out } => {
                print(&client.current(name.as_deref()).await?, out)
            }
            GetCommand::Status { calendar, out } => print(&client.status(&calendar).await?, out),
        },
        Commands::Set {
            what:
                SetCommand::Status {
                    title,
                    calendar,
                    description,
                    icon,
                    icon_size,
                },
        } => {
            let status = CustomStatus {
                title,
                description,
                icon,
                icon_size,
            };
            let stored = client.set_status(&calendar, &status).await?;
            println!("Custom status set for {}: {}", calendar, stored.render(Utc::now()));
            Ok(())
        }
        Commands::Clear { what } => match what {
            ClearCommand::Status { calendar } => {
                client.clear_status(&calendar).await?;
                println!("Custom status cleared for {}", calendar);
                Ok(())
            }
            ClearCommand::Calendar => {
                let refreshed = client.refresh().await?;
                let at = refreshed.last_updated.with_timezone(&chrono::Local);
                println!("Calendar cache refreshed at {}", at.format("%H:%M:%S"));
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_status_defaults() {
        let cli = Cli::try_parse_from(["calapi", "set", "status", "Focus", "-c", "room-a"]).unwrap();
        let Commands::Set {
            what:
                SetCommand::Status {
                    title,
                    calendar,
                    description,
                    icon,
                    icon_size,
                },
        } = cli.command
        else {
            panic!("expected set status");
        };

        assert_eq!(title, "Focus");
        assert_eq!(calendar, "room-a");
        assert_eq!(description, "");
        assert_eq!(icon, "warning_icon");
        assert_eq!(icon_size, 196);
    }

    #[test]
    fn get_calendar_defaults_to_all_and_text() {
        let cli = Cli::try_parse_from(["calapi", "get", "calendar", "--server", "http://cal:9000"])
            .unwrap();
        assert_eq!(cli.server, "http://cal:9000");
        assert!(matches!(
            cli.command,
            Commands::Get {
                what: GetCommand::Calendar {
                    name: None,
                    out: Output::Text
                }
            }
        ));
    }

    #[test]
    fn status_requires_a_calendar() {
        assert!(Cli::try_parse_from(["calapi", "clear", "status"]).is_err());
    }
}
