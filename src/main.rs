use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use golocal::config::ClientConfig;
use golocal::errors::ClientError;
use golocal::models::{Actor, AdminResource, Role, StatusFilter};
use golocal::services::admin::AdminConsole;
use golocal::services::booking_form::BookServiceForm;
use golocal::services::booking_list::{BookingListView, ListPhase, ListScope};
use golocal::services::rating::RatingDialog;
use golocal::services::session::{navigation, GateDecision};
use golocal::services::workflow::{BookingAction, RowControls};
use golocal::state::AppState;

#[derive(Parser)]
#[command(name = "golocal")]
#[command(about = "Go Local marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        username: String,
        #[arg(long, env = "GOLOCAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Nav,
    Bookings {
        #[arg(long, default_value = "ALL", value_parser = parse_filter)]
        status: StatusFilter,
    },
    Act {
        booking_id: String,
        #[arg(value_parser = parse_action)]
        action: BookingAction,
    },
    Rate {
        booking_id: String,
        value: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    Book {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        job: String,
        #[arg(long)]
        location: String,
        /// dd-MM-yyyy HH:mm
        #[arg(long)]
        date: String,
        #[arg(long)]
        amount: String,
    },
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    ClearData,
}

#[derive(Subcommand)]
enum AdminCommand {
    Find {
        #[arg(value_parser = parse_resource)]
        resource: AdminResource,
        key: String,
    },
    Create {
        #[arg(value_parser = parse_resource)]
        resource: AdminResource,
        json: String,
    },
    Update {
        #[arg(value_parser = parse_resource)]
        resource: AdminResource,
        key: String,
        json: String,
    },
}

fn parse_filter(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(s).ok_or_else(|| format!("unknown status: {s}"))
}

fn parse_action(s: &str) -> Result<BookingAction, String> {
    BookingAction::parse(s).ok_or_else(|| format!("unknown action: {s}"))
}

fn parse_resource(s: &str) -> Result<AdminResource, String> {
    AdminResource::parse(s).ok_or_else(|| format!("unknown resource: {s}"))
}

fn scope_for(actor: Option<&Actor>) -> ListScope {
    match actor.map(|a| a.role) {
        Some(Role::Provider) => ListScope::Provider,
        _ => ListScope::Customer,
    }
}

fn print_list(view: &BookingListView) {
    match view.phase() {
        ListPhase::LoginRequired(msg) => {
            println!("{msg}");
            return;
        }
        ListPhase::Failed(msg) => println!("! {msg}"),
        _ => {}
    }
    if let Some(msg) = view.action_error() {
        println!("! {msg}");
    }
    if view.rows().is_empty() {
        println!("No bookings.");
        return;
    }

    for row in view.rows() {
        let b = &row.booking;
        let counterpart = match view.scope() {
            ListScope::Customer => b.provider.display_name(),
            ListScope::Provider => b.customer.display_name(),
        };
        let controls = match &row.controls {
            RowControls::Actions(actions) => actions
                .iter()
                .map(|a| a.label())
                .collect::<Vec<_>>()
                .join(" | "),
            RowControls::Rated(value) => format!("Rated {value}/5"),
            RowControls::None => String::new(),
        };
        println!(
            "{:<10} {:<10} {:<18} {:<18} {:<17} {}",
            b.booking_id,
            b.status,
            b.service.name,
            counterpart,
            b.date_time.as_deref().unwrap_or("-"),
            controls
        );
    }
}

/// Prints the banner for `err` and drops the local session if the backend
/// no longer accepts it.
fn report(state: &mut AppState, err: &ClientError) -> anyhow::Result<ExitCode> {
    println!("{}", err.user_message());
    if matches!(err, ClientError::Unauthorized) {
        state.session.invalidate()?;
    }
    Ok(ExitCode::FAILURE)
}

/// The action went through but the refetch found the session gone.
fn drop_lost_session(state: &mut AppState, view: &BookingListView) -> anyhow::Result<()> {
    if matches!(view.phase(), ListPhase::LoginRequired(_)) {
        state.session.invalidate()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    tracing::debug!("using backend {}", config.api_url);

    let mut state = AppState::from_config(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            let result = state
                .session
                .login(state.api.as_ref(), &username, &password)
                .await
                .map(|actor| (actor.username.clone(), actor.role));
            match result {
                Ok((username, role)) => println!("Logged in as {username} ({role})."),
                Err(e) => return report(&mut state, &e),
            }
        }
        Commands::Logout => {
            if let Some(e) = state.session.logout(state.api.as_ref()).await? {
                println!("Logged out locally; the server said: {}", e.user_message());
            } else {
                println!("Logged out.");
            }
        }
        Commands::Whoami => match state.session.current_actor() {
            Some(actor) => println!("{} ({})", actor.username, actor.role),
            None => println!("Not logged in."),
        },
        Commands::Nav => {
            for item in navigation(state.session.current_actor()) {
                println!("{:<18} {}", item.label, item.path);
            }
        }
        Commands::Bookings { status } => {
            let actor = state.session.current_actor().cloned();
            let scope = scope_for(actor.as_ref());
            if let GateDecision::Redirect(dashboard) = state.session.gate(scope.required_role()) {
                println!("No booking list here; your dashboard is {}.", dashboard.path());
                return Ok(ExitCode::FAILURE);
            }

            let mut view = BookingListView::new(scope, status);
            let result = view.refresh(state.api.as_ref(), actor.as_ref()).await;
            print_list(&view);
            if let Err(e) = result {
                if matches!(e, ClientError::Unauthorized) {
                    state.session.invalidate()?;
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Act { booking_id, action } => {
            let actor = state.session.current_actor().cloned();
            let mut view = BookingListView::new(scope_for(actor.as_ref()), StatusFilter::All);
            let api = state.api.as_ref();

            let result = match view.refresh(api, actor.as_ref()).await {
                Ok(()) => view.perform(api, actor.as_ref(), &booking_id, action).await,
                Err(e) => Err(e),
            };
            print_list(&view);
            if let Err(e) = result {
                if matches!(e, ClientError::Unauthorized) {
                    state.session.invalidate()?;
                }
                return Ok(ExitCode::FAILURE);
            }
            drop_lost_session(&mut state, &view)?;
        }
        Commands::Rate {
            booking_id,
            value,
            comment,
        } => {
            let actor = state.session.current_actor().cloned();
            let mut view = BookingListView::new(scope_for(actor.as_ref()), StatusFilter::All);
            let api = state.api.as_ref();
            if let Err(e) = view.refresh(api, actor.as_ref()).await {
                return report(&mut state, &e);
            }

            let Some(row) = view.find(&booking_id) else {
                println!("Booking {booking_id} is not in your list.");
                return Ok(ExitCode::FAILURE);
            };
            let booking = row.booking.clone();

            let mut dialog = RatingDialog::new();
            let role = actor.as_ref().map_or(Role::Customer, |a| a.role);
            if let Err(e) = dialog.open(&booking, role) {
                return report(&mut state, &e);
            }
            dialog.set_value(value);
            if let Some(comment) = comment {
                dialog.set_comment(&comment);
            }
            if let Err(e) = dialog.submit(api, actor.as_ref(), &mut view).await {
                return report(&mut state, &e);
            }
            print_list(&view);
            drop_lost_session(&mut state, &view)?;
        }
        Commands::Book {
            provider,
            job,
            location,
            date,
            amount,
        } => {
            let mut form = BookServiceForm::for_provider(&provider, &job);
            form.location = location;
            form.date_time = date;
            form.amount = amount;

            let actor = state.session.current_actor().cloned();
            if let Err(e) = form.submit(state.api.as_ref(), actor.as_ref()).await {
                return report(&mut state, &e);
            }
            println!("{}", form.notice().unwrap_or_default());
        }
        Commands::Admin { command } => {
            let actor = state.session.current_actor().cloned();
            let api = state.api.as_ref();
            let mut console = AdminConsole::new();

            let result = match command {
                AdminCommand::Find { resource, key } => {
                    console.find(api, actor.as_ref(), resource, &key).await.cloned()
                }
                AdminCommand::Create { resource, json } => {
                    let body = serde_json::from_str(&json)?;
                    console.create(api, actor.as_ref(), resource, &body).await.cloned()
                }
                AdminCommand::Update {
                    resource,
                    key,
                    json,
                } => {
                    let body = serde_json::from_str(&json)?;
                    console
                        .update(api, actor.as_ref(), resource, &key, &body)
                        .await
                        .cloned()
                }
            };
            match result {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => return report(&mut state, &e),
            }
        }
        Commands::ClearData => {
            let removed = state.session.clear_local_data()?;
            println!("Cleared {removed} local entries.");
        }
    }

    Ok(ExitCode::SUCCESS)
}
