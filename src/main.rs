use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use profile_sync::api::{PreferencesUpdate, ProfileUpdate, UserProfile};
use profile_sync::app::{App, Components};
use profile_sync::config::Config;
use profile_sync::logging;
use profile_sync::offline::ConnectivitySignal;
use profile_sync::service::{PreferenceOutcome, ProfileService};

#[derive(Parser, Debug)]
#[command(name = "profile-sync")]
#[command(about = "Offline-aware profile and settings sync")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/profile-sync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Start without connectivity; writes are queued
  #[arg(long)]
  offline: bool,

  /// Keep everything in memory for this run
  #[arg(long)]
  ephemeral: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load the profile (cache first when offline)
  Fetch,
  /// Update profile fields
  Update {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birthday: Option<String>,
  },
  /// Change notification preferences
  Prefs {
    #[arg(long)]
    email: Option<bool>,
    #[arg(long)]
    push: Option<bool>,
  },
  /// Toggle dark mode
  Theme,
  /// Upload a new profile picture
  Upload { uri: String },
  /// Record or show the notification permission
  Permission {
    #[command(subcommand)]
    action: PermissionAction,
  },
  /// Go online and replay queued writes
  Sync,
  /// Show state, queue and storage usage
  Status,
  /// Wipe all local data and reload the default profile
  Reset,
}

#[derive(Subcommand, Debug)]
enum PermissionAction {
  Grant,
  Deny,
  Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.log)?;

  let signal = Arc::new(ConnectivitySignal::new(!args.offline));
  let components = Components::from_config(&config, args.ephemeral, signal.clone())?;
  let app = App::start(&config, components)?;

  let result = run(app.service(), &signal, args.command).await;
  app.shutdown()?;
  result
}

async fn run(service: &ProfileService, signal: &ConnectivitySignal, command: Command) -> Result<()> {
  match command {
    Command::Fetch => {
      let result = service.fetch_user().await?;
      println!("source: {}", result.source);
      print_profile(&result.data);
    }
    Command::Update {
      name,
      email,
      bio,
      birthday,
    } => {
      let update = ProfileUpdate {
        name,
        email,
        bio,
        birthday,
        ..Default::default()
      };
      ensure_loaded(service).await?;
      let profile = service.update_user(update).await?;
      if !service.is_online() {
        println!("offline: update queued");
      }
      print_profile(&profile);
    }
    Command::Prefs { email, push } => {
      ensure_loaded(service).await?;
      let outcome = service.update_preferences(PreferencesUpdate {
        email_notifications: email,
        push_notifications: push,
      });
      if let PreferenceOutcome::PushBlocked(status) = outcome {
        println!("push notifications not enabled: permission {}", status);
      }
      if let Some(user) = service.state().user.user {
        println!(
          "email notifications: {}, push notifications: {}",
          user.preferences.email_notifications, user.preferences.push_notifications
        );
      }
    }
    Command::Theme => {
      let dark = service.toggle_theme();
      println!("dark mode: {}", if dark { "on" } else { "off" });
    }
    Command::Upload { uri } => {
      ensure_loaded(service).await?;
      let profile = service
        .upload_picture(&uri, Box::new(|progress: u8| eprint!("\ruploading... {}%", progress)))
        .await?;
      eprintln!();
      print_profile(&profile);
    }
    Command::Permission { action } => {
      let notifications = service.notifications();
      let status = match action {
        PermissionAction::Grant => notifications.record_permission(true)?,
        PermissionAction::Deny => notifications.record_permission(false)?,
        PermissionAction::Check => notifications.check_permission(),
      };
      println!("notification permission: {}", status);
    }
    Command::Sync => {
      if service.is_online() {
        println!("already online, {} queued", service.queue().len());
      } else {
        signal.set_online(true);
        let report = service.network().report(true).await;
        // The background listener may have taken the edge first.
        match report {
          Some(report) => println!(
            "replayed {}: {} succeeded, {} failed",
            report.attempted, report.succeeded, report.failed
          ),
          None => println!("{} still queued", service.queue().len()),
        }
      }
    }
    Command::Status => {
      let state = service.state();
      let info = service.storage_info()?;
      println!("online: {}", service.is_online());
      println!("dark mode: {}", state.app.is_dark_mode);
      match &state.user.user {
        Some(user) => println!("user: {} <{}>", user.name, user.email),
        None => println!("user: not loaded"),
      }
      if let Some(error) = &state.user.error {
        println!("last error: {}", error);
      }
      println!("queued writes: {}", info.queue_length);
      println!("cache entries: {}", info.cache_entries);
      println!("storage: {} keys, {} bytes", info.keys.len(), info.used_bytes);
    }
    Command::Reset => {
      let profile = service.reset_all_data().await?;
      println!("all data reset");
      print_profile(&profile);
    }
  }

  Ok(())
}

/// Load the profile if the restored state has none.
async fn ensure_loaded(service: &ProfileService) -> Result<()> {
  if service.state().user.user.is_none() {
    service.fetch_user().await?;
  }
  Ok(())
}

fn print_profile(profile: &UserProfile) {
  println!("name:     {}", profile.name);
  println!("email:    {}", profile.email);
  println!("bio:      {}", profile.bio);
  println!("birthday: {}", profile.birthday);
  println!("picture:  {}", profile.profile_picture);
}
