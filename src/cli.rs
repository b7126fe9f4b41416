//! `profile-sync` command line front end.
//!
//! Each subcommand drives one store action against the configured API,
//! prints the resulting state to stdout and the store's notices to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::api::HttpProfilesApi;
use crate::config::Config;
use crate::model::{ActivityPredicate, FollowPredicate, PhotoUpload, Profile, ProfileUpdate};
use crate::notify::{notice_channel, Notice};
use crate::profile::ProfileStore;
use crate::session::{SessionState, SessionUser};

/// Profile synchronization client.
#[derive(Parser, Debug)]
#[command(name = "profile-sync", version, about = "Profile synchronization client")]
pub struct Cli {
    /// Path to config file (default: <config dir>/profile-sync/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the profiles API base URL.
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Bearer token sent with every request.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Sign the session in as this user.
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a profile.
    Show { username: String },

    /// List a user's activities.
    Activities {
        username: String,
        /// past, future or hosting.
        #[arg(long)]
        predicate: Option<ActivityPredicate>,
    },

    /// List the users following a profile.
    Followers { username: String },

    /// List the users a profile follows.
    Following { username: String },

    /// Follow a user.
    Follow { username: String },

    /// Unfollow a user.
    Unfollow { username: String },

    /// Upload a photo for the signed-in user.
    Upload { file: PathBuf },

    /// Make one of the signed-in user's photos the main photo.
    #[command(name = "set-main")]
    SetMain { photo_id: String },

    /// Delete one of the signed-in user's photos.
    #[command(name = "delete-photo")]
    DeletePhoto { photo_id: String },

    /// Edit the signed-in user's display name or bio.
    Edit {
        #[arg(long = "display-name")]
        display_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Show { .. } => "show",
            Command::Activities { .. } => "activities",
            Command::Followers { .. } => "followers",
            Command::Following { .. } => "following",
            Command::Follow { .. } => "follow",
            Command::Unfollow { .. } => "unfollow",
            Command::Upload { .. } => "upload",
            Command::SetMain { .. } => "set-main",
            Command::DeletePhoto { .. } => "delete-photo",
            Command::Edit { .. } => "edit",
        }
    }
}

/// Resolve configuration from the file and the command line overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
        config.validate()?;
    }
    Ok(config)
}

/// Run one command. Returns the number of notices the store emitted.
pub async fn run(cli: Cli) -> anyhow::Result<usize> {
    let config = resolve_config(&cli)?;

    let mut api = HttpProfilesApi::new(&config.api).context("Failed to create API client")?;
    if let Some(token) = &cli.token {
        api = api.with_token(token.clone());
    }
    tracing::debug!(base_url = %api.base_url(), command = cli.command.name(), "Starting");

    let session = match &cli.user {
        Some(username) => SessionState::signed_in(SessionUser::new(username.clone(), username.clone())),
        None => SessionState::new(),
    };
    let (notifier, mut notices) = notice_channel();
    let store = ProfileStore::new(Arc::new(api), session, Arc::new(notifier), config.tabs);

    let result = execute(&store, cli.user.as_deref(), cli.command).await;
    store.dispose();
    let emitted = drain_notices(&mut notices);
    result?;
    Ok(emitted)
}

async fn execute(store: &ProfileStore, user: Option<&str>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show { username } => {
            store.load_profile(&username).await;
            if let Some(profile) = store.profile() {
                print_profile(&profile, store.is_current_user());
            }
        }
        Command::Activities {
            username,
            predicate,
        } => {
            store.load_user_activities(&username, predicate).await;
            for activity in store.activities() {
                println!(
                    "{}  {:<12} {}",
                    activity.date.format("%Y-%m-%d %H:%M"),
                    activity.category,
                    activity.title
                );
            }
        }
        Command::Followers { username } => {
            list_followings(store, &username, FollowPredicate::Followers).await
        }
        Command::Following { username } => {
            list_followings(store, &username, FollowPredicate::Following).await
        }
        Command::Follow { username } => {
            store.load_profile(&username).await;
            store.follow(&username).await;
            if let Some(profile) = store.profile() {
                print_profile(&profile, store.is_current_user());
            }
        }
        Command::Unfollow { username } => {
            store.load_profile(&username).await;
            store.unfollow(&username).await;
            if let Some(profile) = store.profile() {
                print_profile(&profile, store.is_current_user());
            }
        }
        Command::Upload { file } => {
            let upload = read_upload(&file)?;
            load_own_profile(store, user, "upload").await?;
            store.upload_photo(upload).await;
            print_own_profile(store);
        }
        Command::SetMain { photo_id } => {
            let profile = load_own_profile(store, user, "set-main").await?;
            let Some(photo) = profile.photo(&photo_id).cloned() else {
                bail!("Photo '{}' not found on profile '{}'", photo_id, profile.username);
            };
            store.set_main_photo(&photo).await;
            print_own_profile(store);
        }
        Command::DeletePhoto { photo_id } => {
            let profile = load_own_profile(store, user, "delete-photo").await?;
            let Some(photo) = profile.photo(&photo_id).cloned() else {
                bail!("Photo '{}' not found on profile '{}'", photo_id, profile.username);
            };
            store.delete_photo(&photo).await;
            print_own_profile(store);
        }
        Command::Edit { display_name, bio } => {
            let update = ProfileUpdate { display_name, bio };
            if update.is_empty() {
                bail!("Nothing to update: pass --display-name or --bio");
            }
            load_own_profile(store, user, "edit").await?;
            store.update_profile(update).await;
            print_own_profile(store);
        }
    }
    Ok(())
}

/// Load the signed-in user's profile before a self-edit.
async fn load_own_profile(
    store: &ProfileStore,
    user: Option<&str>,
    command: &str,
) -> anyhow::Result<Profile> {
    let Some(username) = user else {
        bail!("--user is required for '{}'", command);
    };
    store.load_profile(username).await;
    store
        .profile()
        .with_context(|| format!("Profile '{}' could not be loaded", username))
}

async fn list_followings(store: &ProfileStore, username: &str, predicate: FollowPredicate) {
    store.load_profile(username).await;
    store.load_followings(predicate).await;
    for profile in store.followings() {
        println!("{:<20} {}", profile.username, profile.display_name);
    }
}

fn read_upload(path: &Path) -> anyhow::Result<PhotoUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    Ok(PhotoUpload { file_name, bytes })
}

fn print_own_profile(store: &ProfileStore) {
    if let Some(profile) = store.profile() {
        print_profile(&profile, store.is_current_user());
    }
}

fn print_profile(profile: &Profile, is_current_user: bool) {
    let you = if is_current_user { " (you)" } else { "" };
    println!("{} ({}){}", profile.username, profile.display_name, you);
    if let Some(bio) = &profile.bio {
        println!("  {}", bio);
    }
    println!(
        "  followers: {}  following: {}  followed by you: {}",
        profile.followers_count,
        profile.following_count,
        if profile.following { "yes" } else { "no" }
    );
    for photo in &profile.photos {
        let marker = if photo.is_main { "*" } else { " " };
        println!("  {} {}  {}", marker, photo.id, photo.url);
    }
}

fn drain_notices(notices: &mut mpsc::UnboundedReceiver<Notice>) -> usize {
    let mut count = 0;
    while let Ok(notice) = notices.try_recv() {
        eprintln!("{}", notice.message);
        count += 1;
    }
    count
}
