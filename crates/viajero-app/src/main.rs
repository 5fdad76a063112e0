//! Viaje.ro command line.
//!
//! Every command runs against the backend configured through `VIAJERO_*`
//! variables. The signed-in session is kept in a file between runs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use viajero_app::{AppConfig, AppError, Session, SignUpOutcome, Viajero};
use viajero_core::{
    BrazilianState, CityKey, CityList, CoverPosition, HexColor, PhotoId, PhotoUpload,
    ReferenceData, ReviewDraft, SignUpForm,
};

#[derive(Debug, Parser)]
#[command(name = "viajero", version, about = "Track the Brazilian municipalities you visit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "VIAJERO_PASSWORD")]
        password: String,
    },
    /// Print the URL that starts a sign-in with an OAuth provider.
    Oauth { provider: String },
    /// Sign out.
    Logout,
    /// Visited cities.
    Visited {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Cities on the wishlist.
    Wishlist {
        #[command(subcommand)]
        action: ListAction,
    },
    /// City reviews.
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Statistics for a list.
    Stats {
        #[arg(long)]
        wishlist: bool,
    },
    /// Map layers for a list, as JSON.
    Map {
        #[arg(long)]
        wishlist: bool,
    },
    /// Map colours.
    Colors {
        #[command(subcommand)]
        action: ColorAction,
    },
    /// Profile and account.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Search municipalities by name.
    Search {
        term: String,
        #[arg(long)]
        state: Option<String>,
    },
    /// Resolve a request path to a page.
    Route { path: String },
}

#[derive(Debug, Subcommand)]
enum ListAction {
    /// Show the list.
    List,
    /// Add a city.
    Add(CityArgs),
    /// Remove a city.
    Remove(CityArgs),
}

#[derive(Debug, Args)]
struct CityArgs {
    city: String,
    state: String,
}

impl CityArgs {
    fn key(&self) -> Result<CityKey, AppError> {
        let state = BrazilianState::lookup(&self.state)
            .ok_or_else(|| viajero_core::ViajeroError::UnknownState(self.state.clone()))?;
        Ok(CityKey::new(self.city.trim(), state))
    }
}

#[derive(Debug, Subcommand)]
enum ReviewAction {
    /// Show a review and its photos.
    Show(CityArgs),
    /// Create or update a review.
    Save {
        #[command(flatten)]
        city: CityArgs,
        #[arg(long, default_value_t = 0.0)]
        rating: f64,
        #[arg(long, default_value = "")]
        comment: String,
        /// Photo files to attach.
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
        /// Which new photo becomes the cover.
        #[arg(long)]
        cover_index: Option<usize>,
        #[arg(long, default_value_t = 0.5)]
        x: f64,
        #[arg(long, default_value_t = 0.5)]
        y: f64,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Delete a review and its photos.
    Delete(CityArgs),
    /// Make a photo the cover, or clear the cover.
    Cover {
        #[command(flatten)]
        city: CityArgs,
        /// Photo to use; omit to clear the cover.
        photo: Option<PhotoId>,
    },
    /// Move the cover photo inside the outline.
    Position {
        #[command(flatten)]
        city: CityArgs,
        x: f64,
        y: f64,
        scale: f64,
    },
    /// Delete one photo.
    DeletePhoto { photo: PhotoId },
}

#[derive(Debug, Subcommand)]
enum ColorAction {
    /// Show every colour.
    Show,
    /// Set a state's colour.
    Set { state: String, color: String },
    /// Set the wishlist colour.
    Wishlist { color: String },
    /// Restore the default state colours.
    Reset,
}

#[derive(Debug, Subcommand)]
enum AccountAction {
    /// Show the profile.
    Show,
    /// Change the display name.
    Name { name: String },
    /// Upload an avatar.
    Avatar { path: PathBuf },
    /// Change the email address.
    Email { email: String },
    /// Change the password.
    Password {
        #[arg(env = "VIAJERO_NEW_PASSWORD")]
        password: String,
    },
    /// Delete the account and everything in it.
    Delete {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,viajero=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    tracing::debug!(
        api_configured = %config.api_url.is_some(),
        base_path = %config.base_path,
        reference_dir = %config.reference_dir.display(),
        "Configuration loaded"
    );

    if let Err(e) = run(cli.command, config).await {
        let notice = e.notice();
        eprintln!("{}: {}", notice.title, notice.message);
        std::process::exit(1);
    }
}

async fn run(command: Command, config: AppConfig) -> Result<(), AppError> {
    let session_path = config.session_path.clone();
    let app = Viajero::from_config(config).await?;
    resume(&app, &session_path).await;

    match command {
        Command::Signup {
            email,
            password,
            confirm_password,
            name,
        } => {
            let form = SignUpForm {
                email,
                password,
                confirm_password,
                display_name: name,
            };
            match app.sign_up(&form).await? {
                SignUpOutcome::SignedIn(session) => {
                    save_session(&session_path, &session).await?;
                    println!("Signed in as {}", session.email.as_deref().unwrap_or("new user"));
                }
                SignUpOutcome::ConfirmationSent => {
                    println!("Check your email to confirm the account.");
                }
            }
        }
        Command::Login { email, password } => {
            let session = app.sign_in(&email, &password).await?;
            save_session(&session_path, &session).await?;
            println!("Signed in as {email}");
        }
        Command::Oauth { provider } => {
            println!("{}", app.auth()?.authorize_url(&provider)?);
        }
        Command::Logout => {
            app.sign_out().await;
            forget_session(&session_path).await;
            println!("Signed out");
        }
        Command::Visited { action } => list_command(&app, CityList::Visited, action).await?,
        Command::Wishlist { action } => list_command(&app, CityList::Wishlist, action).await?,
        Command::Review { action } => review_command(&app, action).await?,
        Command::Stats { wishlist } => {
            print_json(&app.tracker().statistics(list_flag(wishlist)).await)?;
        }
        Command::Map { wishlist } => {
            let view = app
                .map(list_flag(wishlist), |batch| {
                    tracing::debug!(layers = batch.len(), "map batch ready");
                })
                .await;
            print_json(&view)?;
        }
        Command::Colors { action } => color_command(&app, action).await?,
        Command::Account { action } => {
            if account_command(&app, action).await? {
                forget_session(&session_path).await;
            }
        }
        Command::Search { term, state } => {
            let state = state.as_deref().and_then(BrazilianState::lookup);
            let names: Vec<String> = app
                .tracker()
                .reference()
                .search(&term, state)
                .take(20)
                .map(|city| format!("{} - {}", city.nome, city.estado.abbreviation()))
                .collect();
            for state in ReferenceData::search_states(&term) {
                println!("{} (state)", state.name());
            }
            for name in names {
                println!("{name}");
            }
        }
        Command::Route { path } => {
            let route = app.router().resolve(&path);
            println!("{route:?} -> {}", app.router().href(route));
        }
    }
    Ok(())
}

async fn list_command(app: &Viajero, list: CityList, action: ListAction) -> Result<(), AppError> {
    let tracker = app.tracker();
    match action {
        ListAction::List => {
            for city in tracker.cities(list).await {
                println!(
                    "{} - {} ({:.1} km²)",
                    city.city_name,
                    city.state_name.abbreviation(),
                    city.area_km2
                );
            }
        }
        ListAction::Add(args) => {
            let city = tracker.add_city(list, &args.city, &args.state).await?;
            println!("Added {} to your {list}", city.city_name);
        }
        ListAction::Remove(args) => {
            tracker.remove_city(list, &args.key()?).await?;
            println!("Removed {} from your {list}", args.city);
        }
    }
    Ok(())
}

async fn review_command(app: &Viajero, action: ReviewAction) -> Result<(), AppError> {
    let tracker = app.tracker();
    match action {
        ReviewAction::Show(args) => {
            let key = args.key()?;
            let review = tracker
                .review(&key)
                .await
                .ok_or_else(|| AppError::NotFound(format!("review of {key}")))?;
            let photos = tracker.photos(review.id).await;
            print_json(&serde_json::json!({ "review": review, "photos": photos }))?;
        }
        ReviewAction::Save {
            city,
            rating,
            comment,
            photos,
            cover_index,
            x,
            y,
            scale,
            from,
            to,
        } => {
            let mut new_photos = Vec::with_capacity(photos.len());
            for path in photos {
                new_photos.push(read_upload(&path).await?);
            }
            let draft = ReviewDraft {
                rating,
                comment,
                new_photos,
                cover_photo_index: cover_index,
                cover_position: CoverPosition { x, y, scale },
                visit_start_date: from,
                visit_end_date: to,
            };
            let review = tracker.save_review(&city.key()?, &draft).await?;
            println!("Saved review {}", review.id);
        }
        ReviewAction::Delete(args) => {
            tracker.delete_review(&args.key()?).await?;
            println!("Deleted review of {}", args.city);
        }
        ReviewAction::Cover { city, photo } => {
            let key = city.key()?;
            let review = tracker
                .review(&key)
                .await
                .ok_or_else(|| AppError::NotFound(format!("review of {key}")))?;
            match photo {
                Some(photo) => tracker.set_cover_photo(review.id, photo).await?,
                None => tracker.remove_cover_photo(review.id).await?,
            }
            println!("Cover updated");
        }
        ReviewAction::Position { city, x, y, scale } => {
            tracker
                .update_cover_position(&city.key()?, CoverPosition { x, y, scale })
                .await?;
            println!("Cover position saved");
        }
        ReviewAction::DeletePhoto { photo } => {
            tracker.delete_photo(photo).await?;
            println!("Photo deleted");
        }
    }
    Ok(())
}

async fn color_command(app: &Viajero, action: ColorAction) -> Result<(), AppError> {
    let settings = app.settings();
    match action {
        ColorAction::Show => print_json(&settings.current().await)?,
        ColorAction::Set { state, color } => {
            let state = BrazilianState::lookup(&state)
                .ok_or(viajero_core::ViajeroError::UnknownState(state))?;
            settings.set_state_color(state, HexColor::parse(&color)?).await?;
        }
        ColorAction::Wishlist { color } => {
            settings.set_wishlist_color(HexColor::parse(&color)?).await?;
        }
        ColorAction::Reset => settings.reset_state_colors().await?,
    }
    Ok(())
}

/// Returns whether the account was deleted.
async fn account_command(app: &Viajero, action: AccountAction) -> Result<bool, AppError> {
    let user_id = app.tracker().user_id().await?;
    let account = app.account();
    match action {
        AccountAction::Show => print_json(&account.profile(user_id).await?)?,
        AccountAction::Name { name } => {
            account.update_display_name(user_id, &name).await?;
        }
        AccountAction::Avatar { path } => {
            let profile = account.upload_avatar(user_id, &read_upload(&path).await?).await?;
            println!("{}", profile.avatar_url.unwrap_or_default());
        }
        AccountAction::Email { email } => {
            app.update_email(&email).await?;
            println!("Check {email} to confirm the change.");
        }
        AccountAction::Password { password } => app.update_password(&password).await?,
        AccountAction::Delete { yes } => {
            if !yes {
                println!("Pass --yes to delete the account and all of its data.");
                return Ok(false);
            }
            app.delete_account().await?;
            println!("Account deleted");
            return Ok(true);
        }
    }
    Ok(false)
}

fn list_flag(wishlist: bool) -> CityList {
    if wishlist {
        CityList::Wishlist
    } else {
        CityList::Visited
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| viajero_store::StoreError::Serialization(e.to_string()))?;
    println!("{text}");
    Ok(())
}

async fn read_upload(path: &Path) -> Result<PhotoUpload, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(viajero_store::StoreError::from)?;
    Ok(PhotoUpload {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content_type: None,
        bytes,
    })
}

async fn resume(app: &Viajero, path: &Path) {
    let Ok(text) = tokio::fs::read_to_string(path).await else {
        return;
    };
    let session: Session = match serde_json::from_str(&text) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session");
            forget_session(path).await;
            return;
        }
    };
    if let Err(e) = app.restore_session(&session.access_token).await {
        tracing::warn!(error = %e, "stored session is no longer valid");
        if matches!(e, AppError::SessionExpired | AppError::InvalidToken(_)) {
            forget_session(path).await;
        }
    }
}

async fn save_session(path: &Path, session: &Session) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(viajero_store::StoreError::from)?;
    }
    let text = serde_json::to_string(session)
        .map_err(|e| viajero_store::StoreError::Serialization(e.to_string()))?;
    tokio::fs::write(path, text)
        .await
        .map_err(viajero_store::StoreError::from)?;
    Ok(())
}

async fn forget_session(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove session file");
        }
    }
}
