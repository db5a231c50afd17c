use blog_backend::config::Config;
use blog_backend::helper::sanitization_helpers::strip_all_html;
use blog_backend::models::db_operations::posts_db_operations::{self, NewPost};
use blog_backend::models::db_operations::users_db_operations;
use blog_backend::setup::db_setup::{self, SetupError};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "Setup and content administration for the blog.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    Category {
        #[command(subcommand)]
        action: TaxonomyAction,
    },
    Tag {
        #[command(subcommand)]
        action: TaxonomyAction,
    },
    Post {
        #[command(subcommand)]
        action: PostAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup,
}

#[derive(Subcommand, Debug)]
enum UserAction {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "moderator", value_parser = ["admin", "moderator"])]
        role: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
    },
    Deactivate {
        #[arg(long)]
        username: String,
    },
    Activate {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand, Debug)]
enum TaxonomyAction {
    Add {
        #[arg(long)]
        name: String,
        /// Defaults to the slugified name.
        #[arg(long)]
        slug: Option<String>,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum PostAction {
    Create {
        #[arg(long)]
        title: String,
        /// Markdown file holding the post body.
        #[arg(long, value_name = "FILE")]
        content_file: PathBuf,
        #[arg(long)]
        public: bool,
        /// Slug of an existing category.
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tag names; missing tags are created.
        #[arg(long, default_value = "")]
        tags: String,
    },
    Publish {
        #[arg(long)]
        id: i64,
    },
    Unpublish {
        #[arg(long)]
        id: i64,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
    AttachImage {
        #[arg(long)]
        id: i64,
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    let result = match cli.command {
        Commands::Db { action: DbAction::Setup } => setup_database(&config),
        Commands::User { action } => run_user_action(&config, action),
        Commands::Category { action } => run_taxonomy_action(&config, Taxonomy::Category, action),
        Commands::Tag { action } => run_taxonomy_action(&config, Taxonomy::Tag, action),
        Commands::Post { action } => run_post_action(&config, action),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn open_db(config: &Config) -> Result<Connection, SetupError> {
    let db_path = config.blog_db_path();
    if !db_path.exists() {
        return Err(SetupError::Invalid(format!(
            "Blog database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        )));
    }
    let conn = Connection::open(&db_path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

fn setup_database(config: &Config) -> Result<(), SetupError> {
    let db_path = config.blog_db_path();
    if db_path.exists() {
        println!("ℹ️ Blog database already exists at '{}'. Skipping creation.", db_path.display());
        return Ok(());
    }
    println!("\nSetting up blog database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir)?;
    }
    fs::create_dir_all(&config.media_path)?;

    let mut conn = Connection::open(&db_path)?;
    db_setup::setup_blog_db(&mut conn)?;
    println!("✅ Blog database setup completed successfully.");
    Ok(())
}

fn run_user_action(config: &Config, action: UserAction) -> Result<(), SetupError> {
    let conn = open_db(config)?;
    match action {
        UserAction::Create { username, password, role } => {
            if username.trim().is_empty() || password.is_empty() {
                return Err(SetupError::Invalid("Username and password must not be empty.".to_string()));
            }
            users_db_operations::create_user(&conn, username.trim(), &password, &role)?;
            println!("✅ User '{}' created with role '{}'.", username.trim(), role);
        }
        UserAction::List => {
            println!("Listing users:");
            for user in users_db_operations::read_all_users(&conn)? {
                let status = if user.is_active { "active" } else { "suspended" };
                let last_login = user
                    .last_login_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!("- {} ({}, {}, last login: {})", user.username, user.role, status, last_login);
            }
        }
        UserAction::ChangePassword { username, new_password } => {
            match users_db_operations::change_password(&conn, &username, &new_password)? {
                0 => return Err(SetupError::Invalid(format!("No user named '{}' found.", username))),
                _ => println!("✅ Password for '{}' changed successfully.", username),
            }
        }
        UserAction::Deactivate { username } => set_active(&conn, &username, false)?,
        UserAction::Activate { username } => set_active(&conn, &username, true)?,
    }
    Ok(())
}

fn set_active(conn: &Connection, username: &str, is_active: bool) -> Result<(), SetupError> {
    match users_db_operations::set_user_active(conn, username, is_active)? {
        0 => Err(SetupError::Invalid(format!("No user named '{}' found.", username))),
        _ => {
            let state = if is_active { "activated" } else { "deactivated" };
            println!("✅ User '{}' {}.", username, state);
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
enum Taxonomy {
    Category,
    Tag,
}

fn run_taxonomy_action(config: &Config, taxonomy: Taxonomy, action: TaxonomyAction) -> Result<(), SetupError> {
    let conn = open_db(config)?;
    match action {
        TaxonomyAction::Add { name, slug } => {
            let name = strip_all_html(name.trim());
            let slug = slug.unwrap_or_else(|| slug::slugify(&name));
            if name.is_empty() || slug.is_empty() {
                return Err(SetupError::Invalid("Name and slug must not be empty.".to_string()));
            }
            let id = match taxonomy {
                Taxonomy::Category => posts_db_operations::create_category(&conn, &name, &slug)?,
                Taxonomy::Tag => posts_db_operations::create_tag(&conn, &name, &slug)?,
            };
            println!("✅ Added '{}' (slug '{}', id {}).", name, slug, id);
        }
        TaxonomyAction::List => {
            let rows: Vec<(String, String, i64)> = match taxonomy {
                Taxonomy::Category => posts_db_operations::read_categories_with_counts(&conn)?
                    .into_iter()
                    .map(|c| (c.category.name, c.category.slug, c.num_posts))
                    .collect(),
                Taxonomy::Tag => posts_db_operations::read_tags_with_counts(&conn)?
                    .into_iter()
                    .map(|t| (t.tag.name, t.tag.slug, t.num_posts))
                    .collect(),
            };
            for (name, slug, num_posts) in rows {
                println!("- {} [{}]: {} public post(s)", name, slug, num_posts);
            }
        }
    }
    Ok(())
}

fn resolve_tag_ids(conn: &Connection, tags: &str) -> Result<Vec<i64>, SetupError> {
    let mut ids = Vec::new();
    for name in tags.split(',').map(|s| strip_all_html(s.trim())).filter(|s| !s.is_empty()) {
        let slug = slug::slugify(&name);
        let id = match posts_db_operations::read_tag_by_slug(conn, &slug)? {
            Some(tag) => tag.id,
            None => {
                println!("  > Creating tag '{}' ({})", name, slug);
                posts_db_operations::create_tag(conn, &name, &slug)?
            }
        };
        ids.push(id);
    }
    Ok(ids)
}

fn run_post_action(config: &Config, action: PostAction) -> Result<(), SetupError> {
    let mut conn = open_db(config)?;
    match action {
        PostAction::Create { title, content_file, public, category, tags } => {
            let title = strip_all_html(title.trim());
            if title.is_empty() {
                return Err(SetupError::Invalid("Title must not be empty.".to_string()));
            }
            let content = fs::read_to_string(&content_file)?;

            let category_id = match category {
                Some(slug) => Some(
                    posts_db_operations::read_category_by_slug(&conn, &slug)?
                        .ok_or_else(|| SetupError::Invalid(format!("Unknown category '{}'.", slug)))?
                        .id,
                ),
                None => None,
            };
            let tag_ids = resolve_tag_ids(&conn, &tags)?;

            let post_id = posts_db_operations::create_post(
                &mut conn,
                &NewPost { title: &title, content: &content, is_public: public, category_id, tag_ids: &tag_ids },
            )?;
            let visibility = if public { "public" } else { "private" };
            println!("✅ Post {} created ({}).", post_id, visibility);
        }
        PostAction::Publish { id } => set_visibility(&conn, id, true)?,
        PostAction::Unpublish { id } => set_visibility(&conn, id, false)?,
        PostAction::Delete { id } => delete_post(config, &conn, id)?,
        PostAction::AttachImage { id, file } => attach_image(config, &conn, id, &file)?,
    }
    Ok(())
}

fn set_visibility(conn: &Connection, post_id: i64, is_public: bool) -> Result<(), SetupError> {
    match posts_db_operations::set_post_visibility(conn, post_id, is_public)? {
        0 => Err(SetupError::Invalid(format!("No post with id {}.", post_id))),
        _ => {
            let visibility = if is_public { "public" } else { "private" };
            println!("✅ Post {} is now {}.", post_id, visibility);
            Ok(())
        }
    }
}

fn delete_post(config: &Config, conn: &Connection, post_id: i64) -> Result<(), SetupError> {
    let images = posts_db_operations::read_images_for_post(conn, post_id)?;
    if posts_db_operations::delete_post(conn, post_id)? == 0 {
        return Err(SetupError::Invalid(format!("No post with id {}.", post_id)));
    }

    // Rows are gone through the cascade; the files are ours to clean up.
    for image in images {
        let path = Path::new(&config.media_path).join(&image.file_path);
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("⚠️ Could not remove image file '{}': {}", path.display(), e);
        }
    }
    let _ = fs::remove_dir(Path::new(&config.media_path).join("posts").join(post_id.to_string()));
    println!("✅ Post {} deleted with its comments and images.", post_id);
    Ok(())
}

fn attach_image(config: &Config, conn: &Connection, post_id: i64, file: &Path) -> Result<(), SetupError> {
    if !posts_db_operations::post_exists(conn, post_id)? {
        return Err(SetupError::Invalid(format!("No post with id {}.", post_id)));
    }

    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| {
            SetupError::Invalid(format!("Unsupported image type. Allowed: {}", IMAGE_EXTENSIONS.join(", ")))
        })?;

    let relative_path = format!("posts/{}/{}.{}", post_id, Uuid::new_v4(), extension);
    let destination = Path::new(&config.media_path).join(&relative_path);
    if let Some(parent_dir) = destination.parent() {
        fs::create_dir_all(parent_dir)?;
    }
    fs::copy(file, &destination)?;

    match posts_db_operations::add_content_image(conn, post_id, &relative_path) {
        Ok(image_id) => {
            println!("✅ Image {} attached to post {} at /media/{}", image_id, post_id, relative_path);
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&destination);
            Err(e.into())
        }
    }
}
