use atelier::config::SiteConfig;
use atelier::db::Database;
use atelier::lifecycle::Gallery;
use atelier::seed;
use atelier::storage::OverwriteStore;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Content-managed art gallery backend")]
#[command(long_about = "\
Content-managed art gallery backend

SQLite holds the records, the media directory holds sources and their
generated derivatives. Every command goes through the same save/delete
lifecycle as the admin surface, so files never leak.

Media layout:

  media/
  ├── artist/                      # Artist photo (processed to WEBP)
  ├── paintings/
  │   ├── original/                # Uploads, stored as-is
  │   ├── small/                   # 4:3 crop, 400x300, q80
  │   ├── medium/                  # 4:3 crop, 800x600, q85
  │   └── large/                   # max-width 1920, q90
  └── blog/
      ├── covers/                  # Post covers (processed to WEBP)
      └── images/                  # Additional post images

Set RUST_LOG (e.g. RUST_LOG=atelier=debug) to control logging.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "atelier.toml", global = true)]
    config: PathBuf,

    /// SQLite database file (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Media directory (overrides config)
    #[arg(long, global = true)]
    media_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema and media directory
    Init,
    /// Populate the database with sample content
    Seed,
    /// Delete every record and its media files
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Regenerate missing painting derivatives
    Heal,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = SiteConfig::from_file(&cli.config)?;
    let db_path = cli.db.unwrap_or_else(|| PathBuf::from(&config.database));
    let media_root = cli
        .media_root
        .unwrap_or_else(|| PathBuf::from(&config.media_root));

    let gallery = open_gallery(&db_path, &media_root)?;

    match cli.command {
        Command::Init => {
            // open_gallery already bootstrapped the schema
            std::fs::create_dir_all(&media_root)?;
            println!(
                "Initialized database at {} and media root at {}",
                db_path.display(),
                media_root.display()
            );
        }
        Command::Seed => {
            let summary = seed::seed(&gallery)?;
            println!(
                "Seeded: {} artist(s), {} site contact(s), {} painting(s), \
                 {} blog post(s), {} post image(s), {} contact request(s)",
                summary.artists,
                summary.site_contacts,
                summary.paintings,
                summary.blog_posts,
                summary.blog_post_images,
                summary.contact_requests
            );
        }
        Command::Clear { force } => {
            if !force && !confirm_clear()? {
                println!("Aborted");
                return Ok(());
            }
            let summary = seed::clear(&gallery)?;
            if summary.total() == 0 {
                println!("Database was already empty");
            } else {
                println!(
                    "Cleared: {} artist(s), {} site contact(s), {} painting(s), \
                     {} blog post(s), {} post image(s), {} contact request(s), \
                     media files included",
                    summary.artists,
                    summary.site_contacts,
                    summary.paintings,
                    summary.blog_posts,
                    summary.blog_post_images,
                    summary.contact_requests
                );
            }
        }
        Command::Heal => {
            let healed = gallery.heal_paintings()?;
            if healed == 0 {
                println!("All painting derivatives are present");
            } else {
                println!("Regenerated derivatives for {healed} painting(s)");
            }
        }
    }

    Ok(())
}

fn open_gallery(db_path: &Path, media_root: &Path) -> Result<Gallery, Box<dyn std::error::Error>> {
    let db = Database::open(db_path)?;
    let store = OverwriteStore::new(media_root);
    Ok(Gallery::new(db, store))
}

/// Interactive confirmation for `clear` without `--force`.
fn confirm_clear() -> std::io::Result<bool> {
    print!("This permanently deletes every record AND its media files. Continue? (yes/no): ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
