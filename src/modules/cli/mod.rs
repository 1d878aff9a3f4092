use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::is_admin;
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::storage::BlogDB;

#[derive(Parser, Debug)]
#[command(name = "daily_blog")]
#[command(version = "0.1.0")]
#[command(about = "Daily Blog server", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    #[command(name = "serve")]
    #[command(about = "Start the blog server (default)")]
    Serve,

    #[command(name = "init-db")]
    #[command(about = "Create the database schema and exit")]
    InitDb,

    #[command(name = "users")]
    #[command(about = "List registered users")]
    Users,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

pub fn init_db(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    BlogDB::new(&config.database_path())?;
    println!("✓ Database ready at: {}", config.paths.database_path.display());
    Ok(())
}

pub fn list_users(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = BlogDB::new(&config.database_path())?;
    let users = db.get_all_users()?;

    if users.is_empty() {
        println!("No users registered yet. The first account to register becomes the admin.");
        return Ok(());
    }

    for user in &users {
        let marker = if is_admin(user) { " (admin)" } else { "" };
        println!("{:>4}  {:<32} {}{}", user.id, user.email, user.name, marker);
    }
    println!("✓ {} users, {} comments", users.len(), db.count_comments()?);
    Ok(())
}
