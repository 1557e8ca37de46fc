use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "quill", version, about = "A small blogging platform")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (the default).
    Serve,
    /// Create a post group.
    CreateGroup {
        #[arg(long)]
        title: String,
        /// Defaults to the slugified title.
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://quill.db?mode=rwc")]
    pub database_url: String,

    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8000")]
    pub listen: SocketAddr,

    /// Secret used to sign session tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Directory uploaded images are written to and served from.
    #[arg(long, env = "MEDIA_ROOT", default_value = "media")]
    pub media_root: PathBuf,

    #[arg(long, env = "POSTS_PER_PAGE", default_value_t = 10)]
    pub posts_per_page: u32,

    /// Largest request body accepted by the post forms, image included.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Lifetime of the cached home feed.
    #[arg(long, env = "INDEX_CACHE_SECS", default_value_t = 20)]
    pub index_cache_secs: u64,
}

impl Config {
    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.index_cache_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_the_secret_is_given() {
        let cli = Cli::parse_from(["quill", "--jwt-secret", "s3cret"]);

        assert!(cli.command.is_none());
        assert_eq!(cli.config.posts_per_page, 10);
        assert_eq!(cli.config.index_cache_ttl(), Duration::from_secs(20));
        assert_eq!(cli.config.listen.port(), 8000);
        assert_eq!(cli.config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn create_group_takes_an_optional_slug() {
        let cli = Cli::parse_from([
            "quill",
            "--jwt-secret",
            "s3cret",
            "create-group",
            "--title",
            "Cats and dogs",
        ]);

        match cli.command {
            Some(Command::CreateGroup { title, slug, .. }) => {
                assert_eq!(title, "Cats and dogs");
                assert!(slug.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
