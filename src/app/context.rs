use std::path::PathBuf;
use std::time::Duration;

use crate::app::error::{RawdogError, Result};
use crate::config::Config;
use crate::domain::AggregateState;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::hooks::{HookContext, HookRegistry};
use crate::plugins;
use crate::store::{SqliteStore, StateStore};
use crate::template::Templates;

pub const CONFIG_FILE: &str = "config.toml";
pub const STATE_FILE: &str = "state.db";

/// Everything one run works with: the state directory, the merged
/// configuration, the extension hooks, the persisted aggregate and the fetcher.
pub struct AppContext {
    pub dir: PathBuf,
    pub config: Config,
    pub hooks: HookRegistry,
    pub state: AggregateState,
    pub store: Box<dyn StateStore>,
    pub fetcher: Box<dyn Fetcher>,
}

impl AppContext {
    /// Open the state directory `dir`: register the built-in extensions, read
    /// `config.toml` and then each of `extra_configs`, and load the saved state.
    pub fn new(dir: PathBuf, extra_configs: &[PathBuf]) -> Result<Self> {
        if !dir.is_dir() {
            return Err(RawdogError::Other(format!("No {} directory", dir.display())));
        }

        let mut hooks = HookRegistry::new();
        plugins::register_builtin(&mut hooks);

        let mut config = Config::load(&dir.join(CONFIG_FILE), &hooks)?;
        for extra in extra_configs {
            config.apply_file(&dir.join(extra), &hooks)?;
        }

        let store = SqliteStore::new(dir.join(STATE_FILE))?;
        let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout))?;

        Self::with_parts(dir, config, hooks, Box::new(store), Box::new(fetcher))
    }

    /// Assemble a context from already-built parts, loading the state from `store`.
    pub fn with_parts(
        dir: PathBuf,
        config: Config,
        hooks: HookRegistry,
        store: Box<dyn StateStore>,
        fetcher: Box<dyn Fetcher>,
    ) -> Result<Self> {
        let state = store.load()?;
        Ok(Self {
            dir,
            config,
            hooks,
            state,
            store,
            fetcher,
        })
    }

    /// `~/.rawdog`
    pub fn default_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RawdogError::Other("Could not find home directory".into()))?;
        Ok(home.join(".rawdog"))
    }

    pub fn templates(&self) -> Result<Templates> {
        Templates::load(&self.config, &self.dir)
    }

    pub fn startup(&self) -> Result<()> {
        self.hooks.dispatch(&mut HookContext::Startup {
            config: &self.config,
        })?;
        Ok(())
    }

    pub fn shutdown(&self) -> Result<()> {
        self.hooks.dispatch(&mut HookContext::Shutdown {
            config: &self.config,
        })?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory() {
        let err = AppContext::new(PathBuf::from("/nonexistent/rawdog"), &[])
            .err()
            .unwrap();
        assert!(err.to_string().contains("No /nonexistent/rawdog directory"));
    }

    #[test]
    fn test_opens_state_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "max_articles = 5\n[[feeds]]\nurl = \"https://example.com/feed\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("extra.toml"), "max_articles = 7\n").unwrap();

        let ctx = AppContext::new(dir.path().to_path_buf(), &[PathBuf::from("extra.toml")]).unwrap();
        assert_eq!(ctx.config.max_articles, 7);
        assert_eq!(ctx.config.feeds.len(), 1);
        assert!(ctx.state.feeds.is_empty());
        assert!(dir.path().join(STATE_FILE).exists());
    }

    #[test]
    fn test_state_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let mut ctx = AppContext::new(dir.path().to_path_buf(), &[]).unwrap();
        ctx.state.feeds.insert(
            "https://example.com/feed".into(),
            crate::domain::Feed::new("https://example.com/feed".into()),
        );
        ctx.save().unwrap();
        let saved = ctx.state.clone();
        drop(ctx);

        let reopened = AppContext::new(dir.path().to_path_buf(), &[]).unwrap();
        assert_eq!(reopened.state, saved);
    }

    #[test]
    fn test_concurrent_run_refused() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let _running = AppContext::new(dir.path().to_path_buf(), &[]).unwrap();
        let err = AppContext::new(dir.path().to_path_buf(), &[]).err().unwrap();
        assert!(matches!(err, RawdogError::Locked(_)));
    }

    #[test]
    fn test_builtin_directives_accepted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "selectfeeds = [\"https://a/\"]\n").unwrap();
        assert!(AppContext::new(dir.path().to_path_buf(), &[]).is_ok());
    }
}
