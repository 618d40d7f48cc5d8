//! Fetcher that runs an external downloader program

use super::traits::ItemFetcher;
use crate::config::FetcherConfig;
use crate::error::{Error, FetchError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Placeholder replaced by the listing URL in argument templates
pub const URL_PLACEHOLDER: &str = "{url}";

/// Placeholder replaced by the working directory in argument templates
pub const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

/// Longest stderr excerpt carried in [`FetchError::NonZeroExit`]
const STDERR_EXCERPT_CHARS: usize = 500;

/// Runs an external program once per listing
///
/// Arguments come from a template in which `{url}` and `{output_dir}` are
/// substituted. Exit code 0 is success; anything else is a [`FetchError`].
/// The child is killed if the fetch future is dropped.
///
/// # Examples
///
/// ```no_run
/// use closet_dl::fetch::{CliFetcher, ItemFetcher};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> closet_dl::Result<()> {
/// let fetcher = CliFetcher::new(
///     "vinted-downloader",
///     vec!["{url}".into(), "-o".into(), "{output_dir}".into()],
/// );
/// fetcher
///     .fetch("https://www.vinted.it/items/4242-red-coat", Path::new("downloads/item_4242"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CliFetcher {
    program: PathBuf,
    args: Vec<String>,
    search_path: bool,
}

impl CliFetcher {
    /// Create a fetcher for `program`, resolved through PATH at fetch time
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            search_path: true,
        }
    }

    /// Create a fetcher from configuration
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            search_path: config.search_path,
        }
    }

    /// Attempt to find `program` in PATH
    ///
    /// Returns `None` when the binary is not installed.
    pub fn from_path(program: &str, args: Vec<String>) -> Option<Self> {
        which::which(program).ok().map(|binary| Self {
            program: binary,
            args,
            search_path: false,
        })
    }

    /// Configured program
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one listing with placeholders substituted
    pub fn render_args(&self, url: &str, output_dir: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg == OUTPUT_DIR_PLACEHOLDER {
                    // keep non-UTF-8 directories intact
                    output_dir.as_os_str().to_os_string()
                } else {
                    arg.replace(URL_PLACEHOLDER, url)
                        .replace(OUTPUT_DIR_PLACEHOLDER, &output_dir.to_string_lossy())
                        .into()
                }
            })
            .collect()
    }

    fn resolve_program(&self) -> crate::Result<PathBuf> {
        if !self.search_path {
            return Ok(self.program.clone());
        }
        which::which(&self.program).map_err(|_| {
            Error::Fetch(FetchError::BinaryNotFound(
                self.program.display().to_string(),
            ))
        })
    }
}

#[async_trait]
impl ItemFetcher for CliFetcher {
    async fn fetch(&self, url: &str, output_dir: &Path) -> crate::Result<()> {
        let program = self.resolve_program()?;
        let args = self.render_args(url, output_dir);

        tracing::debug!(program = ?program, ?args, "running downloader");

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::Fetch(FetchError::Spawn {
                    program: program.clone(),
                    reason: e.to_string(),
                })
            })?;

        if output.status.success() {
            tracing::debug!(url, stdout_bytes = output.stdout.len(), "downloader finished");
            return Ok(());
        }

        match output.status.code() {
            Some(code) => Err(Error::Fetch(FetchError::NonZeroExit {
                url: url.to_string(),
                code,
                stderr: stderr_excerpt(&output.stderr),
            })),
            None => Err(Error::Fetch(FetchError::Terminated {
                url: url.to_string(),
            })),
        }
    }

    fn name(&self) -> &'static str {
        "cli"
    }
}

/// Trimmed tail of the child's stderr
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let total = text.chars().count();
    text.chars()
        .skip(total.saturating_sub(STDERR_EXCERPT_CHARS))
        .collect()
}
