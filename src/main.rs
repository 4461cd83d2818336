use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use rustyline::{Context, Helper};
use shlex::Shlex;
use std::sync::{Arc, Mutex, PoisonError};
use std::{fs, path::PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod login;
mod remote;

use config::Credentials;
use remote::cache::PathCache;
use remote::client::HttpVaultClient;
use remote::path::{basename, resolve, resolve_dir};
use remote::rm::{DeleteRequest, ToolResult, TRASH_DIR};

#[derive(Parser, Debug)]
#[command(name = "shellvault")]
#[command(about = "Shell for an Obsidian vault served by the Local REST API plugin")]
#[command(version)]
struct Args {
    /// Base URL of the Local REST API
    #[arg(long, env = "SHELLVAULT_URL")]
    url: Option<String>,

    /// API key shown in the plugin settings
    #[arg(long, env = "SHELLVAULT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Accept the plugin's self-signed HTTPS certificate
    #[arg(long)]
    insecure: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run a single command and exit, e.g. `shellvault -- rm -y notes/a.md`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    init_tracing(args.verbose);

    let command = std::mem::take(&mut args.command);
    let one_shot = !command.is_empty();
    let mut shell = Shell::new(args, !one_shot)?;

    if one_shot {
        return shell.dispatch_parts(command).await;
    }

    println!("{}", "shellvault".bold());
    println!("Type 'help' for commands.");
    shell.run().await
}

/// Log to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shellvault={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct Shell {
    rl: Editor<VaultCompleter, DefaultHistory>,
    local_cwd: PathBuf,
    /// Current vault folder: `""` for the root, otherwise ends with `/`.
    remote_cwd: String,
    url: Option<String>,
    api_key: Option<String>,
    insecure: bool,
    client: Option<Arc<HttpVaultClient>>,
    cache: Arc<PathCache>,
    warm_cache: bool,
    completer_remote_cwd: Arc<Mutex<String>>,
}

fn expand_local_path(input: &str) -> PathBuf {
    if input.is_empty() {
        return PathBuf::from(input);
    }

    if let Some(home) = dirs::home_dir() {
        if input == "~" {
            return home;
        }
        if let Some(rest) = input.strip_prefix("~/") {
            return home.join(rest);
        }
        if let Some(rest) = input.strip_prefix("$HOME") {
            return PathBuf::from(format!("{}{}", home.display(), rest));
        }
    }

    PathBuf::from(input)
}

#[derive(Debug, Default, PartialEq)]
struct RmArgs {
    path: String,
    permanent: bool,
    yes: bool,
    json: bool,
}

fn parse_rm_args(args: &[String]) -> Result<RmArgs> {
    let mut parsed = RmArgs::default();
    for arg in args {
        match arg.as_str() {
            "-p" | "--permanent" => parsed.permanent = true,
            "-y" | "--yes" => parsed.yes = true,
            "--json" => parsed.json = true,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                anyhow::bail!("Unknown option for rm: {}", flag)
            }
            path => {
                if !parsed.path.is_empty() {
                    anyhow::bail!("Usage: rm [-p|--permanent] [-y|--yes] [--json] <path>");
                }
                parsed.path = path.to_string();
            }
        }
    }
    Ok(parsed)
}

impl Shell {
    fn new(args: Args, warm_cache: bool) -> Result<Self> {
        let completer_remote_cwd = Arc::new(Mutex::new(String::new()));
        let cache = Arc::new(PathCache::new());
        let completer = VaultCompleter::new(Arc::clone(&completer_remote_cwd), Arc::clone(&cache));
        let mut rl = Editor::<VaultCompleter, _>::new()?;
        rl.set_helper(Some(completer));

        Ok(Self {
            rl,
            local_cwd: std::env::current_dir()?,
            remote_cwd: String::new(),
            url: args.url,
            api_key: args.api_key,
            insecure: args.insecure,
            client: None,
            cache,
            warm_cache,
            completer_remote_cwd,
        })
    }

    async fn run(&mut self) -> Result<()> {
        loop {
            let prompt = format!(
                "{} ",
                format!("vault:/{}>", self.remote_cwd.trim_end_matches('/')).blue()
            );
            let line = self.rl.readline(&prompt);
            match line {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        self.rl.add_history_entry(line)?;
                    }
                    if let Err(e) = self.dispatch(line).await {
                        eprintln!("{} {:#}", "Error:".red(), e);
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted) => continue,
                Err(rustyline::error::ReadlineError::Eof) => {
                    println!("bye");
                    break;
                }
                Err(err) => {
                    eprintln!("Readline error: {}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, line: &str) -> Result<()> {
        let parts = Shlex::new(line).collect::<Vec<_>>();
        self.dispatch_parts(parts).await
    }

    async fn dispatch_parts(&mut self, mut parts: Vec<String>) -> Result<()> {
        if parts.is_empty() {
            return Ok(());
        }

        let cmd = parts.remove(0);
        match cmd.as_str() {
            "help" => self.cmd_help(),
            "exit" | "quit" => {
                println!("Bye.");
                std::process::exit(0);
            }
            "login" => self.cmd_login().await?,
            "pwd" => println!("/{}", self.remote_cwd),
            "ls" => self.cmd_ls(parts).await?,
            "cd" => self.cmd_cd(parts).await?,
            "find" => self.cmd_find(parts).await?,
            "cat" => self.cmd_cat(parts).await?,
            "lls" => self.cmd_lls(parts)?,
            "lcd" => self.cmd_lcd(parts)?,
            "lpwd" => println!("{}", self.local_cwd.display()),
            "put" => self.cmd_put(parts).await?,
            "get" => self.cmd_get(parts).await?,
            "cp" => self.cmd_cp(parts).await?,
            "mv" => self.cmd_mv(parts).await?,
            "rm" => self.cmd_rm(parts).await?,
            _ => println!("Unknown command: {}", cmd),
        }
        Ok(())
    }

    /// Build the vault client on first use and keep it for the session.
    fn ensure_client(&mut self) -> Result<Arc<HttpVaultClient>> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }

        let saved = Credentials::load()?;
        let credentials = Credentials::resolve(
            self.url.as_deref(),
            self.api_key.as_deref(),
            self.insecure,
            saved,
        )?;
        let client = Arc::new(HttpVaultClient::new(&credentials)?);
        debug!(url = %credentials.base_url, "vault client ready");
        self.client = Some(Arc::clone(&client));
        self.spawn_cache_warmup(&client);
        Ok(client)
    }

    /// Index the vault in the background so tab completion has paths to offer.
    fn spawn_cache_warmup(&self, client: &Arc<HttpVaultClient>) {
        if !self.warm_cache {
            return;
        }
        let client = Arc::clone(client);
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            if let Err(e) = cache.files(&*client).await {
                debug!(error = %e, "background vault indexing failed");
            }
        });
    }

    /// Keep the auto-completer aware of the current remote folder.
    fn sync_completer_remote_cwd(&self) {
        let mut guard = self
            .completer_remote_cwd
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = self.remote_cwd.clone();
    }

    fn cmd_help(&self) {
        println!("{}", "Available commands:".blue());
        println!("  login                     Save server URL and API key");
        println!("  ls [path]                 List a vault folder");
        println!("  cd <path>                 Change vault folder (supports .. and /)");
        println!("  pwd                       Show vault folder");
        println!("  find <text>               Search file paths in the vault");
        println!("  cat <path>                Print a note");
        println!("  put <file> [path]         Upload a local file");
        println!("  get <path> [file]         Download a note");
        println!("  cp <path> <to>            Copy a note (folder targets end with /)");
        println!("  mv <path> <to>            Move/rename a note");
        println!(
            "  rm [-p] [-y] <path>       Move a note to {} (-p: delete permanently)",
            TRASH_DIR
        );
        println!("  lls / lcd / lpwd          Local file ops");
        println!("  exit / quit               Exit");
    }

    async fn cmd_login(&mut self) -> Result<()> {
        let credentials = login::login(self.url.as_deref()).await?;
        let client = Arc::new(HttpVaultClient::new(&credentials)?);
        self.client = Some(Arc::clone(&client));
        self.cache.invalidate();
        self.spawn_cache_warmup(&client);
        Ok(())
    }

    async fn cmd_ls(&mut self, args: Vec<String>) -> Result<()> {
        let client = self.ensure_client()?;
        let target = args.first().map(|s| s.as_str()).unwrap_or(".");
        let dir = resolve_dir(&self.remote_cwd, target);
        remote::ls::list_remote_files(&*client, &dir).await?;
        Ok(())
    }

    async fn cmd_cd(&mut self, args: Vec<String>) -> Result<()> {
        let Some(target) = args.first() else {
            anyhow::bail!("Usage: cd <folder>");
        };
        let client = self.ensure_client()?;
        let dir = resolve_dir(&self.remote_cwd, target);
        if !remote::ls::folder_exists(&*client, &dir).await? {
            anyhow::bail!("Folder not found: {}", target);
        }
        self.remote_cwd = dir;
        self.sync_completer_remote_cwd();
        Ok(())
    }

    async fn cmd_find(&mut self, args: Vec<String>) -> Result<()> {
        if args.is_empty() {
            anyhow::bail!("Usage: find <text>");
        }
        let client = self.ensure_client()?;
        let query = args.join(" ");
        remote::find::find_files(&*client, &self.cache, &query).await?;
        Ok(())
    }

    async fn cmd_cat(&mut self, args: Vec<String>) -> Result<()> {
        let Some(target) = args.first() else {
            anyhow::bail!("Usage: cat <path>");
        };
        let client = self.ensure_client()?;
        let path = resolve(&self.remote_cwd, target);
        remote::get::cat_file(&*client, &path).await?;
        Ok(())
    }

    fn cmd_lls(&self, args: Vec<String>) -> Result<()> {
        let path = if args.is_empty() {
            self.local_cwd.clone()
        } else {
            expand_local_path(&args[0])
        };
        let mut entries = fs::read_dir(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());
        for e in entries {
            let name = e.file_name().to_string_lossy().to_string();
            if e.file_type()?.is_dir() {
                println!("{}/", name.blue());
            } else {
                println!("{}", name);
            }
        }
        Ok(())
    }

    fn cmd_lcd(&mut self, args: Vec<String>) -> Result<()> {
        if args.is_empty() {
            anyhow::bail!("Usage: lcd <dir>");
        }
        let path = expand_local_path(&args[0]);
        std::env::set_current_dir(&path)
            .with_context(|| format!("Cannot change to {}", path.display()))?;
        self.local_cwd = std::env::current_dir()?;
        Ok(())
    }

    async fn cmd_put(&mut self, args: Vec<String>) -> Result<()> {
        if args.is_empty() {
            anyhow::bail!("Usage: put <local_file> [vault_path]");
        }
        let local_path = expand_local_path(&args[0]);
        if !local_path.is_file() {
            anyhow::bail!("Local file not found: {}", local_path.display());
        }
        let file_name = local_path
            .file_name()
            .context("Invalid filename")?
            .to_string_lossy()
            .to_string();
        let target = match args.get(1) {
            Some(target) => resolve(&self.remote_cwd, target),
            None => self.remote_cwd.clone(),
        };
        let remote_path = remote::cp::destination(&file_name, &target);

        let client = self.ensure_client()?;
        let sent =
            remote::put::put_file(&*client, &self.cache, &local_path, &remote_path).await?;
        println!("✅ Uploaded '{}' to '{}' ({} bytes)", file_name, remote_path, sent);
        Ok(())
    }

    async fn cmd_get(&mut self, args: Vec<String>) -> Result<()> {
        if args.is_empty() {
            anyhow::bail!("Usage: get <vault_path> [local_path]");
        }
        let remote_path = resolve(&self.remote_cwd, &args[0]);
        let file_name = basename(&remote_path).to_string();
        let local_path = if args.len() >= 2 {
            let provided = expand_local_path(&args[1]);
            if provided.is_dir() {
                provided.join(&file_name)
            } else {
                provided
            }
        } else {
            self.local_cwd.join(&file_name)
        };

        if local_path.exists() {
            anyhow::bail!("Local file already exists: {}", local_path.display());
        }

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                anyhow::bail!("Local directory does not exist: {}", parent.display());
            }
        }

        let client = self.ensure_client()?;
        let written = remote::get::get_file(&*client, &remote_path, &local_path).await?;
        println!("✅ Saved to {} ({} bytes)", local_path.display(), written);
        Ok(())
    }

    async fn cmd_cp(&mut self, args: Vec<String>) -> Result<()> {
        if args.len() < 2 {
            anyhow::bail!("Usage: cp <path> <target>");
        }
        let src = resolve(&self.remote_cwd, &args[0]);
        let dst = resolve(&self.remote_cwd, &args[1]);
        let client = self.ensure_client()?;
        let dst = remote::cp::copy_file(&*client, &self.cache, &src, &dst).await?;
        println!("✅ Copied '{}' to '{}'", src, dst);
        Ok(())
    }

    async fn cmd_mv(&mut self, args: Vec<String>) -> Result<()> {
        if args.len() < 2 {
            anyhow::bail!("Usage: mv <path> <target>");
        }
        let src = resolve(&self.remote_cwd, &args[0]);
        let dst = resolve(&self.remote_cwd, &args[1]);
        let client = self.ensure_client()?;
        let dst = remote::mv::move_file(&*client, &self.cache, &src, &dst).await?;
        println!("✅ Moved '{}' to '{}'", src, dst);
        Ok(())
    }

    async fn cmd_rm(&mut self, args: Vec<String>) -> Result<()> {
        let args = parse_rm_args(&args)?;
        let mut request = DeleteRequest {
            path: String::new(),
            confirm: args.yes,
            permanent: args.permanent,
        };
        if !args.path.is_empty() {
            request.path = resolve(&self.remote_cwd, &args.path);
        }

        let result = if let Err(e) = request.validate_path() {
            ToolResult::Failure(e.message())
        } else {
            let client = self.ensure_client()?;
            if !request.confirm {
                request.confirm = self.confirm_delete(&request.path, request.permanent);
            }
            remote::rm::delete_file(&*client, &self.cache, &request).await
        };
        debug!(path = %request.path, success = result.is_success(), "rm finished");

        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
        match result {
            ToolResult::Success(data) => {
                match data["trash_location"].as_str() {
                    Some(trash) => println!("🗑️  Moved '{}' to '{}'", request.path, trash),
                    None => println!("🗑️  Permanently deleted '{}'", request.path),
                }
                Ok(())
            }
            ToolResult::Failure(message) => Err(anyhow::anyhow!(message)),
        }
    }

    fn confirm_delete(&mut self, path: &str, permanent: bool) -> bool {
        let question = if permanent {
            format!("Permanently delete '{}'? This cannot be undone. (y/N): ", path)
        } else {
            format!("Move '{}' to {}? (y/N): ", path, TRASH_DIR)
        };
        match self.rl.readline(&question.yellow().to_string()) {
            Ok(answer) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }
}

const COMMANDS: &[&str] = &[
    "ls", "cd", "pwd", "find", "cat", "put", "get", "cp", "mv", "rm", "lls", "lcd", "lpwd",
    "login", "help", "exit",
];

#[derive(Clone)]
struct VaultCompleter {
    remote_cwd: Arc<Mutex<String>>,
    cache: Arc<PathCache>,
}

impl VaultCompleter {
    fn new(remote_cwd: Arc<Mutex<String>>, cache: Arc<PathCache>) -> Self {
        Self { remote_cwd, cache }
    }

    /// Remote candidates from the cached index only; completion never waits on the network.
    fn remote_pairs(&self, current: &str, dirs_only: bool) -> Vec<Pair> {
        let Some(files) = self.cache.cached() else {
            return vec![];
        };
        let cwd = self
            .remote_cwd
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        remote_path_pairs(&files, &cwd, current, dirs_only)
    }
}

impl Completer for VaultCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        let mut parts: Vec<&str> = input.split_whitespace().collect();
        let trailing_ws = input
            .chars()
            .last()
            .map(|c| c.is_whitespace())
            .unwrap_or(false);
        if trailing_ws {
            parts.push("");
        }

        if parts.len() <= 1 {
            return Ok((0, command_pairs(parts.first().copied().unwrap_or(""))));
        }

        let cmd = parts[0];
        let arg_index = parts.len() - 1;
        let current = *parts.last().unwrap_or(&"");
        let start = input
            .rfind(|c: char| c.is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(0);

        let pairs = match cmd {
            "rm" | "cat" | "get" if !current.starts_with('-') => {
                if cmd == "get" && arg_index > 1 {
                    collect_local_pairs(current)
                } else {
                    self.remote_pairs(current, false)
                }
            }
            "cp" | "mv" => {
                let mut result = self.remote_pairs(current, arg_index > 1);
                if arg_index > 1 {
                    result.extend(special_remote_targets(current));
                }
                result
            }
            "ls" | "cd" => {
                let mut result = self.remote_pairs(current, true);
                result.extend(special_remote_targets(current));
                result
            }
            "put" if arg_index > 1 => self.remote_pairs(current, true),
            "put" | "lls" | "lcd" => collect_local_pairs(current),
            _ => vec![],
        };

        Ok((start, pairs))
    }
}

use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;

impl Helper for VaultCompleter {}

impl Hinter for VaultCompleter {
    type Hint = String;
}

impl Highlighter for VaultCompleter {}

impl Validator for VaultCompleter {}

fn command_pairs(prefix: &str) -> Vec<Pair> {
    COMMANDS
        .iter()
        .filter(|c| c.starts_with(prefix))
        .map(|c| Pair {
            display: c.to_string(),
            replacement: c.to_string(),
        })
        .collect()
}

/// Completions for a partially typed vault path, one path segment at a time.
fn remote_path_pairs(files: &[String], cwd: &str, current: &str, dirs_only: bool) -> Vec<Pair> {
    let (base, typed) = match current.strip_prefix('/') {
        Some(rest) => ("", rest),
        None => (cwd, current),
    };
    let full = format!("{}{}", base, typed);

    let mut candidates: Vec<String> = Vec::new();
    for file in files {
        let Some(rest) = file.strip_prefix(&full) else {
            continue;
        };
        let segment = match rest.find('/') {
            Some(idx) => &rest[..=idx],
            None if dirs_only => continue,
            None => rest,
        };
        let candidate = format!("{}{}", current, segment);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates.sort();
    candidates
        .into_iter()
        .map(|c| Pair {
            display: c.clone(),
            replacement: c,
        })
        .collect()
}

fn collect_local_pairs(prefix: &str) -> Vec<Pair> {
    let prefix = match prefix {
        "~" => "~/",
        "$HOME" => "$HOME/",
        other => other,
    };

    let (dir_part, file_part) = match prefix.rfind('/') {
        Some(idx) => (&prefix[..idx + 1], &prefix[idx + 1..]),
        None => ("", prefix),
    };

    let dir_for_fs = if dir_part.is_empty() {
        ".".to_string()
    } else if dir_part == "/" {
        "/".to_string()
    } else {
        dir_part.trim_end_matches('/').to_string()
    };

    let mut pairs = Vec::new();
    if let Ok(read_dir) = fs::read_dir(expand_local_path(&dir_for_fs)) {
        for entry in read_dir.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(file_part) {
                continue;
            }
            let mut replacement = format!("{}{}", dir_part, name);
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                replacement.push('/');
            }
            pairs.push(Pair {
                display: replacement.clone(),
                replacement,
            });
        }
    }
    pairs.sort_by(|a, b| a.replacement.cmp(&b.replacement));
    pairs
}

fn special_remote_targets(prefix: &str) -> Vec<Pair> {
    ["..", "../", ".", "./", "/"]
        .iter()
        .filter(|s| s.starts_with(prefix))
        .map(|s| Pair {
            display: s.to_string(),
            replacement: s.to_string(),
        })
        .collect()
}
