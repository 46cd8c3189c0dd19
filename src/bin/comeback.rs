use clap::{Args, Parser, Subcommand};
use colored::*;
use comeback_buddy::api::Server;
use comeback_buddy::comeback::{generate_comeback, ComebackRequest, Intensity, Tone};
use comeback_buddy::config::{self, Settings};
use comeback_buddy::secret_store::SecretStore;
use spinners::{Spinner, Spinners};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

/// Command line arguments for the comeback CLI
#[derive(Parser)]
#[command(
    name = "comeback",
    version,
    about = "Turn a chat snippet into a witty comeback with a matching GIF"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    keys: KeyArgs,
}

/// Provider settings shared by every command
#[derive(Args)]
struct KeyArgs {
    /// OpenAI API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Giphy API key
    #[arg(long, global = true, env = "GIPHY_API_KEY", hide_env_values = true)]
    giphy_api_key: Option<String>,

    /// OpenAI model to use
    #[arg(long, global = true, env = "COMEBACK_MODEL")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web form and JSON API
    Serve {
        /// Address to bind to
        #[arg(long, env = "COMEBACK_ADDR", default_value = config::DEFAULT_ADDR)]
        addr: String,

        /// Bearer token required by the JSON API
        #[arg(long, env = "COMEBACK_AUTH_KEY", hide_env_values = true)]
        auth_key: Option<String>,
    },
    /// Generate one comeback; the snippet is read from stdin when not given
    Generate {
        /// Chat snippet to respond to
        snippet: Option<String>,

        /// Comeback style
        #[arg(long, default_value = "witty")]
        tone: Tone,

        /// Comeback intensity
        #[arg(long, default_value = "low-key")]
        intensity: Intensity,

        /// Also write the Markdown to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Store a secret, e.g. `comeback set GIPHY_API_KEY <key>`
    Set { key: String, value: String },
    /// Print a stored secret
    Get { key: String },
    /// Delete a stored secret
    Delete { key: String },
}

impl KeyArgs {
    fn settings(self) -> Settings {
        let mut settings = Settings {
            openai_api_key: self.openai_api_key,
            giphy_api_key: self.giphy_api_key,
            openai_base_url: self.base_url,
            timeout_seconds: self.timeout,
            ..Settings::default()
        };
        if let Some(model) = self.model {
            settings.model = model;
        }
        match SecretStore::new() {
            Ok(store) => settings.with_store(&store),
            Err(e) => {
                log::debug!("secret store unavailable: {e}");
                settings
            }
        }
    }
}

fn read_snippet(snippet: Option<String>) -> io::Result<String> {
    if let Some(s) = snippet {
        return Ok(s);
    }
    let mut input = String::new();
    if !io::stdin().is_terminal() {
        io::stdin().read_to_string(&mut input)?;
    }
    Ok(input)
}

/// Writes the transcript to `out` followed by a newline.
///
/// stdout may be redirected to a `.md` file, so nothing else goes here; the
/// spinner and status lines use stderr.
fn write_markdown(out: &mut impl Write, markdown: &str) -> io::Result<()> {
    writeln!(out, "{markdown}")?;
    out.flush()
}

/// Main entry point for the comeback CLI
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    comeback_buddy::init_logging();
    let args = CliArgs::parse();

    match args.command {
        Command::Set { key, value } => {
            let mut store = SecretStore::new()?;
            store.set(&key, &value)?;
            println!("{} Secret '{}' has been set.", "✓".bright_green(), key);
        }
        Command::Get { key } => {
            let store = SecretStore::new()?;
            match store.get(&key) {
                Some(value) => println!("{key}: {value}"),
                None => println!("{} Secret '{}' not found", "!".bright_yellow(), key),
            }
        }
        Command::Delete { key } => {
            let mut store = SecretStore::new()?;
            store.delete(&key)?;
            println!("{} Secret '{}' has been deleted.", "✓".bright_green(), key);
        }
        Command::Serve { addr, auth_key } => {
            let mut settings = args.keys.settings();
            settings.addr = addr;
            if auth_key.is_some() {
                settings.auth_key = auth_key;
            }

            let agent = settings.build_agent()?;
            let mut server = Server::new(agent);
            if let Some(key) = &settings.auth_key {
                server = server.with_auth_key(key);
            }

            println!(
                "{} {}",
                "💬 Chat Comeback Buddy Bot on".bright_cyan(),
                format!("http://{}", settings.addr).bright_green()
            );
            server.run(&settings.addr).await?;
        }
        Command::Generate {
            snippet,
            tone,
            intensity,
            output,
        } => {
            let settings = args.keys.settings();
            let request = ComebackRequest::new(read_snippet(snippet)?, tone, intensity);
            if let Err(e) = request.validate() {
                eprintln!("{} {}", "Error:".bright_red(), e);
                std::process::exit(2);
            }

            let agent = settings.build_agent()?;
            let spinner = io::stderr().is_terminal().then(|| {
                Spinner::new(
                    Spinners::Dots12,
                    "Generating a snappy comeback...".bright_magenta().to_string(),
                )
            });
            let result = generate_comeback(&agent, &request).await;
            if let Some(mut sp) = spinner {
                sp.stop();
                eprint!("\r\x1B[K");
            }

            match result {
                Ok(run) => {
                    write_markdown(&mut io::stdout().lock(), &run.content)?;
                    if let Some(path) = output {
                        write_markdown(&mut std::fs::File::create(&path)?, &run.content)?;
                        eprintln!("{} Saved to {}", "✓".bright_green(), path.display());
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
