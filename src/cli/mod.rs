pub mod explain;
pub mod fix;
pub mod serve;
pub mod testcases;
pub mod walkthrough;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::core::config::WingmanConfig;
use crate::core::schemas::LlmRequest;

#[derive(Parser)]
#[command(name = "wingman")]
#[command(about = "Your personal AI debugger: explains errors, suggests fixes and generates test cases")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to wingman.toml (defaults to ./wingman.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service the editor extension talks to
    Serve {
        /// Address to bind (overrides [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides [server].port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Explain an error message produced by a piece of code
    Explain {
        #[command(flatten)]
        source: SourceArgs,

        /// The error message the code produced
        #[arg(short, long)]
        error: String,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Suggest a fix for an error, or apply a requested change
    Fix {
        #[command(flatten)]
        source: SourceArgs,

        /// The error message the code produced
        #[arg(short, long, default_value = "")]
        error: String,

        /// What to change when the code has no error
        #[arg(short, long, default_value = "")]
        request: String,

        /// Write the fixed code back to FILE
        #[arg(long)]
        write: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Generate test cases for a piece of code
    Testcases {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of test cases to generate
        #[arg(short = 'n', long, default_value = "3")]
        count: u32,

        /// Optional explanation of what the code does
        #[arg(long)]
        explanation: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Walk through a piece of code segment by segment
    Walkthrough {
        #[command(flatten)]
        source: SourceArgs,

        /// Aspect of the code to focus on
        #[arg(long)]
        focus: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },
}

/// Where the code comes from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Source file to analyze, or `-` for stdin
    pub file: PathBuf,

    /// Language of the code (inferred from the file extension by default)
    #[arg(short, long)]
    pub language: Option<String>,
}

impl SourceArgs {
    pub fn is_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }

    /// Read the code and resolve its language.
    pub fn read(&self) -> Result<(String, String)> {
        let code = if self.is_stdin() {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read code from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&self.file)
                .with_context(|| format!("Failed to read {}", self.file.display()))?
        };

        if code.trim().is_empty() {
            anyhow::bail!(
                "No code to analyze in {}",
                if self.is_stdin() {
                    "stdin".to_string()
                } else {
                    self.file.display().to_string()
                }
            );
        }

        let language = self
            .language
            .clone()
            .or_else(|| infer_language(&self.file).map(str::to_string))
            .unwrap_or_else(|| "python".to_string());

        Ok((code, language))
    }
}

/// Which provider/model to use, overriding the config's `[model]` section
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// LLM provider: ollama or google
    #[arg(long)]
    pub provider: Option<String>,

    /// Model identifier, e.g. gemma:7b or gemini-2.0-flash
    #[arg(long)]
    pub model: Option<String>,

    /// API key for hosted providers (otherwise read from [google].key_env)
    #[arg(long)]
    pub api_key: Option<String>,
}

impl ModelArgs {
    pub fn llm_request(&self, config: &WingmanConfig) -> LlmRequest {
        LlmRequest {
            provider: self
                .provider
                .clone()
                .unwrap_or_else(|| config.model.provider.clone()),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| config.model.model.clone()),
            api_key: self.api_key.clone().or_else(|| config.resolve_api_key()),
        }
    }
}

/// Map a file extension to the language tag the editor would report.
pub fn infer_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "py" => "python",
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "jsx" => "javascriptreact",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "sh" | "bash" => "shellscript",
        _ => return None,
    };
    Some(language)
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = WingmanConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Serve { host, port } => serve::run(config, host, port).await,
            Commands::Explain {
                source,
                error,
                model,
            } => explain::run(&config, source, error, model).await,
            Commands::Fix {
                source,
                error,
                request,
                write,
                model,
            } => fix::run(&config, source, error, request, write, model).await,
            Commands::Testcases {
                source,
                count,
                explanation,
                model,
            } => testcases::run(&config, source, count, explanation, model).await,
            Commands::Walkthrough {
                source,
                focus,
                model,
            } => walkthrough::run(&config, source, focus, model).await,
        }
    }
}
