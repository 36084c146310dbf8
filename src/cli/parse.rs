//! CLI parse: clap types for fieldpipe. No behavior; definitions only.

use crate::template::TemplateKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// fieldpipe - resolve API fields through mapping-template pipelines
#[derive(Parser, Debug)]
#[command(name = "fieldpipe")]
#[command(about = "Resolve API fields through mapping-template pipelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file layered over the workspace configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one field and print its response
    Invoke {
        /// Parent type, e.g. Mutation
        type_name: String,
        /// Field name, e.g. createArticle
        field_name: String,
        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
        /// Parent object as JSON (for nested fields such as Article.comments)
        #[arg(long)]
        source: Option<String>,
    },
    /// List bound fields and their step chains
    Fields {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Parse a template file and report the first error
    CheckTemplate {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "request")]
        kind: TemplateKindArg,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKindArg {
    Request,
    Response,
}

impl From<TemplateKindArg> for TemplateKind {
    fn from(kind: TemplateKindArg) -> Self {
        match kind {
            TemplateKindArg::Request => TemplateKind::Request,
            TemplateKindArg::Response => TemplateKind::Response,
        }
    }
}
