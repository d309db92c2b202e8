use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::api::types::{ResponseType, SortOrder, UnifiedSearchRequest};

/// Sort order accepted on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    #[default]
    Relevance,
    DateAsc,
    DateDesc,
    TitleAsc,
    TitleDesc,
}

impl SortArg {
    pub fn order(self) -> Option<SortOrder> {
        match self {
            Self::Relevance => None,
            Self::DateAsc => Some(SortOrder::DateAsc),
            Self::DateDesc => Some(SortOrder::DateDesc),
            Self::TitleAsc => Some(SortOrder::TitleAsc),
            Self::TitleDesc => Some(SortOrder::TitleDesc),
        }
    }
}

/// Sources for the unified search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// National laws and local ordinances
    #[default]
    All,
    /// National laws only
    Nlic,
    /// Local ordinances only
    Elis,
}

fn parse_date(value: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map(|_| value.to_string())
        .map_err(|_| format!("'{}' is not a YYYYMMDD date", value))
}

/// Paging, sorting and date options shared by every search
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Results per page
    #[arg(short = 's', long, default_value_t = 10)]
    pub size: u32,

    /// Sort order
    #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
    pub sort: SortArg,

    /// Date range start (YYYYMMDD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<String>,

    /// Date range end (YYYYMMDD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<String>,

    /// Request XML instead of JSON from the server
    #[arg(long)]
    pub xml: bool,
}

impl PageArgs {
    /// Build the search request for `query`; filters are set by the caller
    pub fn request(&self, query: String) -> UnifiedSearchRequest {
        UnifiedSearchRequest {
            query,
            page_no: self.page,
            page_size: self.size,
            response_type: if self.xml {
                ResponseType::Xml
            } else {
                ResponseType::Json
            },
            date_from: self.from.clone(),
            date_to: self.to.clone(),
            sort: self.sort.order(),
            ..Default::default()
        }
    }
}

/// Law command arguments
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct LawArgs {
    #[command(subcommand)]
    pub command: Option<LawCommand>,

    /// Search query
    pub query: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Law type filter (법률, 대통령령...)
    #[arg(short = 't', long = "type")]
    pub law_type: Option<String>,

    /// Department filter (소관부처)
    #[arg(short = 'd', long)]
    pub department: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LawCommand {
    /// Get law details
    Detail {
        /// Law ID
        id: String,
    },

    /// Get law revision history
    History {
        /// Law ID
        id: String,
    },
}

/// Detail lookup shared by the other document kinds
#[derive(Subcommand, Debug)]
pub enum DetailCommand {
    /// Get document details
    Detail {
        /// Document ID
        id: String,
    },
}

/// Ordinance command arguments
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct OrdinanceArgs {
    #[command(subcommand)]
    pub command: Option<DetailCommand>,

    /// Search query
    pub query: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Local government filter
    #[arg(short = 'r', long)]
    pub region: Option<String>,

    /// Ordinance type filter (조례, 규칙...)
    #[arg(short = 't', long = "type")]
    pub law_type: Option<String>,
}

/// Precedent command arguments
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct PrecedentArgs {
    #[command(subcommand)]
    pub command: Option<DetailCommand>,

    /// Search query
    pub query: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Court filter
    #[arg(short = 'd', long, alias = "court")]
    pub department: Option<String>,
}

/// Administrative rule command arguments
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AdmruleArgs {
    #[command(subcommand)]
    pub command: Option<DetailCommand>,

    /// Search query
    pub query: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Rule type filter (훈령, 예규, 고시...)
    #[arg(short = 't', long = "type")]
    pub law_type: Option<String>,

    /// Department filter
    #[arg(short = 'd', long)]
    pub department: Option<String>,
}

/// Legal interpretation command arguments
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct InterpretationArgs {
    #[command(subcommand)]
    pub command: Option<DetailCommand>,

    /// Search query
    pub query: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Inquiring agency filter
    #[arg(short = 'd', long)]
    pub department: Option<String>,
}

/// Unified search command arguments
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    #[command(flatten)]
    pub page: PageArgs,

    /// Sources to search
    #[arg(short = 'S', long, value_enum, default_value_t = SourceArg::All)]
    pub source: SourceArg,

    /// Local government filter
    #[arg(short = 'r', long)]
    pub region: Option<String>,

    /// Law type filter
    #[arg(short = 't', long = "type")]
    pub law_type: Option<String>,

    /// Department filter
    #[arg(short = 'd', long)]
    pub department: Option<String>,
}

/// Configuration command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., law.key)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// List every configuration key
    List,

    /// Show configuration file path
    Path,

    /// Initialize configuration
    Init,
}
