use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use challenge_hub_core::{
    annotate, apply_with, classify, days_left, estimate, parse_instant, summarize, Annotated,
    ChallengeRecord, DerivedStatus, FilterParams, FlagTally, GroupRecord, Listing,
    ListingSummary, ParticipationRecord, RewardRecord, SortKey, StatusFilter, UserRecord,
    Vocabulary, ALL_CATEGORIES,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

#[derive(Debug, Parser)]
#[command(name = "chub")]
#[command(about = "Challenge Hub snapshot inspector")]
struct Cli {
    /// Reference time as RFC3339 UTC; defaults to the current time.
    #[arg(long)]
    now: Option<String>,

    /// YAML file replacing the built-in category vocabulary.
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search, filter and sort a snapshot, with counts.
    List(ListArgs),
    /// Derive the lifecycle status of a time span.
    Classify(ClassifyArgs),
    /// Estimate completion from a score or a time span.
    Progress(ProgressArgs),
    /// Resolve a raw category and optionally test it against a filter.
    Category(CategoryArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Challenges,
    Participations,
    Users,
    Groups,
    Rewards,
}

impl KindArg {
    fn as_str(self) -> &'static str {
        match self {
            Self::Challenges => "challenges",
            Self::Participations => "participations",
            Self::Users => "users",
            Self::Groups => "groups",
            Self::Rewards => "rewards",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    All,
    Upcoming,
    Active,
    Completed,
}

impl StatusArg {
    fn into_filter(self) -> StatusFilter {
        match self {
            Self::All => StatusFilter::All,
            Self::Upcoming => StatusFilter::Only(DerivedStatus::Upcoming),
            Self::Active => StatusFilter::Only(DerivedStatus::Active),
            Self::Completed => StatusFilter::Only(DerivedStatus::Completed),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Recent,
    Popular,
    Alphabetical,
}

impl SortArg {
    fn into_sort_key(self) -> SortKey {
        match self {
            Self::Recent => SortKey::Recent,
            Self::Popular => SortKey::Popular,
            Self::Alphabetical => SortKey::Alphabetical,
        }
    }
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(value_enum)]
    kind: KindArg,
    /// Snapshot file: a JSON array, or an object with a `data` array.
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value = ALL_CATEGORIES)]
    category: String,
    #[arg(long, value_enum, default_value = "all")]
    status: StatusArg,
    #[arg(long, value_enum, default_value = "recent")]
    sort: SortArg,
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
}

#[derive(Debug, Args)]
struct ProgressArgs {
    #[arg(long)]
    score: Option<f64>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
}

#[derive(Debug, Args)]
struct CategoryArgs {
    raw: Option<String>,
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Snapshot<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Snapshot<T> {
    fn into_records(self) -> Vec<T> {
        match self {
            Self::Bare(records) | Self::Wrapped { data: records } => records,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListingOutput<'a, T> {
    kind: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    now: OffsetDateTime,
    params: &'a FilterParams,
    shown: usize,
    total: usize,
    items: Vec<Annotated<'a, T>>,
    stats: ListingSummary,
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let now = parse_optional_rfc3339(cli.now.as_deref())?;
    let vocabulary = load_vocabulary(cli.vocabulary.as_deref())?;
    tracing::debug!(now = %now, "resolved reference time");

    match cli.command {
        Command::List(args) => run_list(&args, &vocabulary, now),
        Command::Classify(args) => run_classify(&args, now),
        Command::Progress(args) => run_progress(&args, now),
        Command::Category(args) => run_category(&args, &vocabulary),
    }
}

fn run_list(args: &ListArgs, vocabulary: &Vocabulary, now: OffsetDateTime) -> Result<()> {
    let params = FilterParams {
        search_text: args.search.clone(),
        category: args.category.clone(),
        status: args.status.into_filter(),
        sort: args.sort.into_sort_key(),
    };

    match args.kind {
        KindArg::Challenges => {
            run_listing::<ChallengeRecord>(args.kind, &args.input, &params, vocabulary, now)
        }
        KindArg::Participations => {
            run_listing::<ParticipationRecord>(args.kind, &args.input, &params, vocabulary, now)
        }
        KindArg::Users => run_listing::<UserRecord>(args.kind, &args.input, &params, vocabulary, now),
        KindArg::Groups => {
            run_listing::<GroupRecord>(args.kind, &args.input, &params, vocabulary, now)
        }
        KindArg::Rewards => {
            run_listing::<RewardRecord>(args.kind, &args.input, &params, vocabulary, now)
        }
    }
}

fn run_listing<T>(
    kind: KindArg,
    input: &Path,
    params: &FilterParams,
    vocabulary: &Vocabulary,
    now: OffsetDateTime,
) -> Result<()>
where
    T: DeserializeOwned + Serialize + Listing + FlagTally,
{
    let records = read_snapshot::<T>(input)?;
    let shown = apply_with(&records, params, vocabulary, now);
    let stats = summarize(&records, &shown, vocabulary, now);
    let output = ListingOutput {
        kind: kind.as_str(),
        now,
        params,
        shown: shown.len(),
        total: records.len(),
        items: annotate(shown.iter().copied(), vocabulary, now),
        stats,
    };

    emit_json(serde_json::to_value(&output).context("failed to serialize listing")?)
}

fn run_classify(args: &ClassifyArgs, now: OffsetDateTime) -> Result<()> {
    let start = parse_optional_instant("start", args.start.as_deref())?;
    let end = parse_optional_instant("end", args.end.as_deref())?;

    emit_json(serde_json::json!({
        "now": format_rfc3339(now)?,
        "start": start.map(format_rfc3339).transpose()?,
        "end": end.map(format_rfc3339).transpose()?,
        "status": classify(start, end, now).as_str(),
        "days_left": days_left(end, now),
    }))
}

fn run_progress(args: &ProgressArgs, now: OffsetDateTime) -> Result<()> {
    let start = parse_optional_instant("start", args.start.as_deref())?;
    let end = parse_optional_instant("end", args.end.as_deref())?;

    emit_json(serde_json::json!({
        "now": format_rfc3339(now)?,
        "score": args.score,
        "progress": estimate(args.score, start, end, now),
        "days_left": days_left(end, now),
    }))
}

fn run_category(args: &CategoryArgs, vocabulary: &Vocabulary) -> Result<()> {
    let raw = args.raw.as_deref();
    let mut payload = serde_json::json!({
        "raw": raw,
        "canonical": vocabulary.canonicalize(raw),
        "vocabulary": vocabulary.labels().collect::<Vec<_>>(),
    });

    if let (Some(filter), Value::Object(object)) = (args.filter.as_deref(), &mut payload) {
        object.insert("filter".to_string(), Value::String(filter.to_string()));
        object.insert("matches".to_string(), Value::Bool(vocabulary.matches(raw, filter)));
    }

    emit_json(payload)
}

fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: Snapshot<T> = serde_json::from_str(&body)
        .with_context(|| format!("invalid snapshot JSON in {}", path.display()))?;
    let records = snapshot.into_records();
    tracing::debug!(path = %path.display(), records = records.len(), "loaded snapshot");
    Ok(records)
}

fn load_vocabulary(path: Option<&Path>) -> Result<Vocabulary> {
    let Some(path) = path else {
        return Ok(Vocabulary::default());
    };

    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read vocabulary {}", path.display()))?;
    Vocabulary::from_yaml(&body)
        .with_context(|| format!("invalid vocabulary file {}", path.display()))
}

fn parse_optional_instant(field: &str, value: Option<&str>) -> Result<Option<OffsetDateTime>> {
    match value {
        Some(raw) => parse_instant(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("invalid --{field} instant: {raw}")),
        None => Ok(None),
    }
}

fn parse_optional_rfc3339(value: Option<&str>) -> Result<OffsetDateTime> {
    match value {
        Some(raw) => parse_rfc3339(raw),
        None => Ok(OffsetDateTime::now_utc()),
    }
}

fn parse_rfc3339(value: &str) -> Result<OffsetDateTime> {
    let parsed = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
        .with_context(|| format!("invalid RFC3339 UTC timestamp: {value}"))?;

    if parsed.offset() != time::UtcOffset::UTC {
        return Err(anyhow!("timestamp MUST use UTC offset Z (received: {value})"));
    }

    Ok(parsed)
}

fn format_rfc3339(value: OffsetDateTime) -> Result<String> {
    value
        .format(&time::format_description::well_known::Rfc3339)
        .with_context(|| format!("failed to format timestamp {value}"))
}
