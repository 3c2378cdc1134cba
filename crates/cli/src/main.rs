use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use planbot_protocol::{Options, Post};
use planbot_responder::{
    Bot, BotConfig, ChatCompletionEnricher, FallbackStrategy, JsonDirAuditStore, LocalSource,
    MemoryAuditStore, ProcessOutcome, ReplyMode, RunContext,
};
use planbot_search::{evaluate, LabelledPost, MatchContext, SemanticEngine, StrategyScore};
use planbot_vector_store::{Corpus, ModelBuilder, DEFAULT_NUM_TOPICS};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod report;

#[derive(Parser)]
#[command(name = "planbot")]
#[command(about = "Answers questions about published policy plans", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Bot config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Corpus directory (overrides the config file)
    #[arg(long, global = true)]
    corpus_dir: Option<PathBuf>,

    /// Model directory (overrides the config file)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Match one message against the corpus and print the result as JSON
    Match(MatchArgs),

    /// Run the bot over a JSON array of posts
    Process(ProcessArgs),

    /// Train the tfidf and lsa models from the corpus
    #[command(name = "build-models")]
    BuildModels(BuildModelsArgs),

    /// Score the statistical strategies on labelled posts
    Eval(EvalArgs),
}

#[derive(Args)]
struct MatchArgs {
    /// Message text; the trigger word is added when missing
    text: String,

    /// Statistical fallback: lsa, tfidf or token_sort_ratio
    #[arg(long)]
    strategy: Option<String>,
}

#[derive(Args)]
struct ProcessArgs {
    /// JSON array of posts, processed in order
    messages: PathBuf,

    /// Directory for per-post audit records
    #[arg(long, default_value = ".planbot/audit")]
    audit_dir: PathBuf,

    /// JSON-lines file receiving sent replies
    #[arg(long, default_value = ".planbot/outbox.jsonl")]
    outbox: PathBuf,

    /// Actually reply
    #[arg(long)]
    send: bool,

    /// Log replies as sent without sending them (wins over --send)
    #[arg(long)]
    simulate: bool,

    /// Do not write audit records
    #[arg(long)]
    skip_tracking: bool,

    /// Post ids whose replies fail as deleted (comma-separated)
    #[arg(long, value_delimiter = ',')]
    deleted: Vec<String>,
}

#[derive(Args)]
struct BuildModelsArgs {
    /// Upper bound on LSI topics
    #[arg(long, default_value_t = DEFAULT_NUM_TOPICS)]
    num_topics: usize,
}

#[derive(Args)]
struct EvalArgs {
    /// JSON array of labelled posts
    dataset: PathBuf,

    /// Strategies to score (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "lsa,tfidf,token_sort_ratio")]
    strategies: Vec<String>,

    /// Print the scores as JSON instead of a Markdown report
    #[arg(long)]
    json: bool,

    /// Also write the Markdown report to this path
    #[arg(long)]
    out_md: Option<PathBuf>,
}

#[derive(Serialize)]
struct ProcessedPost<'a> {
    id: &'a str,
    #[serde(flatten)]
    outcome: ProcessOutcome,
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    model_dir: &'a Path,
    documents: usize,
    terms: usize,
    lsa_topics: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    if matches!(&cli.command, Commands::Eval(args) if args.json) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Match(args) => run_match(args, config)?,
        Commands::Process(args) => run_process(args, config).await?,
        Commands::BuildModels(args) => run_build_models(args, &config)?,
        Commands::Eval(args) => run_eval(args, &config)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BotConfig> {
    let mut config = match &cli.config {
        Some(path) => BotConfig::from_file(path)?,
        None => BotConfig::default(),
    };
    if let Some(dir) = &cli.corpus_dir {
        config.corpus_dir = dir.clone();
    }
    if let Some(dir) = &cli.model_dir {
        config.model_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn load_corpus(config: &BotConfig) -> Result<Corpus> {
    Corpus::load(&config.corpus_dir)
        .with_context(|| format!("Failed to load corpus from {}", config.corpus_dir.display()))
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn run_match(args: MatchArgs, mut config: BotConfig) -> Result<()> {
    if let Some(strategy) = &args.strategy {
        config.strategy = FallbackStrategy::parse(strategy)?;
    }
    let trigger = config.trigger()?;
    let text = if trigger.contains_trigger(&args.text) {
        args.text
    } else {
        format!("{} {}", config.trigger_word, args.text)
    };

    let corpus = load_corpus(&config)?;
    let bot = Bot::new(
        &config,
        corpus,
        Arc::new(LocalSource::default()),
        Arc::new(MemoryAuditStore::new()),
    )?;
    let result = bot.match_text(&text)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_process(args: ProcessArgs, mut config: BotConfig) -> Result<()> {
    if args.send || args.simulate {
        config.reply_mode = ReplyMode::from_flags(args.send, args.simulate);
    }
    config.skip_tracking |= args.skip_tracking;

    let posts: Vec<Post> = read_json_file(&args.messages)?;
    let corpus = load_corpus(&config)?;

    if config.reply_mode == ReplyMode::Send {
        if let Some(parent) = args.outbox.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let mut source = LocalSource::new(posts.iter().cloned()).with_outbox(&args.outbox);
    for id in &args.deleted {
        source = source.with_deleted(id.clone());
    }

    let mut bot = Bot::new(
        &config,
        corpus,
        Arc::new(source),
        Arc::new(JsonDirAuditStore::new(&args.audit_dir)),
    )?;
    if let Some(enrichment) = &config.enrichment {
        let enricher = ChatCompletionEnricher::from_config(enrichment)
            .context("Failed to set up the enrichment client")?;
        bot = bot.with_enricher(Arc::new(enricher));
    }
    log::info!(
        "Processing {} posts ({:?})",
        posts.len(),
        config.reply_mode
    );

    let mut ctx = RunContext::new();
    let outcomes = bot
        .process_all(&mut ctx, &posts)
        .await
        .context("Run aborted")?;

    let processed: Vec<ProcessedPost<'_>> = outcomes
        .iter()
        .map(|(id, outcome)| ProcessedPost {
            id,
            outcome: *outcome,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&processed)?);
    Ok(())
}

fn run_build_models(args: BuildModelsArgs, config: &BotConfig) -> Result<()> {
    let corpus = load_corpus(config)?;
    let models = ModelBuilder::default()
        .with_preprocessor(config.preprocessor())
        .with_num_topics(args.num_topics)
        .build(&corpus)
        .context("Failed to build models")?;
    models
        .save(&config.model_dir)
        .with_context(|| format!("Failed to write models to {}", config.model_dir.display()))?;

    let summary = BuildSummary {
        model_dir: &config.model_dir,
        documents: models.tfidf.len(),
        terms: models.tfidf.dictionary().len(),
        lsa_topics: models.lsa.transform().output_dim(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_eval(args: EvalArgs, config: &BotConfig) -> Result<()> {
    let posts: Vec<LabelledPost> = read_json_file(&args.dataset)?;
    let corpus = load_corpus(config)?;
    let engine = SemanticEngine::default();
    let options = Options::new();
    let ctx = MatchContext {
        documents: corpus.documents(),
        verbatims: corpus.verbatims(),
        options: &options,
        engine: &engine,
    };

    let mut scores: Vec<StrategyScore> = Vec::with_capacity(args.strategies.len());
    for name in &args.strategies {
        let candidate = BotConfig {
            strategy: FallbackStrategy::parse(name)?,
            model_name: None,
            ..config.clone()
        };
        let chain = candidate.chain();
        let mut score = evaluate(&chain, &ctx, &candidate.trigger()?, &posts)
            .with_context(|| format!("Failed to evaluate '{name}'"))?;
        score.name = candidate.strategy.as_str().to_string();
        scores.push(score);
    }
    report::rank(&mut scores);

    let md = report::render_eval_report(&args.dataset, &scores);
    if let Some(path) = &args.out_md {
        std::fs::write(path, &md)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
    } else {
        print!("{md}");
    }
    Ok(())
}
