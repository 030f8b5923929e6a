use anyhow::Result;
use clap::{Parser, Subcommand};
use linkhunter_core::{
    build_report_with, count_urls, ArchiveBackend, ArchiveRequest, FetchRequest, LinkScope,
    PageFetcher, PageReport, PageReportOptions, RelevanceRanker, RowOrder, Tokenizer,
};
use linkhunter_local::{extract_page_links, write_csv, HttpArchiver, LocalFetcher, PageStore};
use serde::Serialize;
use std::path::PathBuf;

mod input;

#[derive(Parser, Debug)]
#[command(name = "linkhunter")]
#[command(about = "Scrape, count, rank, export and archive the links of a web page", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect the links of one page (fetched or from a local HTML file), store them, and print
    /// the counted list.
    Scan(ScanCmd),
    /// Rank URLs by TF-IDF relevance (most distinctive first).
    Rank(RankCmd),
    /// Print the token sequence of each URL.
    Tokens(TokensCmd),
    /// Print term frequency, document frequency and weight per token for a URL corpus (json).
    Stats(StatsCmd),
    /// List stored page scans, oldest first.
    History(HistoryCmd),
    /// Write the counted links of a stored page as CSV.
    Export(ExportCmd),
    /// POST the counted links of a stored page (or explicit URLs) to an archive endpoint.
    Archive(ArchiveCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug, Clone)]
struct ReportArgs {
    /// Which links to keep: all|same-domain|external
    #[arg(long, default_value = "all")]
    scope: String,
    /// Rank links by TF-IDF relevance before counting.
    #[arg(long, default_value_t = false)]
    tfidf: bool,
    /// Row order after counting: count (highest first) or first-seen (page or rank order)
    #[arg(long, default_value = "count")]
    order: String,
}

impl ReportArgs {
    fn options(&self) -> Result<PageReportOptions> {
        let Some(scope) = LinkScope::parse(&self.scope) else {
            anyhow::bail!("unknown --scope {:?} (expected all|same-domain|external)", self.scope);
        };
        let Some(order) = RowOrder::parse(&self.order) else {
            anyhow::bail!("unknown --order {:?} (expected first-seen|count)", self.order);
        };
        Ok(PageReportOptions {
            scope,
            tfidf: self.tfidf,
            order,
        })
    }
}

#[derive(clap::Args, Debug)]
struct StoreArgs {
    /// Directory of stored page scans.
    #[arg(long, env = "LINKHUNTER_STORE_DIR")]
    store_dir: Option<PathBuf>,
}

impl StoreArgs {
    fn store(&self) -> PageStore {
        match &self.store_dir {
            Some(p) => PageStore::new(p.clone()),
            None => PageStore::with_default_dir(),
        }
    }
}

#[derive(clap::Args, Debug)]
struct ScanCmd {
    /// Page to fetch.
    #[arg(long, conflicts_with = "html_file")]
    url: Option<String>,
    /// Read page HTML from a file instead of fetching.
    #[arg(long)]
    html_file: Option<PathBuf>,
    /// Page URL for `--html-file` (resolves relative links; used as the store key).
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long, default_value_t = 20_000)]
    timeout_ms: u64,
    #[arg(long, default_value_t = 5_000_000)]
    max_bytes: u64,
    /// Do not store the scan.
    #[arg(long, default_value_t = false)]
    no_save: bool,
    /// Also write the counted rows as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
    #[command(flatten)]
    report: ReportArgs,
    #[command(flatten)]
    store: StoreArgs,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct RankCmd {
    /// URLs to rank (in page order, duplicates included).
    urls: Vec<String>,
    /// Newline-delimited URL files (`-` reads stdin). Read before inline URLs.
    #[arg(long)]
    urls_file: Vec<PathBuf>,
    /// Include scores and tokens.
    #[arg(long, default_value_t = false)]
    scores: bool,
    /// Extra stopwords (added to the defaults).
    #[arg(long)]
    stopword: Vec<String>,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct TokensCmd {
    urls: Vec<String>,
    /// Extra stopwords (added to the defaults).
    #[arg(long)]
    stopword: Vec<String>,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct StatsCmd {
    urls: Vec<String>,
    #[arg(long)]
    urls_file: Vec<PathBuf>,
    #[arg(long)]
    stopword: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct HistoryCmd {
    #[command(flatten)]
    store: StoreArgs,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct ExportCmd {
    /// Stored page URL.
    #[arg(long)]
    page: String,
    /// CSV path.
    #[arg(long, default_value = "urls.csv")]
    out: PathBuf,
    #[command(flatten)]
    report: ReportArgs,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(clap::Args, Debug)]
struct ArchiveCmd {
    /// Stored page URL whose counted links are archived.
    #[arg(long, required_unless_present = "url")]
    page: Option<String>,
    /// Explicit URLs to archive instead of a stored page (repeatable).
    #[arg(long, conflicts_with = "page")]
    url: Vec<String>,
    /// Archive endpoint.
    #[arg(long, env = "LINKHUNTER_ARCHIVE_URL")]
    endpoint: Option<String>,
    /// Sent as `X-API-Key`.
    #[arg(long, env = "LINKHUNTER_ARCHIVE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[command(flatten)]
    report: ReportArgs,
    #[command(flatten)]
    store: StoreArgs,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn is_text(output: &str) -> bool {
    output.eq_ignore_ascii_case("text")
}

fn ranker_with(stopwords: &[String]) -> RelevanceRanker {
    RelevanceRanker::with_tokenizer(Tokenizer::with_stopwords(stopwords))
}

fn print_report_text(report: &PageReport) {
    println!(
        "{} links={} unique={}",
        report.page_url,
        report.total_links,
        report.rows.len()
    );
    for r in &report.rows {
        println!("{}\t{}", r.count, r.url);
    }
}

fn warn_all(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}

async fn run_scan(args: ScanCmd) -> Result<()> {
    let opts = args.report.options()?;
    // The page as loaded (after redirects) is the scope reference and the store key.
    let (requested_url, page_url, html, source) = match (&args.url, &args.html_file) {
        (Some(url), _) => {
            let fetcher = LocalFetcher::new()?;
            let resp = fetcher
                .fetch(&FetchRequest {
                    url: url.clone(),
                    timeout_ms: Some(args.timeout_ms),
                    max_bytes: Some(args.max_bytes),
                })
                .await?;
            if !(200..300).contains(&resp.status) {
                anyhow::bail!("fetch {url}: HTTP {}", resp.status);
            }
            let html = resp.text_lossy();
            (url.clone(), resp.final_url, html, "network")
        }
        (None, Some(path)) => {
            let html = std::fs::read_to_string(path)?;
            let page_url = args
                .base_url
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            (page_url.clone(), page_url, html, "file")
        }
        (None, None) => anyhow::bail!("scan needs --url or --html-file"),
    };

    let links = extract_page_links(&html, Some(&page_url));
    let saved = if args.no_save {
        false
    } else {
        args.store.store().save(&page_url, &links)?;
        true
    };

    let report = build_report_with(&RelevanceRanker::new(), &page_url, &links, &opts)?;
    if let Some(p) = &args.csv {
        write_csv(p, &report.rows)?;
    }

    if is_text(&args.output) {
        warn_all(&report.warnings);
        print_report_text(&report);
        return Ok(());
    }
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "scan",
        "ok": true,
        "page_url": report.page_url,
        "requested_url": requested_url,
        "source": source,
        "saved": saved,
        "options": opts,
        "total_links": report.total_links,
        "unique_links": report.rows.len(),
        "rows": report.rows,
        "csv": args.csv.as_ref().map(|p| p.display().to_string()),
        "warnings": report.warnings,
    });
    println!("{payload}");
    Ok(())
}

fn run_rank(args: RankCmd) -> Result<()> {
    let urls = input::load_urls(&args.urls_file, &args.urls)?;
    let ranking = ranker_with(&args.stopword).rank_detailed(&urls);
    let warnings: Vec<String> = ranking
        .invalid
        .iter()
        .map(|bad| format!("invalid_url: index={} {}", bad.index, bad.error))
        .collect();

    if is_text(&args.output) {
        warn_all(&warnings);
        for s in &ranking.ranked {
            if args.scores {
                println!("{:.6}\t{}", s.score, s.url);
            } else {
                println!("{}", s.url);
            }
        }
        return Ok(());
    }

    let ranked = if args.scores {
        serde_json::to_value(&ranking.ranked)?
    } else {
        serde_json::to_value(ranking.urls())?
    };
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "rank",
        "ok": true,
        "count": ranking.ranked.len(),
        "ranked": ranked,
        "warnings": warnings,
    });
    println!("{payload}");
    Ok(())
}

#[derive(Debug, Serialize)]
struct TokensRow {
    url: String,
    ok: bool,
    tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_tokens(args: TokensCmd) -> Result<()> {
    let tokenizer = Tokenizer::with_stopwords(&args.stopword);
    let rows: Vec<TokensRow> = args
        .urls
        .iter()
        .map(|u| match tokenizer.tokenize(u) {
            Ok(tokens) => TokensRow {
                url: u.clone(),
                ok: true,
                tokens,
                error: None,
            },
            Err(e) => TokensRow {
                url: u.clone(),
                ok: false,
                tokens: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();

    if is_text(&args.output) {
        for r in &rows {
            match &r.error {
                Some(e) => println!("{}\terror: {e}", r.url),
                None => println!("{}\t{}", r.url, r.tokens.join(" ")),
            }
        }
        return Ok(());
    }
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "tokens",
        "ok": rows.iter().all(|r| r.ok),
        "results": rows,
    });
    println!("{payload}");
    Ok(())
}

fn run_stats(args: StatsCmd) -> Result<()> {
    let urls = input::load_urls(&args.urls_file, &args.urls)?;
    let stats = ranker_with(&args.stopword).corpus_stats(&urls);
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "stats",
        "ok": true,
        "stats": stats,
    });
    println!("{payload}");
    Ok(())
}

fn run_history(args: HistoryCmd) -> Result<()> {
    let store = args.store.store();
    let pages = store.list()?;

    if is_text(&args.output) {
        for p in &pages {
            println!(
                "{}\t{} links\t{}",
                p.saved_at_epoch_s,
                p.urls.len(),
                p.page_url
            );
        }
        return Ok(());
    }
    let entries: Vec<serde_json::Value> = pages
        .iter()
        .map(|p| {
            serde_json::json!({
                "page_url": p.page_url,
                "saved_at_epoch_s": p.saved_at_epoch_s,
                "links": p.urls.len(),
                "unique_links": count_urls(&p.urls).len(),
            })
        })
        .collect();
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "history",
        "ok": true,
        "store_dir": store.root().display().to_string(),
        "pages": entries,
    });
    println!("{payload}");
    Ok(())
}

fn stored_report(store: &StoreArgs, page: &str, report: &ReportArgs) -> Result<PageReport> {
    let opts = report.options()?;
    let Some(saved) = store.store().load(page)? else {
        anyhow::bail!("no stored scan for {page} (run `linkhunter scan` first)");
    };
    Ok(build_report_with(
        &RelevanceRanker::new(),
        &saved.page_url,
        &saved.urls,
        &opts,
    )?)
}

fn run_export(args: ExportCmd) -> Result<()> {
    let report = stored_report(&args.store, &args.page, &args.report)?;
    warn_all(&report.warnings);
    write_csv(&args.out, &report.rows)?;
    println!("{}", args.out.display());
    Ok(())
}

async fn run_archive(args: ArchiveCmd) -> Result<()> {
    let Some(endpoint) = args.endpoint.clone() else {
        anyhow::bail!("missing --endpoint (or LINKHUNTER_ARCHIVE_URL)");
    };
    let (rows, warnings) = match &args.page {
        Some(page) => {
            let report = stored_report(&args.store, page, &args.report)?;
            (report.rows, report.warnings)
        }
        None => (count_urls(&args.url), Vec::new()),
    };
    warn_all(&warnings);

    let archiver = HttpArchiver::new(endpoint, args.api_key.clone())?;
    let n = rows.len();
    let resp = archiver.archive(&ArchiveRequest { urls: rows }).await?;

    if is_text(&args.output) {
        println!("archived {n} urls to {}", archiver.endpoint());
        return Ok(());
    }
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "archive",
        "ok": true,
        "backend": archiver.name(),
        "endpoint": archiver.endpoint(),
        "archived": n,
        "status": resp.status,
        "message": resp.message,
        "warnings": warnings,
    });
    println!("{payload}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Opt-in env file: sets vars only when not already present in the process env.
    if let Ok(p) = std::env::var("LINKHUNTER_ENV_FILE") {
        let p = p.trim();
        if !p.is_empty() {
            if let Err(e) = input::apply_env_file(std::path::Path::new(p)) {
                eprintln!("warning: LINKHUNTER_ENV_FILE not loaded: {e}");
            }
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args).await?,
        Commands::Rank(args) => run_rank(args)?,
        Commands::Tokens(args) => run_tokens(args)?,
        Commands::Stats(args) => run_stats(args)?,
        Commands::History(args) => run_history(args)?,
        Commands::Export(args) => run_export(args)?,
        Commands::Archive(args) => run_archive(args).await?,
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "linkhunter",
                "version": env!("CARGO_PKG_VERSION"),
            });
            if is_text(&args.output) {
                println!("linkhunter {}", env!("CARGO_PKG_VERSION"));
            } else {
                println!("{v}");
            }
        }
    }

    Ok(())
}
