use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use seolens_core::report::{self, ReportFormat};
use seolens_core::{AuditInput, AuditResult, AuditStore, Auditor, ScoringConfig};
use seolens_scanner::{
    Crawler, PageSpeedClient, SearchPerformanceRecord, Strategy, search, sitemap,
};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/seolens/";
pub const CONFIG_FILE_NAME: &str = "scoring.json";
pub const DATABASE_FILE_NAME: &str = "seolens.db";

pub fn print_banner() {
    println!(
        "{} {}",
        "seolens".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_white()
    );
    println!("{}", "Strategic technical SEO auditing".cyan());
    println!();
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn default_config_dir() -> PathBuf {
    expand_path(DEFAULT_CONFIG_DIR)
}

// Helper functions for audit handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("One of --url, --hosts-file or --sitemap must be provided".to_string())
    }
}

/// Load and parse URLs from a file. Repeated URLs are kept once.
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let mut urls = Vec::new();
    merge_urls(
        &mut urls,
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(parse_url_line),
    );

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Site identifier used to link runs: the host of the first URL.
pub fn site_from_urls(urls: &[String]) -> Option<String> {
    urls.iter()
        .filter_map(|u| Url::parse(u).ok())
        .find_map(|u| u.host_str().map(str::to_string))
}

/// Append `extra` to `urls`, skipping ones already present.
pub fn merge_urls(urls: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    let mut seen: HashSet<String> = urls.iter().cloned().collect();
    for url in extra {
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

pub struct InitPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database: PathBuf,
}

impl InitPaths {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            config_file: config_dir.join(CONFIG_FILE_NAME),
            database: config_dir.join(DATABASE_FILE_NAME),
        }
    }
}

/// Create the config directory, a default scoring config and an empty
/// database. Existing files are replaced only when `overwrite` is set.
pub fn initialize(paths: &InitPaths, overwrite: bool) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!("Failed to create config directory {}", paths.config_dir.display())
    })?;

    if overwrite || !paths.config_file.exists() {
        let json = ScoringConfig::default().to_json_pretty()?;
        fs::write(&paths.config_file, json)
            .with_context(|| format!("Failed to write {}", paths.config_file.display()))?;
    }

    if overwrite && AuditStore::exists(&paths.database) {
        AuditStore::remove(&paths.database)?;
    }
    AuditStore::open(&paths.database)
        .with_context(|| format!("Failed to create database {}", paths.database.display()))?;

    Ok(())
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  SEOLENS INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let dir = args
        .get_one::<String>("PATH")
        .map(|p| expand_path(p))
        .unwrap_or_else(default_config_dir);
    let force = args.get_flag("force");
    let paths = InitPaths::new(&dir);

    println!(
        "{} Target: {}",
        "→".blue(),
        paths.config_dir.display().to_string().bright_white()
    );
    println!();

    let existing = paths.config_file.exists() || AuditStore::exists(&paths.database);
    let mut overwrite = force;

    if existing && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("An existing installation was found:");
        for path in [&paths.config_file, &paths.database] {
            if path.exists() {
                println!(
                    "  {} {}",
                    "•".yellow(),
                    path.display().to_string().bright_white()
                );
            }
        }
        println!();

        let response = print_prompt("Overwrite the scoring config and audit history? [y/N]:")?;
        println!();
        overwrite = response == "y" || response == "yes";
        if !overwrite {
            println!("{} Keeping existing files", "→".blue());
        }
    }

    initialize(&paths, overwrite)?;

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Scoring config: {}",
        "✓".green().bold(),
        paths.config_file.display().to_string().bright_white()
    );
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        paths.database.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

/// Everything `seolens audit` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub url: Option<Url>,
    pub hosts_file: Option<PathBuf>,
    pub sitemap: Option<Url>,
    pub site: Option<String>,
    pub threads: usize,
    pub timeout: u64,
    pub limit: Option<usize>,
    pub config: Option<PathBuf>,
    pub search_data: Option<PathBuf>,
    pub top_pages: usize,
    pub pagespeed_key: Option<String>,
    pub pagespeed_limit: usize,
    pub pagespeed_endpoint: Option<String>,
    /// `None` disables audit history.
    pub database: Option<PathBuf>,
    pub show_progress: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            url: None,
            hosts_file: None,
            sitemap: None,
            site: None,
            threads: 10,
            timeout: 30,
            limit: None,
            config: None,
            search_data: None,
            top_pages: 10,
            pagespeed_key: None,
            pagespeed_limit: 5,
            pagespeed_endpoint: None,
            database: None,
            show_progress: false,
        }
    }
}

impl AuditOptions {
    pub fn from_matches(args: &ArgMatches) -> Self {
        let database = if args.get_flag("no-history") {
            None
        } else {
            Some(
                args.get_one::<String>("db")
                    .map(|p| expand_path(p))
                    .unwrap_or_else(|| default_config_dir().join(DATABASE_FILE_NAME)),
            )
        };

        Self {
            url: args.get_one::<Url>("url").cloned(),
            hosts_file: args.get_one::<PathBuf>("hosts-file").cloned(),
            sitemap: args.get_one::<Url>("sitemap").cloned(),
            site: args.get_one::<String>("site").cloned(),
            threads: args.get_one::<usize>("threads").copied().unwrap_or(10),
            timeout: args.get_one::<u64>("timeout").copied().unwrap_or(30),
            limit: args.get_one::<usize>("limit").copied(),
            config: args.get_one::<String>("config").map(|p| expand_path(p)),
            search_data: args.get_one::<String>("search-data").map(|p| expand_path(p)),
            top_pages: args.get_one::<usize>("top-pages").copied().unwrap_or(10),
            pagespeed_key: args
                .get_one::<String>("pagespeed-key")
                .cloned()
                .or_else(|| std::env::var("PAGESPEED_API_KEY").ok()),
            pagespeed_limit: args.get_one::<usize>("pagespeed-limit").copied().unwrap_or(5),
            pagespeed_endpoint: None,
            database,
            show_progress: true,
        }
    }
}

fn load_scoring_config(path: Option<&PathBuf>) -> Result<ScoringConfig> {
    match path {
        Some(path) => ScoringConfig::from_file(path)
            .with_context(|| format!("Invalid scoring config {}", path.display())),
        None => {
            let default_path = default_config_dir().join(CONFIG_FILE_NAME);
            if default_path.exists() {
                info!("Using scoring config {}", default_path.display());
                ScoringConfig::from_file(&default_path)
                    .with_context(|| format!("Invalid scoring config {}", default_path.display()))
            } else {
                Ok(ScoringConfig::default())
            }
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Collect signals and run the audit. Collector failures degrade the audit
/// rather than abort it.
pub async fn run_audit(options: &AuditOptions) -> Result<AuditResult> {
    let config = load_scoring_config(options.config.as_ref())?;
    let auditor = Auditor::new(config)?;

    let crawler = Crawler::with_timeout(options.timeout)?;

    let listed = if let Some(sitemap_url) = &options.sitemap {
        let urls = sitemap::fetch_sitemap(crawler.client(), sitemap_url.as_str())
            .await
            .with_context(|| format!("Failed to load sitemap {}", sitemap_url))?;
        if urls.is_empty() {
            bail!("Sitemap {} lists no URLs", sitemap_url);
        }
        urls
    } else {
        load_urls_from_source(options.url.as_ref(), options.hosts_file.as_ref())
            .map_err(|e| anyhow!(e))?
    };
    let mut urls = Vec::new();
    merge_urls(&mut urls, listed);

    if let Some(limit) = options.limit {
        urls.truncate(limit);
    }

    let search: Vec<SearchPerformanceRecord> = match &options.search_data {
        Some(path) => {
            let records = search::load_search_performance(path)
                .with_context(|| format!("Failed to load search data {}", path.display()))?;
            let top = search::top_pages_per_domain(&records, options.top_pages);
            merge_urls(&mut urls, top.iter().map(|r| r.url.clone()));
            top
        }
        None => Vec::new(),
    };

    let site = options
        .site
        .clone()
        .or_else(|| site_from_urls(&urls))
        .ok_or_else(|| anyhow!("Could not derive a site name, pass --site"))?;

    // Crawl
    let progress = if options.show_progress {
        let pb = ProgressBar::new(urls.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        Some(pb)
    } else {
        None
    };

    let crawler = match &progress {
        Some(pb) => {
            let pb = pb.clone();
            crawler.with_progress_callback(Arc::new(move |count: usize, url: String| {
                pb.set_position(count as u64);
                pb.set_message(url);
            }))
        }
        None => crawler,
    };

    let batch = crawler.fetch_all(&urls, options.threads).await;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    for (url, error) in &batch.failures {
        warn!("Could not crawl {}: {}", url, error);
    }

    // Lab performance data
    let performance = match &options.pagespeed_key {
        Some(key) if options.pagespeed_limit > 0 => {
            let mut client = PageSpeedClient::new(key.clone())?;
            if let Some(endpoint) = &options.pagespeed_endpoint {
                client = client.with_endpoint(endpoint.clone()).with_delay(Duration::ZERO);
            }
            let targets: Vec<String> = urls.iter().take(options.pagespeed_limit).cloned().collect();

            let pb = options.show_progress.then(|| spinner("Fetching PageSpeed data..."));
            let records = client
                .fetch_batch(&targets, &[Strategy::Mobile, Strategy::Desktop])
                .await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            records
        }
        _ => Vec::new(),
    };

    let input = AuditInput::new(site, urls)
        .with_crawl(batch.records)
        .with_structured_data(batch.structured_data)
        .with_performance(performance)
        .with_search(search);

    let audit_timestamp = Utc::now();
    let result = match &options.database {
        Some(path) => match AuditStore::open(path) {
            Ok(store) => auditor.run_with_history(&store, &input, audit_timestamp),
            Err(e) => {
                warn!("Audit history unavailable ({}): {}", path.display(), e);
                auditor.run(&input, audit_timestamp)
            }
        },
        None => auditor.run(&input, audit_timestamp),
    };

    Ok(result)
}

fn report_format(args: &ArgMatches) -> Result<ReportFormat> {
    let format = args.get_one::<String>("format").map(String::as_str).unwrap_or("text");
    ReportFormat::from_str(format).ok_or_else(|| anyhow!("Unknown report format '{}'", format))
}

fn emit_report(result: &AuditResult, format: ReportFormat, output: Option<&PathBuf>) -> Result<()> {
    let content = report::render(result, format)?;
    match output {
        Some(path) => {
            report::save_report(&content, path)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn print_score_line(result: &AuditResult) {
    let summary = &result.summary;
    let (letter, status) = report::grade(summary.seo_score);
    let score = format!("{:.1}/100 ({})", summary.seo_score, letter);
    let score = if summary.seo_score >= 80.0 {
        score.green().bold()
    } else if summary.seo_score >= 60.0 {
        score.yellow().bold()
    } else {
        score.red().bold()
    };

    println!(
        "{} Audit complete: {} | {} issues ({} critical, {} high) | {}",
        "✓".green().bold(),
        score,
        summary.total_issues,
        summary.critical_issues.to_string().red(),
        summary.high_issues.to_string().yellow(),
        status
    );
    if !result.fixed.is_empty() {
        println!(
            "{} {} issues fixed since the last audit",
            "✓".green(),
            result.fixed.len()
        );
    }
    println!();
}

pub async fn handle_audit(args: &ArgMatches) -> Result<()> {
    let format = report_format(args)?;
    let output = args.get_one::<PathBuf>("output");
    let options = AuditOptions::from_matches(args);

    let result = run_audit(&options).await?;

    // stdout carries only the report for json and csv
    if output.is_some() || format == ReportFormat::Text {
        print_score_line(&result);
    }
    emit_report(&result, format, output)
}

pub fn handle_report(args: &ArgMatches) -> Result<()> {
    let format = report_format(args)?;
    let output = args.get_one::<PathBuf>("output");
    let db_path = args
        .get_one::<String>("db")
        .map(|p| expand_path(p))
        .unwrap_or_else(|| default_config_dir().join(DATABASE_FILE_NAME));

    if !AuditStore::exists(&db_path) {
        bail!(
            "No audit database at {}. Run `seolens init` first",
            db_path.display()
        );
    }
    let store = AuditStore::open(&db_path)?;

    let run = match args.get_one::<String>("site") {
        Some(site) => store.latest_run(site)?,
        None => store.latest_run_any()?,
    }
    .ok_or_else(|| anyhow!("No stored audit runs found"))?;

    let result = store
        .load_result(&run.id)?
        .ok_or_else(|| anyhow!("Run {} has no stored result", run.id))?;

    emit_report(&result, format, output)
}
