//! insights: terminal front end for the financial insights backend
//!
//! Every subcommand drives one page controller from `insights-core` through a
//! terminal surface: toasts go to stderr in color, views go to stdout, and
//! confirmations are asked on the terminal unless `--yes` is given.
//!
//! # Subcommands
//! - `datasets list|upload|activate|delete`
//! - `stats`
//! - `hypotheses run [--test N...] [--export FORMAT]`
//! - `ask QUESTION [--conversation ID]`
//! - `chat` (interactive shell)
//! - `conversations list|show|new|delete|export`
//! - `settings show|system|interface|initialise|clear-cache|reset`
//! - `chart TYPE [--out FILE]`

mod shell;
mod terminal;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use insights_core::pages::{
    ChatPage, ConversationsPage, DatasetsPage, HypothesisPage, SettingsPage, UploadRequest,
};
use insights_core::render;
use insights_core::{
    ApiClient, ConversationFormat, FontSize, InsightsConfig, InsightsFormat, PageContext,
    PreferenceStore, Region, Surface, UserPreferences,
};

use terminal::TerminalSurface;

const DEFAULT_CONFIG: &str = "insights.toml";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "insights",
    version,
    about = "Cbus financial insights: datasets, hypotheses and chat from the terminal"
)]
struct Cli {
    /// Configuration file (TOML, optional)
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Backend URL (overrides api.base_url)
    #[arg(long, env = "INSIGHTS_SERVER")]
    server: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,

    /// Log requests and failures to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage uploaded datasets
    Datasets {
        #[command(subcommand)]
        action: DatasetAction,
    },

    /// Show the active dataset and its headline figures
    Stats,

    /// Generate, test and export hypotheses
    Hypotheses {
        #[command(subcommand)]
        action: HypothesisAction,
    },

    /// Ask a single question
    Ask {
        question: String,

        /// Continue this conversation instead of the active one
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Interactive chat shell
    Chat,

    /// Browse and manage stored conversations
    Conversations {
        #[command(subcommand)]
        action: ConversationAction,
    },

    /// System settings and local preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Fetch a chart and save it as PNG
    Chart {
        /// Chart type, e.g. sales_by_region
        chart_type: String,

        /// Output file (defaults to <downloads_dir>/<TYPE>.png)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum DatasetAction {
    List,
    Upload {
        file: PathBuf,

        /// Display name (defaults to the file name without extension)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    Activate {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum HypothesisAction {
    /// Generate hypotheses, optionally test some and export the insights
    Run {
        /// Hypothesis number to test (1-based, repeatable)
        #[arg(long = "test")]
        test: Vec<usize>,

        /// Export synthesized insights: json, markdown, txt, html or pdf
        #[arg(long)]
        export: Option<InsightsFormat>,
    },
}

#[derive(Debug, Subcommand)]
enum ConversationAction {
    List {
        /// Case-insensitive title filter
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Show {
        id: String,
    },
    New {
        title: Option<String>,
    },
    Delete {
        id: String,
    },
    Export {
        id: String,

        /// json, markdown, csv or html
        #[arg(long, default_value = "json")]
        format: ConversationFormat,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    Show,
    /// Update server-side settings; omitted fields keep their value
    System {
        #[arg(long)]
        analyst_deployment: Option<String>,
        #[arg(long)]
        insight_deployment: Option<String>,
        #[arg(long)]
        cache_duration: Option<u32>,
        #[arg(long)]
        memcache_size: Option<u32>,
    },
    /// Update local interface preferences
    Interface {
        #[arg(long)]
        dark_mode: Option<bool>,
        #[arg(long)]
        font_size: Option<FontSize>,
        #[arg(long)]
        show_charts: Option<bool>,
        #[arg(long)]
        show_follow_up: Option<bool>,
    },
    Initialise,
    ClearCache,
    Reset,
}

/// Regions whose renders are printed for a given command.
fn regions_for(command: &Commands) -> &'static [Region] {
    match command {
        Commands::Datasets { .. } => &[Region::Datasets],
        Commands::Stats => &[Region::Stats],
        Commands::Hypotheses { .. } => &[Region::Stats, Region::TestResults, Region::Insights],
        Commands::Ask { .. } => &[Region::FollowUps],
        Commands::Chat => &[
            Region::CurrentDataset,
            Region::Stats,
            Region::SampleQuestions,
            Region::RecentConversations,
            Region::ConversationTitle,
            Region::FollowUps,
        ],
        Commands::Conversations { .. } => &[
            Region::ConversationList,
            Region::Pagination,
            Region::ConversationDetails,
        ],
        Commands::Settings { .. } => &[Region::SystemSettings, Region::InterfaceSettings],
        Commands::Chart { .. } => &[],
    }
}

// ============================================================================
// Command handlers
// ============================================================================

async fn run_datasets(ctx: PageContext<'_>, action: DatasetAction) -> anyhow::Result<bool> {
    let mut page = DatasetsPage::new(ctx);
    let ok = match action {
        DatasetAction::List => {
            page.load().await;
            page.listing().is_some()
        }
        DatasetAction::Upload {
            file,
            name,
            description,
        } => {
            let request = UploadRequest {
                file,
                name,
                description,
            };
            page.upload(request).await?
        }
        DatasetAction::Activate { id } => page.activate(&id).await,
        DatasetAction::Delete { id } => page.delete(&id).await,
    };
    Ok(ok)
}

async fn run_stats(ctx: PageContext<'_>) -> anyhow::Result<bool> {
    match ctx.api.stats().await {
        Ok(stats) => {
            println!("{}\n\n{}", render::current_dataset(&stats), render::stats(&stats));
            Ok(true)
        }
        Err(e) => {
            ctx.toast(insights_core::Level::Error, e.user_message("Failed to load statistics"));
            Ok(false)
        }
    }
}

async fn run_hypotheses(ctx: PageContext<'_>, action: HypothesisAction) -> anyhow::Result<bool> {
    let HypothesisAction::Run { test, export } = action;
    let mut page = HypothesisPage::new(ctx);

    page.load_dataset_info().await;
    if !page.generate().await {
        return Ok(false);
    }

    let tested: std::collections::HashSet<&str> = std::collections::HashSet::new();
    println!("{}", render::hypotheses(page.hypotheses(), &tested));

    let mut ok = true;
    for number in test {
        let Some(id) = number
            .checked_sub(1)
            .and_then(|i| page.hypotheses().get(i))
            .map(|h| h.id.clone())
        else {
            eprintln!("insights: no hypothesis number {}", number);
            ok = false;
            continue;
        };
        ok &= page.test(&id).await;
    }

    if let Some(format) = export {
        ok &= page.export(format).await.is_some();
    }
    Ok(ok)
}

async fn run_ask(
    ctx: PageContext<'_>,
    prefs: UserPreferences,
    question: String,
    conversation: Option<String>,
) -> anyhow::Result<bool> {
    let mut page = ChatPage::new(ctx, prefs);
    if let Some(id) = conversation {
        page.set_conversation_id(id);
    }
    page.set_input(question);

    let ok = page.submit().await;
    if let Some(block) = page.blocks().last() {
        println!("{}\n", block.render());
    }
    if let Some(id) = page.conversation_id() {
        tracing::debug!(conversation = id, "answered");
    }
    Ok(ok)
}

async fn run_conversations(
    ctx: PageContext<'_>,
    action: ConversationAction,
) -> anyhow::Result<bool> {
    let mut page = ConversationsPage::new(ctx);
    let ok = match action {
        ConversationAction::List { search, page: n } => {
            if !page.load().await {
                return Ok(false);
            }
            if let Some(query) = search {
                page.search(&query);
            }
            if n == 1 || page.go_to_page(n) {
                true
            } else {
                eprintln!("{}", page_out_of_range(n, page.total_pages()));
                false
            }
        }
        ConversationAction::Show { id } => page.view(&id).await,
        ConversationAction::New { title } => match page.create(title.as_deref()).await {
            Some(id) => {
                println!("{}", id);
                true
            }
            None => false,
        },
        ConversationAction::Delete { id } => page.delete(Some(&id)).await,
        ConversationAction::Export { id, format } => {
            page.view(&id).await && page.export(format).await.is_some()
        }
    };
    Ok(ok)
}

fn page_out_of_range(requested: usize, total: usize) -> String {
    match total {
        0 => format!("insights: no page {}, there is nothing to list", requested),
        1 => format!("insights: no page {}, only page 1 exists", requested),
        _ => format!("insights: no page {}, valid pages are 1-{}", requested, total),
    }
}

async fn run_settings(
    ctx: PageContext<'_>,
    prefs: UserPreferences,
    store: &mut PreferenceStore,
    action: SettingsAction,
) -> anyhow::Result<bool> {
    let mut page = SettingsPage::new(ctx, prefs);
    let ok = match action {
        SettingsAction::Show => {
            page.load().await;
            true
        }
        SettingsAction::System {
            analyst_deployment,
            insight_deployment,
            cache_duration,
            memcache_size,
        } => {
            page.load().await;
            let mut settings = page.settings().clone();
            if let Some(v) = analyst_deployment {
                settings.analyst_deployment = v;
            }
            if let Some(v) = insight_deployment {
                settings.insight_deployment = v;
            }
            if let Some(v) = cache_duration {
                settings.cache_duration = v;
            }
            if let Some(v) = memcache_size {
                settings.memcache_size = v;
            }
            page.save_system(settings).await
        }
        SettingsAction::Interface {
            dark_mode,
            font_size,
            show_charts,
            show_follow_up,
        } => {
            let mut updated = *page.preferences();
            updated.dark_mode = dark_mode.unwrap_or(updated.dark_mode);
            updated.font_size = font_size.unwrap_or(updated.font_size);
            updated.show_charts = show_charts.unwrap_or(updated.show_charts);
            updated.show_follow_up = show_follow_up.unwrap_or(updated.show_follow_up);
            page.save_interface(updated, store)?;
            true
        }
        SettingsAction::Initialise => page.initialise().await,
        SettingsAction::ClearCache => page.clear_cache().await,
        SettingsAction::Reset => page.reset(store).await,
    };
    Ok(ok)
}

async fn run_chart(
    ctx: PageContext<'_>,
    downloads: PathBuf,
    chart_type: String,
    out: Option<PathBuf>,
) -> anyhow::Result<bool> {
    let chart = match ctx.api.visualisation(&chart_type).await {
        Ok(chart) => chart,
        Err(e) => {
            ctx.toast(insights_core::Level::Error, e.user_message("Failed to load chart"));
            return Ok(false);
        }
    };

    let Some(png) = chart.png_bytes() else {
        eprintln!("insights: chart '{}' has no image data", chart.display_title());
        return Ok(false);
    };
    let png = png.context("chart image is not valid base64")?;

    let target = out.unwrap_or_else(|| downloads.join(format!("{}.png", chart_type)));
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, png).with_context(|| format!("writing {}", target.display()))?;
    println!("{}: {}", chart.display_title(), target.display());
    Ok(true)
}

// ============================================================================
// Main
// ============================================================================

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("insights: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = InsightsConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    if let Some(server) = cli.server {
        config.api.base_url = server;
    }
    tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

    let api = ApiClient::new(&config.api)?;
    let downloads = config.storage.downloads_dir();
    let mut store = PreferenceStore::open(config.storage.preferences_path())?;
    let prefs = UserPreferences::load(&store);

    let surface = TerminalSurface::new(cli.yes, downloads.clone(), regions_for(&cli.command));
    surface.apply_preferences(&prefs);
    let ctx = PageContext::new(&api, &surface, &config.ui);

    match cli.command {
        Commands::Datasets { action } => run_datasets(ctx, action).await,
        Commands::Stats => run_stats(ctx).await,
        Commands::Hypotheses { action } => run_hypotheses(ctx, action).await,
        Commands::Ask {
            question,
            conversation,
        } => run_ask(ctx, prefs, question, conversation).await,
        Commands::Chat => shell::run(ctx, prefs, &mut store).await,
        Commands::Conversations { action } => run_conversations(ctx, action).await,
        Commands::Settings { action } => run_settings(ctx, prefs, &mut store, action).await,
        Commands::Chart { chart_type, out } => run_chart(ctx, downloads, chart_type, out).await,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::Level;

    // ========================================================================
    // TEST 1: global flags parse before the subcommand
    // ========================================================================
    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "insights",
            "--yes",
            "--server",
            "http://10.0.0.5:5000",
            "stats",
        ])
        .unwrap();

        assert!(cli.yes);
        assert!(!cli.verbose);
        assert_eq!(cli.config, DEFAULT_CONFIG);
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.5:5000"));
        assert!(matches!(cli.command, Commands::Stats));
    }

    // ========================================================================
    // TEST 2: repeated --test values and an export format
    // ========================================================================
    #[test]
    fn test_hypotheses_run_arguments() {
        let cli = Cli::try_parse_from([
            "insights", "hypotheses", "run", "--test", "1", "--test", "3", "--export", "md",
        ])
        .unwrap();

        let Commands::Hypotheses {
            action: HypothesisAction::Run { test, export },
        } = cli.command
        else {
            panic!("expected hypotheses run");
        };
        assert_eq!(test, vec![1, 3]);
        assert_eq!(export, Some(InsightsFormat::Markdown));
    }

    // ========================================================================
    // TEST 3: unsupported formats are rejected at parse time
    // ========================================================================
    #[test]
    fn test_conversation_export_rejects_pdf() {
        let result = Cli::try_parse_from([
            "insights", "conversations", "export", "c1", "--format", "pdf",
        ]);
        assert!(result.is_err(), "conversations cannot be exported as pdf");

        let cli =
            Cli::try_parse_from(["insights", "conversations", "export", "c1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Conversations {
                action: ConversationAction::Export {
                    format: ConversationFormat::Json,
                    ..
                }
            }
        ));
    }

    // ========================================================================
    // TEST 4: interface flags take explicit values
    // ========================================================================
    #[test]
    fn test_settings_interface_arguments() {
        let cli = Cli::try_parse_from([
            "insights", "settings", "interface", "--dark-mode", "true", "--font-size", "large",
        ])
        .unwrap();

        let Commands::Settings {
            action:
                SettingsAction::Interface {
                    dark_mode,
                    font_size,
                    show_charts,
                    ..
                },
        } = cli.command
        else {
            panic!("expected settings interface");
        };
        assert_eq!(dark_mode, Some(true));
        assert_eq!(font_size, Some(FontSize::Large));
        assert_eq!(show_charts, None);
    }

    // ========================================================================
    // TEST 5: confirmation answers
    // ========================================================================
    #[test]
    fn test_confirmation_answers() {
        assert!(terminal::is_affirmative("y\n"));
        assert!(terminal::is_affirmative(" YES "));
        assert!(!terminal::is_affirmative("\n"));
        assert!(!terminal::is_affirmative("no"));
    }

    // ========================================================================
    // TEST 6: --yes skips the prompt entirely
    // ========================================================================
    #[test]
    fn test_assume_yes_confirms() {
        let surface = TerminalSurface::new(true, PathBuf::from("."), &[]);
        assert!(surface.confirm("Delete everything?"));
    }

    // ========================================================================
    // TEST 7: dark mode switches the toast palette
    // ========================================================================
    #[test]
    fn test_palette_follows_dark_mode() {
        let surface = TerminalSurface::new(true, PathBuf::from("."), &[]);
        assert!(!surface.dark());

        let prefs = UserPreferences {
            dark_mode: true,
            ..UserPreferences::default()
        };
        surface.apply_preferences(&prefs);
        assert!(surface.dark());
        assert_ne!(
            terminal::level_color(Level::Error, true),
            terminal::level_color(Level::Error, false)
        );
    }

    // ========================================================================
    // TEST 8: downloads land in the configured directory
    // ========================================================================
    #[test]
    fn test_deliver_writes_download() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("downloads");
        let surface = TerminalSurface::new(true, dir.clone(), &[]);

        let artifact = ConversationFormat::Csv.artifact(bytes::Bytes::from_static(b"role,content\n"));
        let path = surface.deliver(artifact).unwrap();

        assert_eq!(path, dir.join("conversation_export.csv"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "role,content\n");
    }

    // ========================================================================
    // TEST 9: out-of-range pages name the valid range
    // ========================================================================
    #[test]
    fn test_page_out_of_range_message() {
        assert_eq!(
            page_out_of_range(7, 3),
            "insights: no page 7, valid pages are 1-3"
        );
        assert_eq!(page_out_of_range(2, 1), "insights: no page 2, only page 1 exists");
        assert!(page_out_of_range(2, 0).contains("nothing to list"));
    }
}
