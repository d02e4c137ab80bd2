use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wiki_core::{
    config::config_from_env,
    highlight::Segment,
    view::{DetailView, HighlightedBlock, MainPane, RenderedBlock, SearchPanel},
    ContentApi, ContentBundle, HttpContentApi, Panel, StaticContentApi, Viewer, ViewerConfig,
};
use wiki_types::NodeId;

#[derive(Parser)]
#[command(name = "wiki")]
#[command(about = "Personal wiki viewer CLI")]
struct Cli {
    /// Content API base URL (overrides WIKI_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Search debounce in milliseconds (overrides WIKI_SEARCH_DEBOUNCE_MS)
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,
    /// Read content from a local JSON or YAML bundle instead of the content API
    #[arg(long, global = true)]
    bundle: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sidebar tree
    Tree {
        /// Path of node ids to open, root first (comma-separated)
        #[arg(long, value_delimiter = ',')]
        open: Vec<NodeId>,
    },
    /// Show one node with its variables substituted
    Show {
        /// Node id
        id: NodeId,
        /// Path of node ids reaching the node, root first (defaults to the node itself)
        #[arg(long, value_delimiter = ',')]
        path: Vec<NodeId>,
    },
    /// Search titles and content, marking matches as [term]
    Search {
        /// Search query
        query: String,
    },
    /// List the variable dictionary
    Variables,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wiki_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'wiki --help' for commands");
        return Ok(());
    };

    let mut config = config_from_env()?;
    if let Some(api_url) = cli.api_url {
        config = ViewerConfig::new(api_url, config.search_debounce(), config.request_timeout())?;
    }
    if let Some(ms) = cli.debounce_ms {
        config = config.with_search_debounce(Duration::from_millis(ms));
    }

    match cli.bundle {
        Some(path) => {
            let api = StaticContentApi::new(ContentBundle::from_path(&path)?);
            run(Viewer::new(api, &config), command).await
        }
        None => {
            let api = HttpContentApi::new(&config)?;
            run(Viewer::new(api, &config), command).await
        }
    }
}

async fn run<A: ContentApi>(mut viewer: Viewer<A>, command: Commands) -> anyhow::Result<()> {
    viewer.start();
    viewer.run_until_idle().await;
    report_failures(&viewer);

    match command {
        Commands::Tree { open } => {
            for depth in 1..=open.len() {
                let path = open[..depth].to_vec();
                viewer.click(open[depth - 1], path)?;
                viewer.run_until_idle().await;
            }
            report_failures(&viewer);
            print_tree(&viewer);
        }
        Commands::Show { id, path } => {
            let path = if path.is_empty() { vec![id] } else { path };
            viewer.click(id, path)?;
            viewer.run_until_idle().await;
            report_failures(&viewer);
            match viewer.main_pane() {
                MainPane::Details(detail) => print_detail(&detail),
                _ => println!("Node {id} could not be loaded."),
            }
        }
        Commands::Search { query } => {
            viewer.submit_query(&query);
            viewer.run_until_idle().await;
            report_failures(&viewer);
            match viewer.main_pane() {
                MainPane::Search(panel) => print_search(&panel),
                _ => println!("No results."),
            }
        }
        Commands::Variables => {
            let mut variables: Vec<_> = viewer.store().variables().values().collect();
            variables.sort_by(|a, b| a.id.cmp(&b.id));
            if variables.is_empty() {
                println!("No variables found.");
            }
            for variable in variables {
                println!("{}: {}", variable.id, variable.name);
            }
        }
    }

    Ok(())
}

fn report_failures<A: ContentApi>(viewer: &Viewer<A>) {
    for panel in [Panel::Sidebar, Panel::Variables, Panel::Details, Panel::Search] {
        if let Some(message) = viewer.failure(panel) {
            eprintln!("{panel:?}: {message}");
        }
    }
}

fn print_tree<A: ContentApi>(viewer: &Viewer<A>) {
    for row in viewer.tree() {
        let marker = match (row.active, row.expanded) {
            (true, _) => '*',
            (false, true) => '-',
            (false, false) => '+',
        };
        println!("{}{marker} {} ({})", "  ".repeat(row.depth), row.title, row.id);
    }
}

fn print_detail(detail: &DetailView) {
    println!("# {}", detail.title);
    for block in &detail.blocks {
        match block {
            RenderedBlock::Text(runs) => {
                println!("{}", runs.iter().map(|r| r.text()).collect::<String>())
            }
            RenderedBlock::Image { url } => println!("[image: {url}]"),
        }
    }
}

fn marked(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text.clone(),
            Segment::Mark(text) => format!("[{text}]"),
        })
        .collect()
}

fn print_search(panel: &SearchPanel) {
    if panel.hits.is_empty() {
        println!("No results for \"{}\".", panel.query);
        return;
    }
    for hit in &panel.hits {
        println!("# {} ({})", marked(&hit.title), hit.id);
        for block in &hit.blocks {
            match block {
                HighlightedBlock::Text(runs) => {
                    let line: String = runs.iter().map(|run| marked(&run.segments)).collect();
                    println!("  {line}");
                }
                HighlightedBlock::Image { url } => println!("  [image: {url}]"),
            }
        }
    }
}
