use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use shelf_app::books::listing;
use shelf_app::books::models::{Book, ListQuery, SortKey};
use shelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "shelf", version, about = "Personal book tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web application
    Serve,
    /// Print the book list without resolving covers
    List {
        /// Order by rating (highest first) or title
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Keep books whose title or author contains this text
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Rating,
    Alphabetical,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Rating => SortKey::Rating,
            SortArg::Alphabetical => SortKey::Alphabetical,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "shelf serve starting");
            shelf_app::bootstrap::serve(settings).await
        }
        Command::List { sort, search } => {
            let query = ListQuery {
                sort: sort.map(|s| SortKey::from(s).as_str().to_string()),
                search,
            };
            list(&settings, &query).await
        }
    }
}

async fn list(settings: &Settings, query: &ListQuery) -> anyhow::Result<()> {
    let (store, _registry) = shelf_app::bootstrap::prepare(settings).await?;
    let books = store.list().await.context("failed to read books")?;
    store.close().await;

    let books = listing::apply(books, query);
    if books.is_empty() {
        println!("No books found.");
        return Ok(());
    }

    for book in &books {
        println!("{}", format_line(book));
    }
    Ok(())
}

fn format_line(book: &Book) -> String {
    format!(
        "{:>4}  {}/5  {} by {}",
        book.id, book.rating, book.title, book.author
    )
}
