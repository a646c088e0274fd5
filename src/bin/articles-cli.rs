use std::path::PathBuf;

use axum::http::HeaderMap;
use clap::{Parser, Subcommand};
use serde_json::Value;
use url::Url;

use articles_service::articles::mock_data;
use articles_service::observability::{Propagator, SpanContext, TraceContext, W3cPropagator};

#[derive(Parser)]
#[command(name = "articles-cli")]
#[command(about = "Client and mock data generator for the articles service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single article
    Get {
        id: String,
        #[arg(long)]
        with_suggested: bool,
    },
    /// List every article
    List {
        #[arg(long)]
        with_suggested: bool,
    },
    /// Write articles.json and suggestions.json for local runs
    Generate {
        #[arg(long, default_value_t = 20)]
        articles: usize,
        #[arg(long, default_value_t = 3)]
        suggestions: usize,
        #[arg(long, default_value = "mocks")]
        out_dir: PathBuf,
        /// Fixed seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            articles,
            suggestions,
            out_dir,
            seed,
        } => {
            let data = mock_data::generate(articles, suggestions, seed)?;
            let (articles_path, suggestions_path) = data.write_to(&out_dir)?;
            println!("Wrote {}", articles_path.display());
            println!("Wrote {}", suggestions_path.display());
        }
        Commands::Get { id, with_suggested } => {
            let url = articles_url(&cli.url, Some(&id))?;
            fetch(url, with_suggested).await?;
        }
        Commands::List { with_suggested } => {
            let url = articles_url(&cli.url, None)?;
            fetch(url, with_suggested).await?;
        }
    }

    Ok(())
}

/// `<base>/articles/v1/` or `<base>/articles/v1/<id>/`, with `id` escaped as one segment.
fn articles_url(base: &str, id: Option<&str>) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| format!("`{}` cannot be a base url", base))?;
        segments.pop_if_empty().extend(["articles", "v1"]);
        if let Some(id) = id {
            segments.push(id);
        }
        // Trailing slash.
        segments.push("");
    }
    Ok(url)
}

/// Issue a GET as the root of a new trace and print the result.
async fn fetch(url: Url, with_suggested: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = TraceContext::background().with_span(SpanContext::new_child(None));
    let mut headers = HeaderMap::new();
    W3cPropagator.inject(&ctx, &mut headers);
    eprintln!("trace_id={}", ctx.trace_id().unwrap_or_default());

    let mut request = reqwest::Client::new().get(url).headers(headers);
    if with_suggested {
        request = request.query(&[("with_suggested", "true")]);
    }

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: articles service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    if let Some(error) = json.get("error") {
        eprintln!("Error: {}", error);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_articles_url_escapes_id() {
        let url = articles_url("http://localhost:8080", Some("a/b c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/articles/v1/a%2Fb%20c/");

        let url = articles_url("http://localhost:8080/", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/articles/v1/");
    }

    #[test]
    fn test_articles_url_rejects_bad_base() {
        assert!(articles_url("not a url", None).is_err());
    }
}
