use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use search::{AlgoliaClient, SearchClient, SearchConfig, SearchRequest, fetch_all_pages};
use serde_json::Value;
use tools::{bbox_report, config_report, format_hit, legend_report, length_report, parse_legend_flags};
use tracing_subscriber::EnvFilter;
use viewer::ViewerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "bbox" => cmd_bbox(args),
        "config" => cmd_config(args),
        "legend-filter" => cmd_legend_filter(args),
        "length" => cmd_length(args),
        "search" => cmd_search(args).await,
        _ => Err(usage()),
    }
}

fn read_json(path: &Path) -> Result<Value, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("parse {path:?}: {e}"))
}

fn print_json(v: &impl serde::Serialize) -> Result<(), String> {
    let text = serde_json::to_string_pretty(v).map_err(|e| format!("json: {e}"))?;
    println!("{text}");
    Ok(())
}

fn cmd_bbox(args: Vec<String>) -> Result<(), String> {
    // trailmap bbox <region.geojson> [more.geojson ...]
    if args.is_empty() {
        return Err(usage());
    }
    for arg in args {
        let path = PathBuf::from(&arg);
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("invalid path: {path:?}"))?
            .to_string();
        let report = bbox_report(&file_name, &read_json(&path)?)?;
        print_json(&report)?;
    }
    Ok(())
}

fn cmd_config(args: Vec<String>) -> Result<(), String> {
    // trailmap config
    if !args.is_empty() {
        return Err(usage());
    }
    let viewer = ViewerConfig::from_env();
    let search = SearchConfig::from_env();
    let complete = viewer.is_ok() && search.is_ok();
    print_json(&config_report(viewer, search))?;
    if complete {
        Ok(())
    } else {
        Err("configuration incomplete".to_string())
    }
}

fn cmd_legend_filter(args: Vec<String>) -> Result<(), String> {
    // trailmap legend-filter <flags> [--km VALUE]
    if args.is_empty() {
        return Err(usage());
    }

    let mut flags: Option<String> = None;
    let mut km: Option<f64> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--km" => {
                i += 1;
                if i >= args.len() {
                    return Err("--km requires a value".to_string());
                }
                let v = args[i]
                    .parse::<f64>()
                    .map_err(|_| format!("invalid --km: {}", args[i]))?;
                km = Some(v);
            }
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            s => flags = Some(s.to_string()),
        }
        i += 1;
    }

    let flags = flags.ok_or_else(|| "legend-filter requires a flag string".to_string())?;
    let selection = parse_legend_flags(&flags)?;
    print_json(&legend_report(&selection, km))
}

fn cmd_length(args: Vec<String>) -> Result<(), String> {
    // trailmap length <properties-json | @file.json>
    let [arg] = args.as_slice() else {
        return Err(usage());
    };
    let props = match arg.strip_prefix('@') {
        Some(path) => read_json(Path::new(path))?,
        None => serde_json::from_str(arg).map_err(|e| format!("parse properties: {e}"))?,
    };
    print_json(&length_report(&props)?)
}

async fn cmd_search(args: Vec<String>) -> Result<(), String> {
    // trailmap search <query> [--all] [--pages N] [--refine ATTR=VALUE ...]
    let mut query: Option<String> = None;
    let mut all = false;
    let mut max_pages = search::pagination::MAX_PAGES;
    let mut refinements: Vec<(String, String)> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => all = true,
            "--pages" => {
                i += 1;
                if i >= args.len() {
                    return Err("--pages requires a value".to_string());
                }
                max_pages = args[i]
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --pages: {}", args[i]))?;
                all = true;
            }
            "--refine" => {
                i += 1;
                let pair = args.get(i).ok_or_else(|| "--refine requires ATTR=VALUE".to_string())?;
                let (attr, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("invalid --refine: {pair}"))?;
                refinements.push((attr.to_string(), value.to_string()));
            }
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            s => query = Some(s.to_string()),
        }
        i += 1;
    }

    let config = SearchConfig::from_env().map_err(|e| e.to_string())?;
    let client = AlgoliaClient::new(&config);
    let mut request = SearchRequest::new(query.unwrap_or_default(), config.hits_per_page);
    for (attr, value) in refinements {
        request.refinements.entry(attr).or_default().push(value);
    }

    let hits = if all {
        fetch_all_pages(&client, &config.index_name, &request, max_pages)
            .await
            .map_err(|e| e.to_string())?
    } else {
        let page = client
            .search(&config.index_name, &request)
            .await
            .map_err(|e| e.to_string())?;
        eprintln!("{} hits, page {} of {}", page.nb_hits, page.page + 1, page.nb_pages.max(1));
        page.hits
    };

    for hit in &hits {
        println!("{}", format_hit(hit));
    }
    tracing::info!(count = hits.len(), index = %config.index_name, "search done");
    Ok(())
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "trailmap".to_string());
    format!(
        "usage:\n  {exe} bbox <region.geojson> [more.geojson ...]\n  {exe} config\n  {exe} legend-filter <flags e.g. 11011> [--km VALUE]\n  {exe} length <properties-json | @file.json>\n  {exe} search <query> [--all] [--pages N] [--refine ATTR=VALUE ...]\n\nconfig reads MAPBOX_TOKEN, TRAILMAP_ASSET_BASE and TRAILMAP_STYLE.\nsearch reads ALGOLIA_APP_ID, ALGOLIA_SEARCH_KEY and ALGOLIA_INDEX_NAME.\nset RUST_LOG=debug for request logging."
    )
}
