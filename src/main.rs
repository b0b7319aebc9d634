use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use ego_lens::graph::GraphDocument;
use ego_lens::{NEIGHBORHOOD_DISTANCE_ALL, NeighborhoodAnalyzer, NodeId};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document (JSON).
    graph: PathBuf,

    /// Center node, by key or fuzzy label match. Repeat for several centers.
    #[arg(long = "center", value_name = "QUERY")]
    centers: Vec<String>,

    /// Hop distance for browse mode, or `all`.
    #[arg(long, value_parser = parse_distance)]
    distance: Option<u32>,

    #[arg(long)]
    browse: bool,

    #[arg(long)]
    butterfly: bool,

    /// Write the graph back out, hidden objects and mode included.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

fn parse_distance(raw: &str) -> Result<u32, String> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(NEIGHBORHOOD_DISTANCE_ALL);
    }
    match raw.parse::<u32>() {
        Ok(0) => Err("distance must be at least 1".to_string()),
        Ok(distance) => Ok(distance),
        Err(err) => Err(format!("expected a number or `all`: {err}")),
    }
}

#[derive(Debug, Serialize)]
struct Report {
    centers: Vec<String>,
    browse: bool,
    butterfly: bool,
    /// `None` when the distance is unlimited.
    distance: Option<u32>,
    visible: Vec<VisibleNode>,
    hidden: usize,
}

#[derive(Debug, Serialize)]
struct VisibleNode {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    layer: Option<i32>,
}

/// Resolves `--center` queries. Without any, the center saved in the document
/// is kept so the update does not fall back to the hub.
fn initial_selection(analyzer: &NeighborhoodAnalyzer, queries: &[String]) -> Result<Vec<NodeId>> {
    if queries.is_empty() {
        return Ok(analyzer.get_center().to_vec());
    }

    let graph = analyzer
        .graph()
        .ok_or_else(|| anyhow!("no graph loaded"))?;
    let mut selected = Vec::with_capacity(queries.len());
    for query in queries {
        let matches = graph.find_nodes(query);
        let Some(&id) = matches.first() else {
            return Err(anyhow!("no node matches {query:?}"));
        };
        if matches.len() > 1 {
            warn!(query = %query, candidates = matches.len(), "ambiguous center; using best match");
        }
        selected.push(id);
    }
    Ok(selected)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let raw = fs::read_to_string(&args.graph)
        .with_context(|| format!("failed to read {}", args.graph.display()))?;
    let graph = GraphDocument::from_json(&raw)
        .and_then(GraphDocument::into_graph)
        .with_context(|| format!("failed to load {}", args.graph.display()))?;
    info!(
        nodes = graph.node_count(),
        links = graph.link_count(),
        "loaded graph"
    );

    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);

    let selected = initial_selection(&analyzer, &args.centers)?;
    analyzer.selection_mut().set(selected);

    if let Some(distance) = args.distance {
        analyzer.set_distance(distance)?;
    }
    if args.browse {
        analyzer.set_browse_mode(true)?;
    }
    if args.butterfly {
        analyzer.set_butterfly_mode(true);
    }
    analyzer.update_neighborhood()?;

    let graph = analyzer
        .graph()
        .ok_or_else(|| anyhow!("graph was unbound during the update"))?;
    let key_of = |id| graph.node(id).map(|node| node.key.clone());
    let report = Report {
        centers: analyzer.get_center().iter().filter_map(|&id| key_of(id)).collect(),
        browse: analyzer.browse_mode(),
        butterfly: analyzer.butterfly_mode(),
        distance: (analyzer.distance() != NEIGHBORHOOD_DISTANCE_ALL).then_some(analyzer.distance()),
        visible: graph
            .visible_nodes()
            .filter_map(|id| {
                Some(VisibleNode {
                    id: key_of(id)?,
                    layer: analyzer.layer_of(id),
                })
            })
            .collect(),
        hidden: analyzer.hidden().len(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );

    if let Some(path) = &args.save {
        let document = GraphDocument::from_graph(graph).to_json()?;
        fs::write(path, document).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved graph");
    }

    Ok(())
}
