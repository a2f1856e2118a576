//! Graph tables and the JSON document handed to the visualization front end.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::WrapErr, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cache::write_atomic;
use crate::graph::{Edge, GraphSnapshot, Node};

pub const NODES_FILE: &str = "nodes.csv";
pub const EDGES_FILE: &str = "edges.csv";
pub const GRAPH_FILE: &str = "graph.json";

const NODE_COLUMNS: [&str; 5] = ["type", "name", "description", "weight", "region"];
const EDGE_COLUMNS: [&str; 6] = ["from_type", "from_name", "edge", "to_type", "to_name", "weight"];

#[derive(Serialize)]
struct GraphDocument<'a> {
  generated_at: DateTime<Utc>,
  account_id: Option<&'a str>,
  nodes: &'a [Node],
  edges: &'a [Edge],
}

/// Write `nodes.csv`, `edges.csv` and `graph.json` under `dir`, each atomically.
pub fn write_snapshot(dir: &Path, snapshot: &GraphSnapshot, account_id: Option<&str>) -> Result<Vec<PathBuf>> {
  std::fs::create_dir_all(dir).wrap_err_with(|| format!("Failed to create output dir {}", dir.display()))?;

  let nodes = dir.join(NODES_FILE);
  write_file(&nodes, &to_csv(&NODE_COLUMNS, &snapshot.nodes)?)?;

  let edges = dir.join(EDGES_FILE);
  write_file(&edges, &to_csv(&EDGE_COLUMNS, &snapshot.edges)?)?;

  let document = GraphDocument {
    generated_at: Utc::now(),
    account_id,
    nodes: &snapshot.nodes,
    edges: &snapshot.edges,
  };
  let graph = dir.join(GRAPH_FILE);
  let json = serde_json::to_vec_pretty(&document).wrap_err("Failed to serialize graph document")?;
  write_file(&graph, &json)?;

  info!(
    dir = %dir.display(),
    nodes = snapshot.nodes.len(),
    edges = snapshot.edges.len(),
    "wrote graph"
  );

  Ok(vec![nodes, edges, graph])
}

// The header is written by hand so an empty table still gets one.
fn to_csv<T: Serialize>(columns: &[&str], rows: &[T]) -> Result<Vec<u8>> {
  let mut wtr = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(vec![]);

  wtr.write_record(columns)?;
  for row in rows {
    wtr.serialize(row)?;
  }

  wtr.into_inner().wrap_err("Failed to flush csv")
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
  write_atomic(path, contents).wrap_err_with(|| format!("Failed to write {}", path.display()))
}
