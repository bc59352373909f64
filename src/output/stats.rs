//! Statistics generation from a link graph
//!
//! This module provides functionality for summarizing a graph, either the
//! one held by a running crawl or one loaded back from the state file.

use crate::graph::LinkGraph;
use crate::url::extract_domain;
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Link graph statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStatistics {
    /// Number of page records
    pub pages: u64,

    /// Number of distinct (parent, child) edges
    pub edges: u64,

    /// Sum of access counts over all edges
    pub edge_accesses: u64,

    /// Number of distinct child URLs across all pages
    pub distinct_children: u64,

    /// Number of (page, image) references
    pub image_references: u64,

    /// Number of distinct local image files referenced
    pub distinct_images: u64,

    /// Page records per host
    pub pages_by_host: BTreeMap<String, u64>,
}

impl GraphStatistics {
    /// Computes statistics over every page in `graph`
    pub fn from_graph(graph: &LinkGraph) -> Self {
        let mut stats = Self::default();
        let mut children = HashSet::new();
        let mut image_files = HashSet::new();

        for (url, page) in graph.pages() {
            stats.pages += 1;

            let host = Url::parse(url)
                .ok()
                .and_then(|u| extract_domain(&u))
                .unwrap_or_else(|| "(unknown)".to_string());
            *stats.pages_by_host.entry(host).or_insert(0) += 1;

            for (child, edge) in &page.children {
                stats.edges += 1;
                stats.edge_accesses += edge.access_count;
                children.insert(child.as_str());
            }

            for path in page.images.values() {
                stats.image_references += 1;
                image_files.insert(path.as_path());
            }
        }

        stats.distinct_children = children.len() as u64;
        stats.distinct_images = image_files.len() as u64;
        stats
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &GraphStatistics) {
    println!("=== Link Graph Statistics ===\n");

    println!("Overview:");
    println!("  Pages recorded: {}", stats.pages);
    println!("  Unique hosts: {}", stats.pages_by_host.len());
    println!("  Edges: {}", stats.edges);
    println!("  Edge accesses: {}", stats.edge_accesses);
    println!("  Distinct link targets: {}", stats.distinct_children);
    println!();

    println!("Images:");
    println!("  References: {}", stats.image_references);
    println!("  Distinct files: {}", stats.distinct_images);
    println!();

    if !stats.pages_by_host.is_empty() {
        println!("Pages by Host:");
        // Sort hosts by count (descending)
        let mut host_counts: Vec<_> = stats.pages_by_host.iter().collect();
        host_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (host, count) in host_counts.into_iter().take(20) {
            let percentage = (*count as f64 / stats.pages as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", host, count, percentage);
        }
    }
}
