//! Mesh clustering: triangulated meshes to polygon islands.
//!
//! Vertices are grouped into connected components over the triangle
//! adjacency graph. The triangles of each component are unioned into one
//! polygon set, optionally inflated by a mitered offset.

use crate::boolean;
use polynest_core::geometry::{signed_area2, IntPoint, Ngon, Ngons};
use polynest_core::{Error, Result};
use rayon::prelude::*;
use std::collections::{BTreeSet, VecDeque};

/// Offsets below this distance are skipped.
pub const MIN_MITER_DISTANCE: f64 = 1e-5;

/// Polygon islands extracted from a mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshClusters {
    /// Cluster index of every input vertex.
    pub vertex_clusters: Vec<usize>,
    /// One polygon set per cluster.
    pub polygons: Vec<Ngons>,
}

impl MeshClusters {
    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Returns true when the mesh produced no clusters.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Builds polygon islands from vertex positions and a flat triangle index list.
#[derive(Debug, Clone)]
pub struct ClusterBuilder<'a> {
    points: &'a [IntPoint],
    triangles: &'a [usize],
    miter_distance: f64,
}

impl<'a> ClusterBuilder<'a> {
    /// Creates a builder over `points` and `triangles` (three indices per face).
    pub fn new(points: &'a [IntPoint], triangles: &'a [usize]) -> Self {
        Self {
            points,
            triangles,
            miter_distance: 0.0,
        }
    }

    /// Sets the miter offset applied to each island, in fixed-point units.
    pub fn with_miter_distance(mut self, distance: f64) -> Self {
        self.miter_distance = distance;
        self
    }

    /// Clusters the mesh and unions each island.
    pub fn build(&self) -> Result<MeshClusters> {
        let graph = self.adjacency()?;
        let (vertex_clusters, count) = connected_components(&graph);
        let groups = self.group_triangles(&vertex_clusters, count);

        let miter = self.miter_distance;
        let polygons = groups
            .par_iter()
            .enumerate()
            .map(|(id, tris)| union_cluster(id, tris, miter))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "clustered {} vertices / {} triangles into {} islands",
            self.points.len(),
            self.triangles.len() / 3,
            polygons.len()
        );

        Ok(MeshClusters {
            vertex_clusters,
            polygons,
        })
    }

    fn adjacency(&self) -> Result<Vec<BTreeSet<usize>>> {
        if self.triangles.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "triangle index count {} is not a multiple of 3",
                self.triangles.len()
            )));
        }

        let n = self.points.len();
        let mut graph = vec![BTreeSet::new(); n];
        for tri in self.triangles.chunks_exact(3) {
            if let Some(&bad) = tri.iter().find(|&&i| i >= n) {
                return Err(Error::InvalidMesh(format!(
                    "triangle index {} out of range for {} vertices",
                    bad, n
                )));
            }
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            graph[a].extend([b, c]);
            graph[b].extend([a, c]);
            graph[c].extend([a, b]);
        }

        if let Some(lonely) = graph.iter().position(|adj| adj.is_empty()) {
            return Err(Error::InvalidMesh(format!(
                "vertex {} is not referenced by any triangle",
                lonely
            )));
        }
        Ok(graph)
    }

    fn group_triangles(&self, vertex_clusters: &[usize], count: usize) -> Vec<Ngons> {
        let mut groups = vec![Ngons::new(); count];
        for tri in self.triangles.chunks_exact(3) {
            let mut ngon: Ngon = tri.iter().map(|&i| self.points[i]).collect();
            if signed_area2(&ngon) < 0 {
                ngon.reverse();
            }
            groups[vertex_clusters[tri[0]]].push(ngon);
        }
        groups
    }
}

/// Breadth-first labelling; clusters are numbered in order of their lowest vertex.
fn connected_components(graph: &[BTreeSet<usize>]) -> (Vec<usize>, usize) {
    let mut ids = vec![usize::MAX; graph.len()];
    let mut count = 0;
    let mut open = VecDeque::new();

    for seed in 0..graph.len() {
        if ids[seed] != usize::MAX {
            continue;
        }
        ids[seed] = count;
        open.push_back(seed);
        while let Some(v) = open.pop_front() {
            for &next in &graph[v] {
                if ids[next] == usize::MAX {
                    ids[next] = count;
                    open.push_back(next);
                }
            }
        }
        count += 1;
    }
    (ids, count)
}

fn union_cluster(id: usize, triangles: &[Ngon], miter: f64) -> Result<Ngons> {
    let filled = boolean::simplify(triangles);
    if filled.is_empty() {
        return Err(Error::InvalidMesh(format!(
            "cluster {} has no area",
            id
        )));
    }
    if miter < MIN_MITER_DISTANCE {
        return Ok(filled);
    }
    let grown = boolean::simplify(&boolean::offset_miter(&filled, miter));
    if grown.is_empty() {
        return Err(Error::InvalidMesh(format!(
            "cluster {} vanished under a miter offset of {}",
            id, miter
        )));
    }
    Ok(grown)
}
