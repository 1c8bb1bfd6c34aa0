//! Saving and loading grid layouts.
//!
//! A layout is stored as JSON of the shape
//! `{ "size": n, "nodes": [[{ "row", "col", "isWall", "isStart", "isEnd", "weight" }, ..], ..] }`.
//! Search state is never written. Loading is lenient per cell (missing cells and
//! fields take their defaults) but rejects records without `size` or `nodes`.
use core::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use itertools::iproduct;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::node::{NodeRole, Position};
use crate::pathing_grid::PathingGrid;
use crate::{DEFAULT_WEIGHT, MAX_CELL_WEIGHT, MAX_GRID_SIZE};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRecord {
    pub size: usize,
    pub nodes: Vec<Vec<CellRecord>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    pub is_wall: bool,
    pub is_start: bool,
    pub is_end: bool,
    pub weight: u32,
}

impl From<&PathingGrid> for GridRecord {
    fn from(grid: &PathingGrid) -> Self {
        let nodes = grid
            .nodes()
            .map(|node| CellRecord {
                row: node.position().row,
                col: node.position().col,
                is_wall: node.is_wall(),
                is_start: node.is_start(),
                is_end: node.is_end(),
                weight: node.weight(),
            })
            .collect::<Vec<_>>()
            .chunks(grid.size())
            .map(<[CellRecord]>::to_vec)
            .collect();
        GridRecord {
            size: grid.size(),
            nodes,
        }
    }
}

/// Mirror of [GridRecord] where everything may be absent.
#[derive(Deserialize)]
struct LenientGridRecord {
    size: Option<usize>,
    nodes: Option<Vec<Option<Vec<Option<LenientCellRecord>>>>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LenientCellRecord {
    is_wall: Option<bool>,
    is_start: Option<bool>,
    is_end: Option<bool>,
    weight: Option<u32>,
}

#[derive(Debug)]
pub enum StorageError {
    Io { path: PathBuf, source: io::Error },
    Unavailable { reason: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "storage i/o error at {}: {source}", path.display())
            }
            Self::Unavailable { reason } => write!(f, "storage unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum PersistError {
    Malformed { reason: String },
    Storage(StorageError),
    Encode(serde_json::Error),
}

impl PersistError {
    fn malformed(reason: impl Into<String>) -> PersistError {
        PersistError::Malformed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed grid record: {reason}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "could not encode grid record: {err}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed { .. } => None,
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<StorageError> for PersistError {
    fn from(err: StorageError) -> Self {
        PersistError::Storage(err)
    }
}

pub fn encode(grid: &PathingGrid) -> Result<String, PersistError> {
    serde_json::to_string(&GridRecord::from(grid)).map_err(PersistError::Encode)
}

/// Builds a fresh grid from a saved record. Cells missing from the record stay at their
/// defaults and a weight of 0 counts as missing, a weight above [MAX_CELL_WEIGHT] is
/// rejected. Should the record mark several cells
/// as start (or end), the last one in row-major order wins.
pub fn decode(json: &str) -> Result<PathingGrid, PersistError> {
    let record: LenientGridRecord = serde_json::from_str(json)
        .map_err(|err| PersistError::malformed(err.to_string()))?;
    let size = match record.size {
        Some(0) | None => return Err(PersistError::malformed("missing grid size")),
        Some(size) if size > MAX_GRID_SIZE => {
            return Err(PersistError::malformed(format!(
                "grid size {size} exceeds {MAX_GRID_SIZE}"
            )))
        }
        Some(size) => size,
    };
    let rows = record
        .nodes
        .ok_or_else(|| PersistError::malformed("missing nodes"))?;
    let mut grid = PathingGrid::new(size).map_err(|err| PersistError::malformed(err.to_string()))?;

    let mut starts = 0;
    let mut ends = 0;
    for (row, col) in iproduct!(0..size, 0..size) {
        let Some(cell) = rows
            .get(row)
            .and_then(|r| r.as_ref())
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_ref())
        else {
            continue;
        };
        let ix = row * size + col;
        grid.set_wall(ix, cell.is_wall.unwrap_or(false));
        let weight = cell.weight.filter(|&w| w > 0).unwrap_or(DEFAULT_WEIGHT);
        if weight > MAX_CELL_WEIGHT {
            return Err(PersistError::malformed(format!(
                "weight {weight} at ({row}, {col}) exceeds {MAX_CELL_WEIGHT}"
            )));
        }
        grid.nodes[ix].weight = weight;
        let position = Position::new(row, col);
        if cell.is_start.unwrap_or(false) {
            starts += 1;
            grid.set_node_role(position, NodeRole::Start)
                .map_err(|err| PersistError::malformed(err.to_string()))?;
        }
        if cell.is_end.unwrap_or(false) {
            ends += 1;
            grid.set_node_role(position, NodeRole::End)
                .map_err(|err| PersistError::malformed(err.to_string()))?;
        }
    }
    if starts > 1 || ends > 1 {
        warn!("Grid record marks {starts} start and {ends} end cells, kept the last of each");
    }
    Ok(grid)
}

/// Storage medium for one saved grid.
pub trait GridStore {
    fn write(&mut self, contents: &str) -> Result<(), StorageError>;
    /// The saved contents, or [None] if nothing has been saved.
    fn read(&self) -> Result<Option<String>, StorageError>;

    fn save_grid(&mut self, grid: &PathingGrid) -> Result<(), PersistError> {
        let json = encode(grid)?;
        self.write(&json)?;
        info!("Saved {0}x{0} grid", grid.size());
        Ok(())
    }

    /// Loads the saved grid, [None] if nothing was saved.
    fn load_grid(&self) -> Result<Option<PathingGrid>, PersistError> {
        match self.read()? {
            Some(json) => decode(&json).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    contents: Option<String>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
    pub fn with_contents(contents: impl Into<String>) -> MemoryStore {
        MemoryStore {
            contents: Some(contents.into()),
        }
    }
}

impl GridStore for MemoryStore {
    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        self.contents = Some(contents.to_owned());
        Ok(())
    }
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents.clone())
    }
}

/// Keeps the saved grid in a single JSON file. A missing file means nothing was saved.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> FileStore {
        FileStore { path: path.into() }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl GridStore for FileStore {
    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        fs::write(&self.path, contents).map_err(|err| self.io_error(err))
    }
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }
}
