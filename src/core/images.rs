//! Image grouping - arrange micrograph files by protocol day and dish
//!
//! File names carry the day as `_{prefix}{n}_` (e.g. `DIF3_D7_#2_10x.jpg`),
//! optionally a dish as `#{id}` and a batch as `DIF{id}_`.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub const DEFAULT_PER_DISH: usize = 4;
pub const DEFAULT_PER_DAY: usize = 100;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid day prefix '{0}'")]
    InvalidPrefix(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Day label parsed from a file name; unknown days sort last
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DayKey {
    Day(u64),
    Unknown,
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayKey::Day(n) => write!(f, "Day {}", n),
            DayKey::Unknown => write!(f, "Day Unknown"),
        }
    }
}

/// Dish label parsed from a file name; files without one sort last
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DishKey {
    Dish(String),
    Unknown,
}

impl std::fmt::Display for DishKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DishKey::Dish(id) => write!(f, "Dish {}", id),
            DishKey::Unknown => write!(f, "Dish Unknown"),
        }
    }
}

/// Files of one day, either split by dish or as a flat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayImages {
    Dishes(Vec<(DishKey, Vec<String>)>),
    Flat(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub day: DayKey,
    pub images: DayImages,
}

impl DayGroup {
    pub fn file_count(&self) -> usize {
        match &self.images {
            DayImages::Dishes(dishes) => dishes.iter().map(|(_, files)| files.len()).sum(),
            DayImages::Flat(files) => files.len(),
        }
    }
}

/// Grouping parameters
#[derive(Debug, Clone)]
pub struct ImageGrouper {
    day_pattern: Regex,
    dish_pattern: Regex,
    batch_pattern: Regex,
    pub per_dish: usize,
    pub per_day: usize,
}

impl ImageGrouper {
    pub fn new(prefix: &str, per_dish: usize, per_day: usize) -> Result<Self, ImageError> {
        if prefix.trim().is_empty() {
            return Err(ImageError::InvalidPrefix(prefix.to_string()));
        }
        let day_pattern = Regex::new(&format!(r"(?i)_{}(\d+)_", regex::escape(prefix.trim())))
            .map_err(|_| ImageError::InvalidPrefix(prefix.to_string()))?;
        let dish_pattern =
            Regex::new(r"#([^_]+)").map_err(|_| ImageError::InvalidPrefix(prefix.to_string()))?;
        let batch_pattern =
            Regex::new(r"(?i)DIF(\d+)_").map_err(|_| ImageError::InvalidPrefix(prefix.to_string()))?;

        Ok(Self {
            day_pattern,
            dish_pattern,
            batch_pattern,
            per_dish,
            per_day,
        })
    }

    pub fn day_of(&self, name: &str) -> DayKey {
        self.day_pattern
            .captures(name)
            .and_then(|c| c[1].parse::<u64>().ok())
            .map_or(DayKey::Unknown, DayKey::Day)
    }

    pub fn dish_of(&self, name: &str) -> Option<String> {
        self.dish_pattern.captures(name).map(|c| c[1].to_string())
    }

    /// Batch ID from a `DIF{id}_` marker
    pub fn batch_of(&self, name: &str) -> Option<u32> {
        self.batch_pattern
            .captures(name)
            .and_then(|c| c[1].parse().ok())
    }

    /// Group file names by day, then by dish where any file of the day names one
    pub fn group<S: AsRef<str>>(&self, names: &[S]) -> Vec<DayGroup> {
        let mut by_day: BTreeMap<DayKey, Vec<String>> = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            by_day.entry(self.day_of(name)).or_default().push(name.to_string());
        }

        by_day
            .into_iter()
            .map(|(day, mut files)| {
                files.sort();
                let has_dish = files.iter().any(|f| self.dish_of(f).is_some());
                let images = if has_dish {
                    let mut by_dish: BTreeMap<DishKey, Vec<String>> = BTreeMap::new();
                    for file in files {
                        let key = self.dish_of(&file).map_or(DishKey::Unknown, DishKey::Dish);
                        by_dish.entry(key).or_default().push(file);
                    }
                    DayImages::Dishes(
                        by_dish
                            .into_iter()
                            .map(|(dish, mut files)| {
                                files.truncate(self.per_dish);
                                (dish, files)
                            })
                            .collect(),
                    )
                } else {
                    files.truncate(self.per_day);
                    DayImages::Flat(files)
                };
                DayGroup { day, images }
            })
            .collect()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// File names of the images directly inside `dir`
pub fn scan_images(dir: &Path) -> Result<Vec<String>, ImageError> {
    if !dir.is_dir() {
        return Err(ImageError::NotADirectory(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ImageError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    debug!(dir = %dir.display(), count = names.len(), "scanned images");
    Ok(names)
}
