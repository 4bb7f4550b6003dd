//! Library index over loaded prompt records.
//!
//! Loads records from a directory tree, builds a name-keyed cache, and
//! exposes listing, filtering, search, and statistics over it. The cache is
//! populated by one blocking scan and read-only afterwards; rebuilding means
//! constructing a new [`PromptLibrary`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::LibraryError;
use crate::prompt::Prompt;

/// Aggregate statistics over a loaded library.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryStats {
    /// Total number of cached records.
    pub total_prompts: usize,
    /// Number of distinct categories.
    pub categories: usize,
    /// Record count per category, for categories present in the library.
    pub category_counts: BTreeMap<String, usize>,
    /// Distinct recommended-model identifiers in use.
    pub models_used: Vec<String>,
}

/// The loaded, queryable collection of prompt records.
///
/// Each instance owns its own cache; there is no process-wide singleton.
#[derive(Debug, Default)]
pub struct PromptLibrary {
    /// Cache of loaded records, keyed by record name.
    cache: HashMap<String, Prompt>,
}

impl PromptLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Creates a library from an explicit set of records, keyed by name.
    ///
    /// Primarily useful for tests and embedding.
    pub fn from_prompts(prompts: impl IntoIterator<Item = Prompt>) -> Self {
        let mut library = Self::new();
        for prompt in prompts {
            library.cache.insert(prompt.name.clone(), prompt);
        }
        library
    }

    /// Loads all records beneath `root` and returns the populated library.
    ///
    /// Scans recursively for `.yaml`/`.yml` files in sorted path order, so a
    /// name collision deterministically resolves to the lexicographically
    /// last file. A file that fails to parse is skipped with a debug trace;
    /// a single corrupt record never aborts the load. A missing root is
    /// treated as an empty library; only a root that exists but cannot be
    /// traversed raises an error.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let root = root.as_ref();
        let mut library = Self::new();

        if !root.exists() {
            tracing::debug!(root = %root.display(), "Prompt root does not exist, library is empty");
            return Ok(library);
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| LibraryError::Traversal {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();

            let is_yaml = path
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if entry.file_type().is_dir() || !is_yaml {
                continue;
            }

            match load_prompt_file(path) {
                Ok(prompt) => {
                    // Last-write-wins on name collision, by policy.
                    library.cache.insert(prompt.name.clone(), prompt);
                }
                Err(reason) => {
                    tracing::debug!(file = %path.display(), %reason, "Skipping malformed prompt file");
                }
            }
        }

        tracing::info!(
            count = library.cache.len(),
            root = %root.display(),
            "Loaded prompt library"
        );
        Ok(library)
    }

    /// Returns all records ordered by (category, name) ascending.
    pub fn list_prompts(&self) -> Vec<&Prompt> {
        let mut prompts: Vec<&Prompt> = self.cache.values().collect();
        prompts.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        prompts
    }

    /// Looks up a record by exact name. Absence is not an error.
    pub fn get_prompt(&self, name: &str) -> Option<&Prompt> {
        self.cache.get(name)
    }

    /// Returns all records whose category exactly equals `category`.
    ///
    /// Order is cache-iteration order; callers that need a stable order
    /// must sort.
    pub fn get_by_category(&self, category: &str) -> Vec<&Prompt> {
        self.cache
            .values()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Returns the distinct category values, sorted.
    pub fn get_categories(&self) -> Vec<String> {
        let categories: BTreeSet<&str> =
            self.cache.values().map(|p| p.category.as_str()).collect();
        categories.into_iter().map(String::from).collect()
    }

    /// Case-insensitive substring search over name, description, and tags.
    ///
    /// Order is unspecified, as with [`Self::get_by_category`].
    pub fn search(&self, query: &str) -> Vec<&Prompt> {
        let query = query.to_lowercase();
        self.cache
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&query)
                    || p.description.to_lowercase().contains(&query)
                    || p.metadata
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Computes aggregate statistics over the cache.
    pub fn get_stats(&self) -> LibraryStats {
        let categories = self.get_categories();
        let category_counts = categories
            .iter()
            .map(|cat| (cat.clone(), self.get_by_category(cat).len()))
            .collect();
        let models: BTreeSet<&str> = self
            .cache
            .values()
            .map(|p| p.metadata.recommended_model.as_str())
            .collect();

        LibraryStats {
            total_prompts: self.cache.len(),
            categories: categories.len(),
            category_counts,
            models_used: models.into_iter().map(String::from).collect(),
        }
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the library holds no records.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Parses one record file. The error is a human-readable reason used only
/// for the skip trace.
fn load_prompt_file(path: &Path) -> Result<Prompt, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let mut prompt: Prompt = serde_yaml::from_str(&content).map_err(|e| e.to_string())?;
    prompt.source_path = Some(path.to_path_buf());
    Ok(prompt)
}
