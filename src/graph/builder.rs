//! Corpus builder: scans a directory and builds the module graph.
//!
//! Walks source files respecting .gitignore, parses each with the given
//! [`ModuleParser`], names modules after their directory, and assembles the
//! immutable [`GraphSnapshot`] served to queries.

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::engine::DependencyGraph;
use super::projector;
use super::registry::FunctionRegistry;
use super::types::Graph3D;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::parser::{strip_bom, ModuleParser, ModuleTree};

/// The built graph together with its 3D projection. Immutable once built.
pub struct GraphSnapshot {
    pub graph: DependencyGraph,
    pub projection: Graph3D,
    pub report: BuildReport,
}

impl GraphSnapshot {
    /// Build and project a registry that was filled by hand.
    pub fn from_registry(registry: FunctionRegistry) -> Self {
        let graph = DependencyGraph::build(registry);
        let projection = projector::project(graph.data());
        Self {
            graph,
            projection,
            report: BuildReport::default(),
        }
    }
}

/// What happened to the files of one build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub files_found: usize,
    pub modules_parsed: usize,
    pub skipped: Vec<PathBuf>,
}

impl std::fmt::Display for BuildReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Found {} source files ({} parsed, {} skipped)",
            self.files_found,
            self.modules_parsed,
            self.skipped.len()
        )
    }
}

/// Build the module graph from every source file under `config.root`.
///
/// Files that cannot be read or parsed are logged and skipped. The only
/// error is a root that cannot be enumerated.
pub fn build_graph(config: &GraphConfig, parser: &dyn ModuleParser) -> Result<GraphSnapshot> {
    let files = source_files(config)?;
    info!(root = %config.root.display(), files = files.len(), "building module graph");

    // Parsed in parallel, merged in path order so ids are reproducible.
    let parsed: Vec<(&PathBuf, Result<ModuleTree>)> = files
        .par_iter()
        .map(|path| (path, load_module(path, config, parser)))
        .collect();

    let mut report = BuildReport {
        files_found: files.len(),
        ..BuildReport::default()
    };
    let mut registry = FunctionRegistry::new();

    for (path, result) in parsed {
        match result {
            Ok(module) => {
                debug!(file = %path.display(), module = %module.name, "ingesting module");
                registry.ingest(&module);
                report.modules_parsed += 1;
            }
            Err(e) => {
                warn!(error = %e, "skipping file");
                report.skipped.push(path.clone());
            }
        }
    }

    let graph = DependencyGraph::build(registry);
    let projection = projector::project(graph.data());
    info!(
        parsed = report.modules_parsed,
        skipped = report.skipped.len(),
        "module graph ready"
    );

    Ok(GraphSnapshot {
        graph,
        projection,
        report,
    })
}

/// Source files under the root, sorted by path.
fn source_files(config: &GraphConfig) -> Result<Vec<PathBuf>> {
    let root = &config.root;
    fs::metadata(root).map_err(|e| GraphError::Walk {
        root: root.clone(),
        source: ignore::Error::from(e),
    })?;

    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "cannot enter path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| has_extension(entry.path(), &config.extension))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Read, decode and parse one file, then name the module after its path.
fn load_module(path: &Path, config: &GraphConfig, parser: &dyn ModuleParser) -> Result<ModuleTree> {
    let bytes = fs::read(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let data = if config.strip_bom {
        strip_bom(&bytes)
    } else {
        &bytes[..]
    };

    let text = std::str::from_utf8(data).map_err(|e| GraphError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    let mut module = parser.parse(text).map_err(|source| GraphError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let relative = path.strip_prefix(&config.root).unwrap_or(path);
    module.name = match module_name_for(relative, config.module_name_depth) {
        Some(name) => name,
        None => {
            let stem = file_stem(path);
            warn!(file = %path.display(), module = %stem, "path too short for module name, using file stem");
            stem
        }
    };
    Ok(module)
}

/// Name of the directory `depth` levels above the file, e.g. depth 2 for
/// `CommonModules/<Name>/Ext/Module.bsl`. Depth 0 names the module after
/// the file itself.
pub fn module_name_for(path: &Path, depth: usize) -> Option<String> {
    if depth == 0 {
        return Some(file_stem(path));
    }
    path.ancestors()
        .nth(depth)
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BslParser;
    use std::collections::BTreeSet;

    const FOO: &str = "Процедура Foo() Экспорт\n    ModuleB.Bar();\nКонецПроцедуры\n";
    const BAR: &str = "Процедура Bar() Экспорт\n    А = 1;\n    Б = 2;\nКонецПроцедуры\n";

    fn write_module(root: &Path, name: &str, contents: &[u8]) {
        let dir = root.join("CommonModules").join(name).join("Ext");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Module.bsl"), contents).unwrap();
    }

    fn config(root: &Path) -> GraphConfig {
        GraphConfig::default().with_root(root)
    }

    fn edge_labels(snapshot: &GraphSnapshot) -> Vec<(String, String)> {
        let nodes = snapshot.graph.nodes();
        let mut edges: Vec<(String, String)> = snapshot
            .graph
            .edges()
            .iter()
            .map(|e| (nodes[e.from].label.clone(), nodes[e.to].label.clone()))
            .collect();
        edges.sort();
        edges
    }

    #[test]
    fn test_build_graph_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "ModuleA", FOO.as_bytes());
        write_module(dir.path(), "ModuleB", BAR.as_bytes());

        let snapshot = build_graph(&config(dir.path()), &BslParser).unwrap();
        assert_eq!(snapshot.report.files_found, 2);
        assert_eq!(snapshot.report.modules_parsed, 2);
        assert_eq!(snapshot.graph.nodes().len(), 2);
        assert_eq!(
            edge_labels(&snapshot),
            vec![("ModuleA.Foo".to_string(), "ModuleB.Bar".to_string())]
        );

        let bar = snapshot.graph.find("ModuleB.Bar").unwrap();
        assert_eq!(snapshot.graph.node(bar.id).unwrap().value, 3);
        assert_eq!(snapshot.projection.nodes.len(), 2);
        assert_eq!(snapshot.projection.links.len(), 1);
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = crate::parser::UTF8_BOM.to_vec();
        contents.extend_from_slice(BAR.as_bytes());
        write_module(dir.path(), "ModuleB", &contents);

        let snapshot = build_graph(&config(dir.path()), &BslParser).unwrap();
        assert!(snapshot.report.skipped.is_empty());
        assert!(snapshot.graph.find("ModuleB.Bar").is_some());
    }

    #[test]
    fn test_unparsable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "Broken", "Процедура Сломана(\n".as_bytes());
        write_module(dir.path(), "ModuleB", BAR.as_bytes());

        let snapshot = build_graph(&config(dir.path()), &BslParser).unwrap();
        assert_eq!(snapshot.report.files_found, 2);
        assert_eq!(snapshot.report.modules_parsed, 1);
        assert_eq!(snapshot.report.skipped.len(), 1);
        assert!(snapshot.report.skipped[0].ends_with("CommonModules/Broken/Ext/Module.bsl"));
        assert_eq!(snapshot.graph.nodes().len(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "Binary", &[0xFF, 0xFE, 0x00, 0x81]);

        let snapshot = build_graph(&config(dir.path()), &BslParser).unwrap();
        assert_eq!(snapshot.report.skipped.len(), 1);
        assert!(snapshot.graph.nodes().is_empty());
    }

    #[test]
    fn test_other_extensions_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "ModuleB", BAR.as_bytes());
        fs::write(dir.path().join("readme.txt"), "not a module").unwrap();

        let snapshot = build_graph(&config(dir.path()), &BslParser).unwrap();
        assert_eq!(snapshot.report.files_found, 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "ModuleA", FOO.as_bytes());
        write_module(dir.path(), "ModuleB", BAR.as_bytes());

        let first = build_graph(&config(dir.path()), &BslParser).unwrap();
        let second = build_graph(&config(dir.path()), &BslParser).unwrap();

        let labels = |s: &GraphSnapshot| -> BTreeSet<String> {
            s.graph.nodes().iter().map(|n| n.label.clone()).collect()
        };
        assert_eq!(labels(&first), labels(&second));
        assert_eq!(edge_labels(&first), edge_labels(&second));
        assert_eq!(first.graph.data(), second.graph.data());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_graph(&config(&dir.path().join("absent")), &BslParser);
        assert!(matches!(result, Err(GraphError::Walk { .. })));
    }

    #[test]
    fn test_module_name_for() {
        let path = Path::new("CommonModules/ОбщегоНазначения/Ext/Module.bsl");
        assert_eq!(module_name_for(path, 2).as_deref(), Some("ОбщегоНазначения"));
        assert_eq!(module_name_for(path, 1).as_deref(), Some("Ext"));
        assert_eq!(module_name_for(path, 0).as_deref(), Some("Module"));
        assert_eq!(module_name_for(Path::new("Module.bsl"), 2), None);
    }

    #[test]
    fn test_short_path_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Утилиты.bsl"), BAR).unwrap();

        let snapshot = build_graph(&config(dir.path()), &BslParser).unwrap();
        assert!(snapshot.graph.find("Утилиты.Bar").is_some());
    }

    #[test]
    fn test_snapshot_from_registry() {
        let snapshot = GraphSnapshot::from_registry(FunctionRegistry::new());
        assert!(snapshot.graph.nodes().is_empty());
        assert!(snapshot.projection.nodes.is_empty());
        assert_eq!(snapshot.report.files_found, 0);
    }
}
