// src/core/engine.rs
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::CflowgraphError;
use super::{
    CflowOptions, CflowParser, CflowRunner, DotRenderer, DotStyle, SourceScanner, TreeRenderer,
};

/// Where the source file list for a run comes from: a fresh walk or a
/// previously persisted list.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    pub root: Option<PathBuf>,
    pub excludes: Vec<String>,
    pub no_builtin_excludes: bool,
    pub usefile: Option<PathBuf>,
}

/// One graph request: which function, which cflow options, which output
/// formats.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Function to graph; None graphs everything cflow emits
    pub main: Option<String>,

    /// cflow --depth override
    pub depth: Option<usize>,

    /// Build the reverse (caller) graph
    pub reverse: bool,

    /// Output formats: any of "tree", "dot", "raw"
    pub formats: Vec<String>,

    /// Output file for dot rendering (extension picks the image format)
    pub dotfile: Option<String>,

    /// Include signatures in the tree view
    pub show_signatures: bool,

    /// Echo cflow's stderr after the run
    pub show_stderr: bool,
}

const KNOWN_FORMATS: &[&str] = &["tree", "dot", "raw"];
const DOT_FORMATS: &[&str] = &["png", "svg", "pdf"];

/// Main orchestration engine: discovery, cflow invocation, parsing,
/// rendering.
pub struct Engine {
    config: Config,
    runner: CflowRunner,
    parser: CflowParser,
}

impl Engine {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        let runner = CflowRunner::new(config.cflow.binary.clone());
        let parser = CflowParser::new()?;

        Ok(Self {
            config,
            runner,
            parser,
        })
    }

    /// Walks the configured root for sources and persists the list for
    /// later runs.
    pub fn discover(&self, source: &FileSource) -> Result<Vec<PathBuf>> {
        let root = source
            .root
            .clone()
            .or_else(|| self.config.discovery.root.clone())
            .ok_or_else(|| {
                CflowgraphError::Config("no root path given; use --rootpath".to_string())
            })?;

        let mut excludes = self.config.discovery.exclude_paths.clone();
        excludes.extend(source.excludes.iter().cloned());

        let scanner = SourceScanner::new(excludes, !source.no_builtin_excludes);
        let paths = scanner.scan(&root)?;
        if paths.is_empty() {
            info!("No files found.");
            return Ok(paths);
        }

        let paths_file = &self.config.discovery.paths_file;
        SourceScanner::write_paths_file(&paths, paths_file)?;
        info!(
            "Wrote {} paths to {}",
            paths.len(),
            paths_file.display()
        );
        Ok(paths)
    }

    fn resolve_paths(&self, source: &FileSource) -> Result<Vec<PathBuf>> {
        if let Some(usefile) = &source.usefile {
            let paths = SourceScanner::read_paths_file(usefile)?;
            info!("Read {} paths from {}", paths.len(), usefile.display());
            return Ok(paths);
        }
        if source.root.is_some() || self.config.discovery.root.is_some() {
            return self.discover(source);
        }
        Err(CflowgraphError::Config(
            "no source files to analyze; provide --rootpath or --usefile".to_string(),
        )
        .into())
    }

    /// Generates the call graph for one request.
    pub fn run(&self, source: &FileSource, request: &RunRequest) -> Result<()> {
        for format in &request.formats {
            if !KNOWN_FORMATS.contains(&format.as_str()) {
                warn!("unknown output format '{}', ignoring", format);
            }
        }

        let paths = self.resolve_paths(source)?;
        if paths.is_empty() {
            return Ok(());
        }

        let opts = CflowOptions {
            main: request.main.clone(),
            depth: request.depth.or(self.config.cflow.depth),
            reverse: request.reverse,
        };
        let output = self.runner.run(&opts, &paths)?;

        if output.stdout.len() < 2 {
            info!("No results from cflow.");
            println!("No results.");
            return Ok(());
        }

        if self.wants(request, "raw") {
            for line in &output.stdout {
                println!("{}", line);
            }
        }
        if request.show_stderr {
            info!("cflow stderr ({} lines):", output.stderr.len());
            for line in &output.stderr {
                eprintln!("{}", line);
            }
        }

        // cflow reports functions with their call parentheses attached.
        let target = request.main.as_ref().map(|main| format!("{}()", main));
        let Some(tree) = self.parser.parse(&output.stdout, target.as_deref())? else {
            println!("No results.");
            return Ok(());
        };

        if self.wants(request, "tree") {
            info!("Generating tree view.");
            let renderer = TreeRenderer::new(
                request.show_signatures || self.config.render.show_signatures,
                self.config.render.path_parts,
            );
            print!("{}", renderer.render(&tree));
        }

        if self.wants(request, "dot") {
            info!("Generating dot graph.");
            let (stem, image_format) = self.dot_output(request)?;
            let style = DotStyle {
                rankdir: self.config.render.rankdir.clone(),
                node_shape: self.config.render.node_shape.clone(),
                arrowhead: self.config.render.arrowhead.clone(),
            };
            DotRenderer::new(style).write(&tree, &stem, &image_format)?;
        }

        Ok(())
    }

    fn wants(&self, request: &RunRequest, format: &str) -> bool {
        request.formats.iter().any(|f| f == format)
    }

    /// Splits the requested dot output file into a stem and an image
    /// format, validating the extension.
    fn dot_output(&self, request: &RunRequest) -> Result<(PathBuf, String)> {
        let dotfile = request
            .dotfile
            .clone()
            .unwrap_or_else(|| self.config.render.dotfile.clone());
        let path = Path::new(&dotfile);

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if !DOT_FORMATS.contains(&extension) {
            return Err(CflowgraphError::Config(format!(
                "invalid dot output '{}': valid extensions are .png, .svg, .pdf",
                dotfile
            ))
            .into());
        }

        Ok((path.with_extension(""), extension.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(Some(Path::new("/no/such/config.toml"))).unwrap()
    }

    fn request(formats: &[&str], dotfile: Option<&str>) -> RunRequest {
        RunRequest {
            main: None,
            depth: None,
            reverse: false,
            formats: formats.iter().map(|f| f.to_string()).collect(),
            dotfile: dotfile.map(str::to_string),
            show_signatures: false,
            show_stderr: false,
        }
    }

    #[test]
    fn test_dot_output_defaults_to_config() {
        let (stem, format) = engine().dot_output(&request(&["dot"], None)).unwrap();
        assert_eq!(stem, PathBuf::from("dot"));
        assert_eq!(format, "svg");
    }

    #[test]
    fn test_dot_output_rejects_unknown_extension() {
        let result = engine().dot_output(&request(&["dot"], Some("graph.gif")));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_paths_requires_a_source() {
        let result = engine().resolve_paths(&FileSource::default());
        assert!(result.is_err());
    }
}
