use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::{Engine, FileSource, RunRequest};

#[derive(Parser)]
#[command(name = "cflowgraph")]
#[command(about = "C function call graph generator (using GNU cflow)")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root path to search for source files
    #[arg(long)]
    pub rootpath: Option<PathBuf>,

    /// Excluded path substring (can be repeated)
    #[arg(long = "excludepath")]
    pub exclude_paths: Vec<String>,

    /// Don't use any built-in exclude paths
    #[arg(long)]
    pub nobuiltin_excludes: bool,

    /// Path to a file containing source paths, one per line
    #[arg(long)]
    pub usefile: Option<PathBuf>,

    /// Reuse the last written c.files list
    #[arg(long)]
    pub uselastfile: bool,

    /// Logging level [debug, info, warning, error]
    #[arg(long, default_value = "info")]
    pub loglevel: String,

    /// Shortcut for --loglevel=debug
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generates the call graph for a function
    Run {
        /// Function target to graph
        #[arg(long)]
        main: Option<String>,

        /// Call graph depth
        #[arg(long)]
        depth: Option<usize>,

        /// Generate reverse graph
        #[arg(long)]
        reverse: bool,

        /// Format of output: tree, dot, raw (can be repeated)
        #[arg(long = "format", default_value = "tree")]
        formats: Vec<String>,

        /// File name for dot output; valid extensions are .png, .svg, .pdf
        #[arg(long)]
        dotfile: Option<String>,

        /// Shows function signatures
        #[arg(long)]
        show_signatures: bool,

        /// Print cflow stderr output
        #[arg(long)]
        stderr: bool,

        /// Extra debug verbosity
        #[arg(short, long)]
        verbose: bool,
    },
}

impl Cli {
    /// Logging level derived from --loglevel, --debug and run
    /// verbosity.
    pub fn log_directive(&self) -> &'static str {
        let verbose = matches!(&self.command, Some(Commands::Run { verbose: true, .. }));
        if self.debug || verbose {
            return "debug";
        }
        match self.loglevel.as_str() {
            "debug" => "debug",
            "warning" | "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    }

    fn file_source(&self) -> FileSource {
        let usefile = if self.uselastfile {
            Some(PathBuf::from("c.files"))
        } else {
            self.usefile.clone()
        };
        FileSource {
            root: self.rootpath.clone(),
            excludes: self.exclude_paths.clone(),
            no_builtin_excludes: self.nobuiltin_excludes,
            usefile,
        }
    }

    pub fn execute(self, engine: Engine) -> Result<()> {
        let source = self.file_source();

        match self.command {
            Some(Commands::Run {
                main,
                depth,
                reverse,
                formats,
                dotfile,
                show_signatures,
                stderr,
                verbose: _,
            }) => {
                let request = RunRequest {
                    main,
                    depth,
                    reverse,
                    formats,
                    dotfile,
                    show_signatures,
                    show_stderr: stderr,
                };
                engine.run(&source, &request)
            }
            None => {
                // Bare invocation with a root path still scans and
                // persists the file list; otherwise show usage.
                if source.root.is_some() || source.usefile.is_some() {
                    engine.discover(&source).map(|_| ())
                } else {
                    Cli::command().print_help()?;
                    Ok(())
                }
            }
        }
    }
}
