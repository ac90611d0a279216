use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{CflowgraphError, Result};

/// Options passed through to the cflow command line.
#[derive(Debug, Clone, Default)]
pub struct CflowOptions {
    /// Function cflow should treat as the graph root (`--main`)
    pub main: Option<String>,

    /// Maximum nesting depth cflow should emit (`--depth`)
    pub depth: Option<usize>,

    /// Generate the reverse (caller) graph (`--reverse`)
    pub reverse: bool,
}

/// Captured output of one cflow run.
#[derive(Debug, Clone)]
pub struct CflowOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Invokes GNU cflow over a set of source files and captures its
/// output. The tool is a black box: its stdout is the only artifact
/// consumed downstream.
pub struct CflowRunner {
    binary: String,
}

impl CflowRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Checks the cflow binary is callable at all.
    pub fn probe(&self) -> Result<()> {
        let probe = Command::new(&self.binary).arg("--version").output();
        match probe {
            Ok(output) if output.status.success() => Ok(()),
            _ => Err(CflowgraphError::Cflow(format!(
                "error detecting the {} application; is GNU cflow installed?",
                self.binary
            ))),
        }
    }

    /// Builds the argv for one run. `--print-level` is always passed:
    /// the output parser depends on the depth annotations it produces.
    fn build_args(&self, opts: &CflowOptions, paths: &[PathBuf]) -> Vec<String> {
        let mut args = vec!["--print-level".to_string()];
        if let Some(main) = &opts.main {
            args.push(format!("--main={}", main));
        }
        if let Some(depth) = opts.depth {
            args.push(format!("--depth={}", depth));
        }
        if opts.reverse {
            args.push("--reverse".to_string());
        }
        args.extend(paths.iter().map(|p| p.display().to_string()));
        args
    }

    /// Runs cflow synchronously. A non-zero exit status means the run
    /// produced no usable output and is an error; stderr content alone
    /// does not (cflow warns freely about unresolved calls).
    pub fn run(&self, opts: &CflowOptions, paths: &[PathBuf]) -> Result<CflowOutput> {
        self.probe()?;

        let args = self.build_args(opts, paths);
        info!("cli: '{} {}'", self.binary, args.join(" "));
        debug!("appending {} paths to the command", paths.len());

        let output = Command::new(&self.binary).args(&args).output()?;
        if !output.status.success() {
            return Err(CflowgraphError::Cflow(format!(
                "cflow returned code {:?}",
                output.status.code()
            )));
        }

        Ok(CflowOutput {
            stdout: capture_lines(&output.stdout),
            stderr: capture_lines(&output.stderr),
        })
    }
}

fn capture_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_minimal() {
        let runner = CflowRunner::new("cflow");
        let args = runner.build_args(&CflowOptions::default(), &[PathBuf::from("a.c")]);
        assert_eq!(args, vec!["--print-level", "a.c"]);
    }

    #[test]
    fn test_build_args_full() {
        let runner = CflowRunner::new("cflow");
        let opts = CflowOptions {
            main: Some("main".to_string()),
            depth: Some(5),
            reverse: true,
        };
        let args = runner.build_args(&opts, &[PathBuf::from("a.c"), PathBuf::from("b.h")]);

        assert_eq!(
            args,
            vec![
                "--print-level",
                "--main=main",
                "--depth=5",
                "--reverse",
                "a.c",
                "b.h",
            ]
        );
    }

    #[test]
    fn test_probe_reports_missing_binary() {
        let runner = CflowRunner::new("definitely-not-a-real-cflow");
        let err = runner.probe().unwrap_err();
        assert!(matches!(err, CflowgraphError::Cflow(_)));
    }
}
