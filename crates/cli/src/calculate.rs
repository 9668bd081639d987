//! Resource quota calculation over manifest inputs

use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use quota_lib::{Aggregator, Documents, Folded};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::debug;

/// Options controlling a calculation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub detailed: bool,
    pub format: OutputFormat,
    pub keep_going: bool,
}

/// One manifest stream
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub content: String,
}

impl Source {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn stdin() -> Result<Self> {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("reading input")?;
        Ok(Self::new("<stdin>", content))
    }

    pub fn file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::new(path.display().to_string(), content))
    }
}

/// Calculate the quota needs of every workload in `sources` and write the
/// report to `out`.
///
/// Unsupported kinds are skipped. A decode error always aborts; a
/// calculation failure aborts unless `keep_going` is set, in which case it
/// is reported and the run fails after printing the totals.
pub fn run<W: Write>(options: &Options, sources: &[Source], out: &mut W) -> Result<()> {
    let mut aggregator = Aggregator::new(options.detailed);
    let mut failures = 0usize;

    for source in sources {
        for (index, document) in Documents::new(&source.content).enumerate() {
            let document_no = index + 1;
            let workload =
                document.with_context(|| format!("{}: decoding document {}", source.name, document_no))?;

            match aggregator.fold(workload.resource_usage()) {
                Ok(Folded::Counted) => {
                    debug!(
                        source = %source.name,
                        document = document_no,
                        version = workload.api_version(),
                        kind = workload.kind(),
                        "counted"
                    );
                }
                Ok(Folded::Skipped) => {}
                Err(err) if options.keep_going => {
                    failures += 1;
                    debug!(source = %source.name, document = document_no, error = %err, "skipping workload");
                    output::print_warning(&format!("{}: document {}: {}", source.name, document_no, err));
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!(
                            "{}: calculating {} resource usage (document {})",
                            source.name,
                            workload.kind(),
                            document_no
                        )
                    });
                }
            }
        }
    }

    let summary = aggregator.finish();
    output::render(&summary, options.format, out)?;

    if failures > 0 {
        bail!("{} workload(s) could not be calculated", failures);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENT: &str = r#"---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: values
spec:
  replicas: 10
  selector:
    matchLabels:
      app: values
  strategy:
    rollingUpdate:
      maxSurge: 2
      maxUnavailable: 0
    type: RollingUpdate
  template:
    spec:
      containers:
        - name: values
          image: myapp:v1.0.7
          resources:
            limits:
              cpu: '1'
              memory: 4Gi
"#;

    const SERVICE: &str = r#"---
apiVersion: v1
kind: Service
metadata:
  name: myservice
spec:
  ports:
  - port: 8080
"#;

    const UNKNOWN_STRATEGY: &str = r#"---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bluegreen
spec:
  replicas: 2
  selector:
    matchLabels:
      app: bluegreen
  strategy:
    type: BlueGreen
  template:
    spec:
      containers:
        - name: app
          image: app
"#;

    fn run_to_string(options: &Options, sources: &[Source]) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = run(options, sources, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_sums_across_sources() {
        let sources = [
            Source::new("a.yaml", DEPLOYMENT),
            Source::new("b.yaml", format!("{SERVICE}{DEPLOYMENT}")),
        ];
        let (result, output) = run_to_string(&Options::default(), &sources);

        result.unwrap();
        assert_eq!(output, "CPU: 24\nMemory: 96Gi\n");
    }

    #[test]
    fn test_empty_input_prints_zero_totals() {
        let (result, output) = run_to_string(&Options::default(), &[Source::new("<stdin>", "")]);
        result.unwrap();
        assert_eq!(output, "CPU: 0\nMemory: 0\n");
    }

    #[test]
    fn test_failure_aborts_by_default() {
        let sources = [Source::new("<stdin>", format!("{UNKNOWN_STRATEGY}{DEPLOYMENT}"))];
        let (result, output) = run_to_string(&Options::default(), &sources);

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("deployment strategy \"BlueGreen\" is unknown"));
        assert!(output.is_empty());
    }

    #[test]
    fn test_keep_going_reports_partial_totals() {
        let options = Options {
            keep_going: true,
            ..Default::default()
        };
        let sources = [Source::new("<stdin>", format!("{UNKNOWN_STRATEGY}{DEPLOYMENT}"))];
        let (result, output) = run_to_string(&options, &sources);

        assert!(result.is_err());
        assert_eq!(output, "CPU: 12\nMemory: 48Gi\n");
    }

    #[test]
    fn test_decode_error_aborts() {
        let sources = [Source::new("bad.yaml", "kind: [unclosed")];
        let (result, _) = run_to_string(&Options { keep_going: true, ..Default::default() }, &sources);

        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("bad.yaml: decoding document 1"), "{err}");
    }
}
