use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::trace;
use regex::Regex;

pub type NodeId = u32;

/// Per-node scalars the aggregator knows how to interpret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeMetric {
    InMis,
    TotalMessagesSent,
    TotalMessagesReceived,
    TotalMessageOverhead,
    ConvergenceTime,
    Phase,
    InitialNeighborCount,
}

impl NodeMetric {
    /// Scalar name as recorded by the simulation modules
    pub fn name(self) -> &'static str {
        match self {
            NodeMetric::InMis => "inMIS",
            NodeMetric::TotalMessagesSent => "totalMessagesSent",
            NodeMetric::TotalMessagesReceived => "totalMessagesReceived",
            NodeMetric::TotalMessageOverhead => "totalMessageOverhead",
            NodeMetric::ConvergenceTime => "convergenceTime",
            NodeMetric::Phase => "phase",
            NodeMetric::InitialNeighborCount => "initialNeighborCount",
        }
    }
}

/// Sparse scalar values recorded for one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeMetrics {
    values: HashMap<String, f64>,
}

impl NodeMetrics {
    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, metric: NodeMetric) -> Option<f64> {
        self.values.get(metric.name()).copied()
    }

    pub fn get_or_zero(&self, metric: NodeMetric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything extracted from one `.sca` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedRun {
    pub config: String,
    pub run: i64,
    pub nodes: BTreeMap<NodeId, NodeMetrics>,
}

/// A result-file line classified by its leading tokens.
#[derive(Debug, PartialEq)]
pub enum ScaLine<'a> {
    ConfigName(&'a str),
    Run(&'a str),
    Scalar {
        module: &'a str,
        metric: &'a str,
        value: Option<&'a str>,
    },
    Other,
}

impl<'a> ScaLine<'a> {
    pub fn tokenize(line: &'a str) -> Self {
        let tokens: Vec<&'a str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["attr", "configname", rest @ ..] => {
                ScaLine::ConfigName(rest.last().copied().unwrap_or("configname"))
            }
            ["run", id, ..] => ScaLine::Run(*id),
            ["scalar", module, metric, rest @ ..] => ScaLine::Scalar {
                module: *module,
                metric: *metric,
                value: rest.first().copied(),
            },
            _ => ScaLine::Other,
        }
    }
}

/// Holds the compiled patterns so a batch of files shares them.
pub struct ScaParser {
    node_re: Regex,
    run_re: Regex,
}

impl ScaParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            node_re: Regex::new(r"node\[(\d+)\]")?,
            // run names look like "<config>-<run>-<yyyymmdd>-..."
            run_re: Regex::new(r"-(\d+)-\d{8}")?,
        })
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedRun> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read result file {}", path.display()))?;
        self.parse_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse_str(&self, text: &str) -> Result<ParsedRun> {
        let mut parsed = ParsedRun::default();

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            match ScaLine::tokenize(line) {
                ScaLine::ConfigName(name) => parsed.config = name.to_string(),
                ScaLine::Run(id) => {
                    parsed.run = self
                        .run_index(id)
                        .with_context(|| format!("line {lineno}: bad run identifier {id:?}"))?;
                }
                ScaLine::Scalar { module, metric, value } => {
                    let node = self
                        .node_id(module)
                        .with_context(|| format!("line {lineno}: bad node index in {module:?}"))?;
                    let Some(node) = node else {
                        trace!("line {lineno}: {module} is not a node, skipped");
                        continue;
                    };
                    let value = match value {
                        Some(token) => token.parse::<f64>().with_context(|| {
                            format!("line {lineno}: malformed value {token:?} for {metric}")
                        })?,
                        None => 0.0,
                    };
                    parsed.nodes.entry(node).or_default().insert(metric, value);
                }
                ScaLine::Other => {}
            }
        }
        Ok(parsed)
    }

    /// Integer tokens are used as-is; composite run names fall back to the pattern, then 0.
    pub fn run_index(&self, token: &str) -> Result<i64> {
        if let Ok(run) = token.parse::<i64>() {
            return Ok(run);
        }
        match self.run_re.captures(token) {
            Some(caps) => Ok(caps[1].parse::<i64>()?),
            None => Ok(0),
        }
    }

    pub fn node_id(&self, module: &str) -> Result<Option<NodeId>> {
        match self.node_re.captures(module) {
            Some(caps) => Ok(Some(caps[1].parse::<NodeId>()?)),
            None => Ok(None),
        }
    }
}

pub fn parse_sca_file(path: &Path) -> Result<ParsedRun> {
    ScaParser::new()?.parse_file(path)
}

pub fn parse_sca_str(text: &str) -> Result<ParsedRun> {
    ScaParser::new()?.parse_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID4: &str = "\
version 2
run 0
attr configname Grid4
scalar FastMISNetwork.node[0] inMIS 1
scalar FastMISNetwork.node[0] initialNeighborCount 3
scalar FastMISNetwork.node[1] inMIS 0
";

    #[test]
    fn parses_scenario_file() {
        let run = parse_sca_str(GRID4).unwrap();
        assert_eq!(run.config, "Grid4");
        assert_eq!(run.run, 0);
        assert_eq!(run.nodes.len(), 2);
        assert_eq!(run.nodes[&0].get(NodeMetric::InMis), Some(1.0));
        assert_eq!(run.nodes[&0].get(NodeMetric::InitialNeighborCount), Some(3.0));
        assert_eq!(run.nodes[&1].get(NodeMetric::InitialNeighborCount), None);
    }

    #[test]
    fn tokenizes_line_shapes() {
        assert_eq!(
            ScaLine::tokenize("attr configname General FastMIS-Grid"),
            ScaLine::ConfigName("FastMIS-Grid")
        );
        assert_eq!(ScaLine::tokenize("run 7"), ScaLine::Run("7"));
        assert_eq!(
            ScaLine::tokenize("scalar Net.node[2] phase"),
            ScaLine::Scalar { module: "Net.node[2]", metric: "phase", value: None }
        );
        assert_eq!(ScaLine::tokenize("scalar Net.node[2]"), ScaLine::Other);
        assert_eq!(ScaLine::tokenize("attr network FastMISNetwork"), ScaLine::Other);
        assert_eq!(ScaLine::tokenize("runattr foo bar"), ScaLine::Other);
        assert_eq!(ScaLine::tokenize("attr configname"), ScaLine::ConfigName("configname"));
        assert_eq!(ScaLine::tokenize(""), ScaLine::Other);
    }

    #[test]
    fn extracts_run_index_from_composite_name() {
        let parser = ScaParser::new().unwrap();
        assert_eq!(parser.run_index("FastMIS-Grid-Small-4-20240101").unwrap(), 4);
        assert_eq!(parser.run_index("SlowMIS-12-20231231-10:15:00-4711").unwrap(), 12);
        assert_eq!(parser.run_index("42").unwrap(), 42);
        assert_eq!(parser.run_index("General-no-date").unwrap(), 0);
    }

    #[test]
    fn skips_modules_without_node_segment_and_defaults_value() {
        let text = "\
scalar FastMISNetwork.channel inMIS 1
scalar FastMISNetwork.node[3] convergenceTime
";
        let run = parse_sca_str(text).unwrap();
        assert_eq!(run.nodes.len(), 1);
        assert_eq!(run.nodes[&3].get(NodeMetric::ConvergenceTime), Some(0.0));
        assert_eq!(run.config, "");
    }

    #[test]
    fn later_values_overwrite_earlier_ones() {
        let text = "\
scalar Net.node[0] phase 2
run 1
scalar Net.node[0] phase 5
run 3
";
        let run = parse_sca_str(text).unwrap();
        assert_eq!(run.run, 3);
        assert_eq!(run.nodes[&0].get(NodeMetric::Phase), Some(5.0));
        assert_eq!(run.nodes[&0].len(), 1);
    }

    #[test]
    fn malformed_value_is_an_error_with_line_number() {
        let text = "run 0\nscalar Net.node[0] inMIS yes\n";
        let err = parse_sca_str(text).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FastMIS-Grid4-0.sca");
        fs::write(&path, GRID4).unwrap();
        let run = parse_sca_file(&path).unwrap();
        assert_eq!(run.nodes.len(), 2);

        let missing = parse_sca_file(&dir.path().join("absent.sca"));
        assert!(missing.is_err());
    }
}
