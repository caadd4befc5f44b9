// Test discovery - suite trees from a listing command, flattened to test paths

use crate::model::TestPath;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Hook declared on a suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInfo {
    #[serde(default)]
    pub name: String,
}

/// Node of a file's suite tree as reported by the listing command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SuiteNode {
    Suite {
        #[serde(default)]
        name: String,
        #[serde(default)]
        contents: Vec<SuiteNode>,
        #[serde(default)]
        skipped: bool,
        #[serde(default)]
        only: bool,
        #[serde(default)]
        before: Vec<HookInfo>,
        #[serde(default)]
        after: Vec<HookInfo>,
    },
    Test {
        name: String,
        #[serde(default)]
        skipped: bool,
        #[serde(default)]
        only: bool,
    },
}

/// A test to run, as discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpec {
    pub path: TestPath,
    pub skipped: bool,
}

/// Flattens the tree of one file into its tests, in declaration order.
///
/// The root node's own name is not part of any path. `skipped` is inherited
/// by everything under a skipped suite. If anything in the file is marked
/// `only`, tests that are neither marked nor inside a marked suite are
/// dropped.
pub fn flatten_suite(file: &str, root: &SuiteNode) -> Vec<TestSpec> {
    struct Found {
        spec: TestSpec,
        only: bool,
    }

    let mut found = Vec::new();
    // (node, suite names so far, inherited skipped, inherited only)
    let mut stack: Vec<(&SuiteNode, Vec<String>, bool, bool)> =
        vec![(root, Vec::new(), false, false)];
    let mut is_root = true;

    while let Some((node, prefix, parent_skipped, parent_only)) = stack.pop() {
        match node {
            SuiteNode::Suite {
                name,
                contents,
                skipped,
                only,
                ..
            } => {
                let mut path = prefix;
                if !is_root {
                    path.push(name.clone());
                }
                is_root = false;
                // Reverse so children pop in declaration order
                for child in contents.iter().rev() {
                    stack.push((
                        child,
                        path.clone(),
                        parent_skipped || *skipped,
                        parent_only || *only,
                    ));
                }
            }
            SuiteNode::Test {
                name,
                skipped,
                only,
            } => {
                is_root = false;
                let mut path = prefix;
                path.push(name.clone());
                found.push(Found {
                    spec: TestSpec {
                        path: TestPath::new(file, path),
                        skipped: parent_skipped || *skipped,
                    },
                    only: parent_only || *only,
                });
            }
        }
    }

    let any_only = found.iter().any(|f| f.only);
    found
        .into_iter()
        .filter(|f| !any_only || f.only)
        .map(|f| f.spec)
        .collect()
}

/// Supplies the suite tree of a test file.
pub trait TestDiscovery: Send + Sync {
    fn list_tests(&self, file: &Path) -> impl Future<Output = Result<SuiteNode>> + Send;
}

/// Substitutes `{file}` (and `{test}` when given) in a command template.
pub(crate) fn expand_template(
    template: &[String],
    file: &Path,
    test: Option<&str>,
) -> Result<(String, Vec<String>)> {
    let file = file.to_string_lossy();
    let mut argv = template.iter().map(|arg| {
        let arg = arg.replace("{file}", &file);
        match test {
            Some(test) => arg.replace("{test}", test),
            None => arg,
        }
    });
    let program = argv.next().context("Command template is empty")?;
    Ok((program, argv.collect()))
}

/// Runs a listing command per file and parses the suite tree it prints as JSON.
pub struct CommandDiscovery {
    command: Vec<String>,
}

impl CommandDiscovery {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl TestDiscovery for CommandDiscovery {
    async fn list_tests(&self, file: &Path) -> Result<SuiteNode> {
        let (program, args) = expand_template(&self.command, file, None)?;
        debug!("Listing tests in {} with {}", file.display(), program);

        let output = Command::new(&program)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("Failed to run list command '{}'", program))?;

        if !output.status.success() {
            anyhow::bail!(
                "List command failed for {} ({}): {}",
                file.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Invalid suite tree for {}", file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(specs: &[TestSpec]) -> Vec<Vec<String>> {
        specs.iter().map(|s| s.path.path.clone()).collect()
    }

    fn tree(value: serde_json::Value) -> SuiteNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flatten_in_declaration_order() {
        let root = tree(json!({
            "type": "suite",
            "contents": [
                {"type": "test", "name": "top"},
                {"type": "suite", "name": "outer", "contents": [
                    {"type": "test", "name": "a"},
                    {"type": "suite", "name": "inner", "contents": [
                        {"type": "test", "name": "b"}
                    ]},
                    {"type": "test", "name": "c"}
                ]}
            ]
        }));

        let specs = flatten_suite("f.js", &root);
        assert_eq!(
            names(&specs),
            vec![
                vec!["top".to_string()],
                vec!["outer".to_string(), "a".to_string()],
                vec!["outer".to_string(), "inner".to_string(), "b".to_string()],
                vec!["outer".to_string(), "c".to_string()],
            ]
        );
        assert!(specs.iter().all(|s| s.path.file == "f.js" && !s.skipped));
    }

    #[test]
    fn test_skipped_suite_skips_descendants() {
        let root = tree(json!({
            "type": "suite",
            "contents": [
                {"type": "suite", "name": "off", "skipped": true, "contents": [
                    {"type": "test", "name": "a"}
                ]},
                {"type": "test", "name": "b", "skipped": true},
                {"type": "test", "name": "c"}
            ]
        }));

        let skipped: Vec<bool> = flatten_suite("f", &root).iter().map(|s| s.skipped).collect();
        assert_eq!(skipped, vec![true, true, false]);
    }

    #[test]
    fn test_only_restricts_file() {
        let root = tree(json!({
            "type": "suite",
            "contents": [
                {"type": "test", "name": "dropped"},
                {"type": "test", "name": "kept", "only": true},
                {"type": "suite", "name": "focus", "only": true, "contents": [
                    {"type": "test", "name": "nested"}
                ]}
            ]
        }));

        assert_eq!(
            names(&flatten_suite("f", &root)),
            vec![
                vec!["kept".to_string()],
                vec!["focus".to_string(), "nested".to_string()],
            ]
        );
    }

    #[test]
    fn test_hooks_parse_but_do_not_produce_tests() {
        let root = tree(json!({
            "type": "suite",
            "before": [{"name": "setup"}],
            "after": [{"name": "teardown"}],
            "contents": []
        }));
        assert!(flatten_suite("f", &root).is_empty());
    }

    #[test]
    fn test_expand_template() {
        let template = vec![
            "node".to_string(),
            "runner.js".to_string(),
            "{file}".to_string(),
            "--test={test}".to_string(),
        ];
        let (program, args) =
            expand_template(&template, Path::new("spec/a.js"), Some("[\"t\"]")).unwrap();
        assert_eq!(program, "node");
        assert_eq!(args, vec!["runner.js", "spec/a.js", "--test=[\"t\"]"]);

        assert!(expand_template(&[], Path::new("a"), None).is_err());
    }
}
