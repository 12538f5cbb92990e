//! Subcommand handlers
//!
//! Each handler returns the text to print so it can be tested without a
//! process boundary.

use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uiprobe::{
    parse_tree_bytes, Element, ElementPredicate, Matcher, Point, ProbeConfig, Rect, Tree, WindowKind,
};

use crate::commands::{FindArgs, SnapshotArgs};
use crate::error::{CliError, CliResult};
use crate::outline::{element_line, render_outline, OutlineOptions};

/// Read and parse the snapshot named by `args`
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not a valid UI tree
pub fn load_snapshot(args: &SnapshotArgs) -> CliResult<Tree> {
    let (name, bytes) = if args.is_stdin() {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        (PathBuf::from("<stdin>"), bytes)
    } else {
        (args.file.clone(), std::fs::read(&args.file)?)
    };
    debug!(source = %name.display(), bytes = bytes.len(), "read snapshot");
    parse_snapshot(&name, &bytes)
}

/// Parse snapshot bytes, attributing failures to `name`
///
/// # Errors
///
/// Returns [`CliError::Snapshot`] with the parse position on failure
pub fn parse_snapshot(name: &Path, bytes: &[u8]) -> CliResult<Tree> {
    let tree = parse_tree_bytes(bytes).map_err(|e| CliError::snapshot(name, e))?;
    info!(
        os = %tree.os,
        windows = tree.windows.len(),
        elements = tree.element_count(),
        "parsed snapshot"
    );
    Ok(tree)
}

// =============================================================================
// validate / outline
// =============================================================================

/// Summary line for a valid snapshot
#[must_use]
pub fn validate(tree: &Tree) -> String {
    let windows: Vec<&str> = tree.windows.iter().map(|w| w.kind.as_str()).collect();
    format!(
        "OK: {} snapshot, {} windows [{}], {} elements\n",
        tree.os,
        tree.windows.len(),
        windows.join(", "),
        tree.element_count()
    )
}

/// Indented hierarchy of a snapshot
#[must_use]
pub fn outline(tree: &Tree, max_depth: Option<usize>, color: bool) -> String {
    render_outline(tree, OutlineOptions { max_depth, color })
}

// =============================================================================
// find
// =============================================================================

/// One element accepted by the find criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    /// Position among all matches, in enumeration order
    pub position: usize,
    /// Window holding the element
    pub window: WindowKind,
    /// Element type
    #[serde(rename = "type")]
    pub element_type: String,
    /// Resource id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Text label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Accessibility identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility_id: Option<String>,
    /// Clickable flag
    pub clickable: bool,
    /// Bounding box
    pub bounds: Rect,
    /// Tap point
    pub center: Point,
}

/// Combine the criteria given on the command line into one matcher
///
/// # Errors
///
/// Returns an error if no criterion is given or the regex is invalid
pub fn build_matcher(args: &FindArgs) -> CliResult<Matcher> {
    let mut matchers = Vec::new();
    if let Some(text) = &args.text {
        matchers.push(Matcher::Text(text.clone()));
    }
    if let Some(pattern) = &args.text_matches {
        matchers.push(Matcher::text_matches(pattern)?);
    }
    if let Some(id) = &args.id {
        matchers.push(Matcher::Id(id.clone()));
    }
    if let Some(element_type) = &args.element_type {
        matchers.push(Matcher::Type(element_type.clone()));
    }
    if let Some(a11y) = &args.accessibility_id {
        matchers.push(Matcher::AccessibilityId(a11y.clone()));
    }
    if let Some(clickable) = args.clickable {
        matchers.push(Matcher::Clickable(clickable));
    }

    match matchers.len() {
        0 => Err(CliError::invalid_argument(
            "find needs at least one of --text, --text-matches, --id, --type, --accessibility-id, --clickable",
        )),
        1 => Ok(matchers.remove(0)),
        _ => Ok(Matcher::AllOf(matchers)),
    }
}

/// Every element accepted by `matcher` with its window, in enumeration order
fn matching_elements<'a>(tree: &'a Tree, matcher: &Matcher) -> Vec<(WindowKind, &'a Element)> {
    tree.windows
        .iter()
        .flat_map(|window| {
            window
                .root
                .descendants()
                .filter(|element| matcher.matches(element))
                .map(move |element| (window.kind, element))
        })
        .collect()
}

fn summarize(position: usize, window: WindowKind, element: &Element) -> MatchSummary {
    MatchSummary {
        position,
        window,
        element_type: element.element_type.clone(),
        id: element.id.clone(),
        text: element.text.clone(),
        accessibility_id: element.accessibility_id.clone(),
        clickable: element.clickable,
        bounds: element.bounds,
        center: element.bounds.center(),
    }
}

/// Summaries of every element accepted by `matcher`
#[must_use]
pub fn collect_matches(tree: &Tree, matcher: &Matcher) -> Vec<MatchSummary> {
    matching_elements(tree, matcher)
        .into_iter()
        .enumerate()
        .map(|(position, (window, element))| summarize(position, window, element))
        .collect()
}

/// Run a find over `tree`
///
/// # Errors
///
/// Returns [`CliError::NoMatch`] when nothing matches, or a criteria error
pub fn find(tree: &Tree, args: &FindArgs) -> CliResult<String> {
    let matcher = build_matcher(args)?;
    let matches = matching_elements(tree, &matcher);
    debug!(criteria = %matcher.describe(), count = matches.len(), "find");
    if matches.is_empty() {
        return Err(CliError::NoMatch {
            criteria: matcher.describe(),
        });
    }

    if args.json {
        let summaries: Vec<MatchSummary> = matches
            .iter()
            .enumerate()
            .map(|(position, (window, element))| summarize(position, *window, element))
            .collect();
        let mut json = serde_json::to_string_pretty(&summaries)?;
        json.push('\n');
        return Ok(json);
    }

    let mut output = String::new();
    for (position, (window, element)) in matches.iter().enumerate() {
        let center = element.bounds.center();
        output.push_str(&format!(
            "#{position} {window} {} center={},{}\n",
            element_line(element, false),
            center.x,
            center.y
        ));
    }
    Ok(output)
}

// =============================================================================
// config
// =============================================================================

/// Effective configuration as YAML
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized
pub fn show_config(config: &ProbeConfig) -> CliResult<String> {
    serde_yaml_ng::to_string(config).map_err(|e| CliError::config(e.to_string()))
}
