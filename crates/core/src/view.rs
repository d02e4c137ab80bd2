//! Display-ready projections of viewer state.
//!
//! Nothing here owns state. Each function takes store data plus the sanitiser and produces
//! plain values that a renderer (the CLI, a web front end) can draw directly.

use crate::highlight::{Highlighter, Segment};
use crate::sanitize::{sanitize_url, Sanitize};
use crate::store::Variables;
use crate::template::{self, Run};
use wiki_types::{ContentBlock, Node, NodeId, SearchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBlock {
    Text(Vec<Run>),
    Image { url: String },
}

/// The detail pane for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub id: NodeId,
    pub title: String,
    pub blocks: Vec<RenderedBlock>,
    /// False while the node is only known in summary form.
    pub hydrated: bool,
}

impl DetailView {
    /// All variable runs in display order.
    pub fn variable_values(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                RenderedBlock::Text(runs) => Some(runs),
                RenderedBlock::Image { .. } => None,
            })
            .flatten()
            .filter(|run| run.is_variable())
            .map(Run::text)
            .collect()
    }

    /// Concatenated text of every text block, one line per block.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                RenderedBlock::Text(runs) => Some(runs.iter().map(Run::text).collect::<String>()),
                RenderedBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Renders content blocks.
///
/// Text is sanitised first; a block whose sanitised body is empty renders as nothing. Image
/// URLs with a script-capable scheme are neutralised. Unknown blocks are skipped.
pub fn render_blocks(
    blocks: &[ContentBlock],
    variables: &Variables,
    sanitizer: &dyn Sanitize,
) -> Vec<RenderedBlock> {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { body } => {
                let clean = sanitizer.sanitize(body);
                if clean.is_empty() {
                    return None;
                }
                Some(RenderedBlock::Text(template::render(&clean, variables)))
            }
            ContentBlock::Image { url } => Some(RenderedBlock::Image {
                url: sanitize_url(url),
            }),
            ContentBlock::Unknown => None,
        })
        .collect()
}

pub fn detail_view(node: &Node, variables: &Variables, sanitizer: &dyn Sanitize) -> DetailView {
    DetailView {
        id: node.id,
        title: node.title.clone(),
        blocks: render_blocks(node.content(), variables, sanitizer),
        hydrated: node.is_hydrated(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedRun {
    pub variable: bool,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightedBlock {
    Text(Vec<HighlightedRun>),
    Image { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: NodeId,
    pub title: Vec<Segment>,
    pub blocks: Vec<HighlightedBlock>,
}

/// The search results panel. An empty `hits` list means nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPanel {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

impl SearchPanel {
    /// Every marked fragment across titles and bodies, in display order.
    pub fn marks(&self) -> Vec<&str> {
        fn marked(segments: &[Segment]) -> impl Iterator<Item = &str> {
            segments.iter().filter_map(|s| match s {
                Segment::Mark(text) => Some(text.as_str()),
                Segment::Plain(_) => None,
            })
        }

        let mut out = Vec::new();
        for hit in &self.hits {
            out.extend(marked(&hit.title));
            for block in &hit.blocks {
                if let HighlightedBlock::Text(runs) = block {
                    for run in runs {
                        out.extend(marked(&run.segments));
                    }
                }
            }
        }
        out
    }
}

/// Renders a search result with every query token highlighted.
pub fn search_panel(
    result: &SearchResult,
    variables: &Variables,
    sanitizer: &dyn Sanitize,
) -> SearchPanel {
    let highlighter = Highlighter::new(&result.query);

    let hits = result
        .results
        .iter()
        .map(|node| SearchHit {
            id: node.id,
            title: highlighter.apply(&node.title),
            blocks: render_blocks(node.content(), variables, sanitizer)
                .into_iter()
                .map(|block| match block {
                    RenderedBlock::Text(runs) => HighlightedBlock::Text(
                        runs.iter()
                            .map(|run| HighlightedRun {
                                variable: run.is_variable(),
                                segments: highlighter.apply(run.text()),
                            })
                            .collect(),
                    ),
                    RenderedBlock::Image { url } => HighlightedBlock::Image { url },
                })
                .collect(),
        })
        .collect();

    SearchPanel {
        query: result.query.clone(),
        hits,
    }
}

/// What the main pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainPane {
    Search(SearchPanel),
    Details(DetailView),
    /// Results for the current input are being fetched.
    Waiting,
    /// Nothing selected or searched yet.
    Prompt,
}
