//! Prompt assembly
//!
//! Thin templates over [`ProjectData`] and resolved file content. Kept
//! deliberately small; the interesting machinery is in how the inputs are
//! acquired, not in the wording.

use crate::project::{truncate, ProjectData};

/// File content included in a prompt is capped at this many bytes
const FILE_EXCERPT_LIMIT: usize = 8000;

/// Prompt for a whole-project overview
pub fn overview(project: &ProjectData) -> String {
    format!(
        "You are an experienced software architect. Explain this project to a \
         developer seeing it for the first time.\n\n\
         {}\n\
         Readme excerpt:\n{}\n\n\
         Cover: the problem it solves, the main technologies and why they fit, \
         and what a newcomer should look at first. Be concrete and concise.",
        project.context_block(),
        project
            .readme
            .as_deref()
            .map(|r| truncate(r, 4000))
            .unwrap_or_else(|| "(no readme available)".to_string()),
    )
}

/// Prompt for a structure analysis
pub fn structure(project: &ProjectData) -> String {
    format!(
        "You are an experienced software architect. Analyze this project's \
         structure.\n\n\
         {}\n\
         File structure:\n{}\n\n\
         Identify the architectural pattern, the responsibility of each major \
         directory, and the order in which to read the code.",
        project.context_block(),
        project.render_tree(),
    )
}

/// Prompt for a single-file explanation
pub fn explain_file(project: &ProjectData, file_path: &str, content: &str) -> String {
    format!(
        "You are an experienced software engineer. Explain the following file \
         in the context of its project.\n\n\
         {}\n\
         File: {}\n\
         Content:\n```\n{}\n```\n\n\
         Cover: the file's purpose and role, the important functions or types, \
         and anything a reader is likely to find surprising.",
        project.context_block(),
        file_path,
        truncate(content, FILE_EXCERPT_LIMIT),
    )
}
