//! Renders a shopping list as a paginated plain-text document.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::ExportError;
use crate::shopping_list::{PeopleCount, ShoppingList};

pub const TITLE: &str = "Shopping List";
pub const PAGE_WIDTH: usize = 80;
pub const PAGE_MARGIN: usize = 4;
const UNDERLINE_PADDING: usize = 2;
/// The title block takes the top of the first page.
pub const FIRST_PAGE_BODY_LINES: usize = 25;
pub const PAGE_BODY_LINES: usize = 27;
pub const PAGE_BREAK: char = '\x0c';
const PAGE_SEPARATOR: &str = "\n\x0c";

pub fn default_file_name(people: PeopleCount) -> String {
    format!("shopping_list_{}_people.txt", people)
}

fn title_block() -> Vec<String> {
    let underline_width = TITLE.len() + 2 * UNDERLINE_PADDING;
    let title_indent = (PAGE_WIDTH - TITLE.len()) / 2;
    let underline_indent = title_indent - UNDERLINE_PADDING;
    vec![
        format!("{}{}", " ".repeat(title_indent), TITLE),
        format!("{}{}", " ".repeat(underline_indent), "-".repeat(underline_width)),
        String::new(),
    ]
}

/// Greedy word wrap. Words longer than `width` are split; an empty line
/// stays one empty line.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut wrapped = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            wrapped.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

fn body_lines(raw: &str) -> Vec<String> {
    let margin = " ".repeat(PAGE_MARGIN);
    let margin = margin.as_str();
    let text_width = PAGE_WIDTH - 2 * PAGE_MARGIN;

    raw.lines()
        .flat_map(|line| {
            let indent = line.len() - line.trim_start().len();
            let indent = indent.min(text_width / 2);
            wrap_line(line, text_width - indent)
                .into_iter()
                .map(move |wrapped| {
                    if wrapped.is_empty() {
                        String::new()
                    } else {
                        format!("{}{}{}", margin, " ".repeat(indent), wrapped)
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Pages are separated by a form feed at the start of a line.
pub fn render_document(list: &ShoppingList) -> Result<String, ExportError> {
    if list.raw.trim().is_empty() {
        return Err(ExportError::EmptyList);
    }

    let mut lines = body_lines(list.raw.trim_end()).into_iter();
    let mut pages: Vec<Vec<String>> = Vec::new();

    let mut first_page = title_block();
    first_page.extend(lines.by_ref().take(FIRST_PAGE_BODY_LINES));
    pages.push(first_page);

    loop {
        let page: Vec<String> = lines.by_ref().take(PAGE_BODY_LINES).collect();
        if page.is_empty() {
            break;
        }
        pages.push(page);
    }

    let mut document = pages
        .iter()
        .map(|page| page.join("\n"))
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);
    document.push('\n');
    Ok(document)
}

/// Writes the document. A directory target gets the default file name.
pub async fn export_to_file(list: &ShoppingList, target: &Path) -> Result<PathBuf, ExportError> {
    let document = render_document(list)?;
    let path = if fs::metadata(target).await.map(|meta| meta.is_dir()).unwrap_or(false) {
        target.join(default_file_name(list.people))
    } else {
        target.to_path_buf()
    };

    fs::write(&path, document).await?;
    info!(path = %path.display(), "shopping list exported");
    Ok(path)
}
