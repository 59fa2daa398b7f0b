use crate::{consultant::Review, error::ConsultError, prompt::HEALTH_SCORE_LABEL};
use console::{measure_text_width, style, truncate_str, Term};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    let label = regex::escape(HEALTH_SCORE_LABEL);
    Regex::new(&format!(r"\*?\*?{label}:\*?\*?\s*(\d+)/(\d+)")).expect("valid health score regex")
});

pub const SCORE_NOT_FOUND: &str = "Could not find health score in output.";
pub const DOUBLE_CHECK_WARNING: &str = "WARNING: Please double-check since LLMs can still make mistakes.";

/// The score line the model was asked to conclude with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthScore {
    /// Matched text with markdown bold markers removed.
    pub text: String,
    /// `None` when the model wrote a number that doesn't fit.
    pub score: Option<u32>,
    pub out_of: Option<u32>,
}

impl HealthScore {
    /// Find the first score line in a model reply.
    pub fn extract(response: &str) -> Option<Self> {
        let caps = SCORE_RE.captures(response)?;
        let text = caps.get(0)?.as_str().replace('*', "");
        let score = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let out_of = caps.get(2).and_then(|m| m.as_str().parse().ok());
        Some(Self { text, score, out_of })
    }
}

/// A bordered box with a title in the top edge and a subtitle in the bottom
/// edge, sized to its content.
pub struct Panel<'a> {
    body: &'a str,
    title: String,
    subtitle: String,
    padding: (usize, usize),
    max_width: usize,
}

impl<'a> Panel<'a> {
    pub fn fit(body: &'a str) -> Self {
        Self {
            body,
            title: String::new(),
            subtitle: String::new(),
            padding: (1, 2),
            max_width: 100,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Vertical and horizontal padding inside the border.
    pub fn padding(mut self, vertical: usize, horizontal: usize) -> Self {
        self.padding = (vertical, horizontal);
        self
    }

    /// Total width budget, borders included.
    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    pub fn render(&self) -> String {
        let (pad_y, pad_x) = self.padding;
        // Two border columns plus horizontal padding on both sides.
        let wrap_at = self.max_width.saturating_sub(2 + 2 * pad_x).max(10);

        let lines: Vec<String> = self
            .body
            .lines()
            .flat_map(|line| wrap_line(line, wrap_at))
            .collect();

        let content_width = lines.iter().map(|l| measure_text_width(l)).max().unwrap_or(0);
        // A label needs a space on each side and at least one rule char at each corner.
        let label_room = self.max_width.saturating_sub(6).max(1);
        let title = truncate_str(&self.title, label_room, "…");
        let subtitle = truncate_str(&self.subtitle, label_room, "…");
        let label_width = |label: &str| {
            if label.is_empty() {
                0
            } else {
                measure_text_width(label) + 2
            }
        };
        let inner = (content_width + 2 * pad_x)
            .max(label_width(&*title) + 2)
            .max(label_width(&*subtitle) + 2);

        let border = |s: &str| style(s.to_string()).green().bright().to_string();
        let mut out = String::new();

        out.push_str(&self.edge('╭', '╮', &style(&title).cyan().bold().to_string(), inner));
        out.push('\n');

        let blank = format!("{}{}{}", border("│"), " ".repeat(inner), border("│"));
        for _ in 0..pad_y {
            out.push_str(&blank);
            out.push('\n');
        }
        for line in &lines {
            let fill = inner - pad_x - measure_text_width(line);
            out.push_str(&format!(
                "{}{}{}{}{}",
                border("│"),
                " ".repeat(pad_x),
                style(line).blue(),
                " ".repeat(fill),
                border("│")
            ));
            out.push('\n');
        }
        for _ in 0..pad_y {
            out.push_str(&blank);
            out.push('\n');
        }

        out.push_str(&self.edge('╰', '╯', &style(&subtitle).green().to_string(), inner));
        out
    }

    /// A horizontal edge with an optional centered label.
    fn edge(&self, left: char, right: char, label: &str, inner: usize) -> String {
        let paint = |s: String| style(s).green().bright().to_string();
        let label_width = measure_text_width(label);
        if label_width == 0 {
            return paint(format!("{left}{}{right}", "─".repeat(inner)));
        }

        let rule = inner - label_width - 2;
        let lead = rule / 2;
        let trail = rule - lead;
        format!(
            "{} {} {}",
            paint(format!("{left}{}", "─".repeat(lead))),
            label,
            paint(format!("{}{right}", "─".repeat(trail)))
        )
    }
}

/// Greedy word wrap on display width. Words longer than `width` are split.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if measure_text_width(line) <= width {
        return vec![line.to_string()];
    }

    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let mut wrapped = Vec::new();
    let mut current = indent.clone();

    for word in line.split_whitespace() {
        let mut word = word.to_string();
        let sep = if current.trim().is_empty() { 0 } else { 1 };

        if measure_text_width(&current) + sep + measure_text_width(&word) > width
            && !current.trim().is_empty()
        {
            wrapped.push(std::mem::replace(&mut current, indent.clone()));
        }

        while measure_text_width(&current) + measure_text_width(&word) > width {
            let room = width.saturating_sub(measure_text_width(&current)).max(1);
            let head: String = word.chars().take(room).collect();
            word = word.chars().skip(room).collect();
            current.push_str(&head);
            wrapped.push(std::mem::replace(&mut current, indent.clone()));
        }

        if !current.trim().is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.trim().is_empty() {
        wrapped.push(current);
    }
    wrapped
}

pub struct Reporter {
    width: usize,
}

impl Reporter {
    pub fn new() -> Self {
        let width = Term::stdout()
            .size_checked()
            .map(|(_, cols)| cols as usize)
            .unwrap_or(100);
        Self::with_width(width)
    }

    pub fn with_width(width: usize) -> Self {
        Self { width }
    }

    /// Full review inside a titled panel.
    pub fn render_review(&self, review: &Review) -> String {
        Panel::fit(review.response.trim())
            .title(format!("Review Made for \"{}\"", review.package.display()))
            .subtitle(format!("LLM Powered Improvements by \"{}\"", review.model))
            .padding(1, 2)
            .max_width(self.width)
            .render()
    }

    /// Score-only view: the bare score line, or the whole reply plus a warning
    /// when the model didn't follow the format.
    pub fn render_score(&self, review: &Review) -> String {
        match HealthScore::extract(&review.response) {
            Some(score) => {
                tracing::info!(score = ?score.score, out_of = ?score.out_of, "{}", score.text);
                score.text
            }
            None => {
                tracing::warn!("no health score line in model reply");
                format!(
                    "{}\n{}",
                    review.response,
                    style(SCORE_NOT_FOUND).red().bold()
                )
            }
        }
    }

    pub fn render_footer(&self, saved_to: Option<&Path>) -> String {
        let mut out = format!("\n{}", style(DOUBLE_CHECK_WARNING).yellow().bold());
        if let Some(path) = saved_to {
            out.push_str(&format!(
                "\n\n{} {}",
                style("Output saved to:").cyan().bold(),
                path.display()
            ));
        }
        out
    }

    /// Write the raw reply to `path`, replacing anything already there.
    pub fn export_report(&self, review: &Review, path: &Path) -> Result<PathBuf, ConsultError> {
        fs::write(path, &review.response).map_err(|e| ConsultError::io(path, e))?;
        tracing::info!("Report written to {}", path.display());
        Ok(path.to_path_buf())
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
