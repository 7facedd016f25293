//! Line numbering and line emphasis
//!
//!     The formatter lays out restored markup line by line. It works on source-relative line
//!     indices only; the starting-line offset is applied in exactly one place,
//!     [`LineNumbering::displayed`], when a number is printed.
//!
//!     Per-line features need a line-aligned fragment. When an engine regrouped lines, inline
//!     numbering falls back to the table layout (whose gutter is derived from the source line
//!     count) and emphasis is dropped, each with a warning.

use crate::highlighter::{LinenumsMode, RenderedFragment};
use crate::ranges::LineHighlightSet;

/// Numbering requested for a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumbering {
    pub mode: LinenumsMode,
    start: usize,
}

impl LineNumbering {
    /// Numbering starting at `start`; values below 1 are clamped to 1
    pub fn new(mode: LinenumsMode, start: Option<i64>) -> Self {
        let start = start
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(1)
            .max(1);
        LineNumbering { mode, start }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// The number printed for the 1-based source line `line`
    pub fn displayed(&self, line: usize) -> usize {
        self.start + line - 1
    }

    /// Width of the widest displayed number in a block of `line_count` lines
    fn width(&self, line_count: usize) -> usize {
        self.displayed(line_count.max(1)).to_string().len()
    }
}

/// Lays out a restored fragment with numbering and emphasis
#[derive(Debug, Clone, Default)]
pub struct LineFormatter {
    numbering: Option<LineNumbering>,
    emphasis: LineHighlightSet,
}

impl LineFormatter {
    pub fn new(numbering: Option<LineNumbering>, emphasis: LineHighlightSet) -> Self {
        LineFormatter {
            numbering,
            emphasis,
        }
    }

    pub fn format(&self, fragment: &RenderedFragment, line_count: usize) -> String {
        match self.numbering {
            None => self.plain(fragment),
            Some(numbering) => match numbering.mode {
                LinenumsMode::Inline if fragment.is_line_aligned() => {
                    self.inline(fragment, numbering, line_count)
                }
                LinenumsMode::Inline => {
                    tracing::warn!(
                        "highlighted markup is not line-aligned, numbering lines in a table"
                    );
                    self.table(fragment, numbering, line_count)
                }
                LinenumsMode::Table => self.table(fragment, numbering, line_count),
            },
        }
    }

    fn plain(&self, fragment: &RenderedFragment) -> String {
        if self.emphasis.is_empty() {
            return fragment.markup().to_string();
        }
        if !fragment.is_line_aligned() {
            tracing::warn!("highlighted markup is not line-aligned, skipping line emphasis");
            return fragment.markup().to_string();
        }
        let lines: Vec<&str> = fragment.markup().split('\n').collect();
        let last = lines.len();
        let mut output = String::with_capacity(fragment.markup().len() + 32);
        for (idx, line) in lines.into_iter().enumerate() {
            let line_no = idx + 1;
            if self.emphasis.contains(line_no) {
                push_emphasized(&mut output, line);
            } else {
                output.push_str(line);
                if line_no != last {
                    output.push('\n');
                }
            }
        }
        output
    }

    fn inline(
        &self,
        fragment: &RenderedFragment,
        numbering: LineNumbering,
        line_count: usize,
    ) -> String {
        let width = numbering.width(line_count);
        let mut output = String::new();
        for (idx, line) in content_lines(fragment, line_count).enumerate() {
            let line_no = idx + 1;
            if line_no > 1 && !self.emphasis.contains(line_no - 1) {
                output.push('\n');
            }
            let prefix = format!(
                r#"<span class="lineno">{:>width$} </span>"#,
                numbering.displayed(line_no)
            );
            if self.emphasis.contains(line_no) {
                push_emphasized(&mut output, &format!("{prefix}{line}"));
            } else {
                output.push_str(&prefix);
                output.push_str(line);
            }
        }
        output
    }

    fn table(
        &self,
        fragment: &RenderedFragment,
        numbering: LineNumbering,
        line_count: usize,
    ) -> String {
        let width = numbering.width(line_count);
        let mut gutter = String::new();
        for line_no in 1..=line_count {
            gutter.push_str(&format!("{:>width$}\n", numbering.displayed(line_no)));
        }

        let mut code = String::new();
        if fragment.is_line_aligned() {
            for (idx, line) in content_lines(fragment, line_count).enumerate() {
                if self.emphasis.contains(idx + 1) {
                    push_emphasized(&mut code, line);
                } else {
                    code.push_str(line);
                    code.push('\n');
                }
            }
        } else {
            if !self.emphasis.is_empty() {
                tracing::warn!("highlighted markup is not line-aligned, skipping line emphasis");
            }
            code.push_str(fragment.markup());
            if !code.is_empty() && !code.ends_with('\n') {
                code.push('\n');
            }
        }

        format!(
            concat!(
                r#"<table class="linenotable"><tbody><tr>"#,
                r#"<td class="linenos"><pre class="lineno">{}</pre></td>"#,
                r#"<td class="code"><pre>{}</pre></td>"#,
                r#"</tr></tbody></table>"#
            ),
            gutter, code
        )
    }
}

fn content_lines(fragment: &RenderedFragment, line_count: usize) -> impl Iterator<Item = &str> {
    fragment.markup().split('\n').take(line_count)
}

fn push_emphasized(output: &mut String, line: &str) {
    output.push_str(r#"<span class="hll">"#);
    output.push_str(line);
    output.push_str("\n</span>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emphasis(lines: &[usize]) -> LineHighlightSet {
        lines.iter().copied().collect()
    }

    #[test]
    fn test_start_is_clamped() {
        assert_eq!(LineNumbering::new(LinenumsMode::Table, Some(0)).start(), 1);
        assert_eq!(LineNumbering::new(LinenumsMode::Table, Some(-4)).start(), 1);
        assert_eq!(LineNumbering::new(LinenumsMode::Table, None).start(), 1);
        assert_eq!(LineNumbering::new(LinenumsMode::Table, Some(9)).displayed(2), 10);
    }

    #[test]
    fn test_plain_without_emphasis_is_untouched() {
        let fragment = RenderedFragment::aligned("a\nb");
        assert_eq!(LineFormatter::default().format(&fragment, 2), "a\nb");
    }

    #[test]
    fn test_plain_with_emphasis() {
        let fragment = RenderedFragment::aligned("a\nb\nc");
        let html = LineFormatter::new(None, emphasis(&[2])).format(&fragment, 3);
        assert_eq!(html, "a\n<span class=\"hll\">b\n</span>c");
    }

    #[test]
    fn test_emphasis_on_last_line() {
        let fragment = RenderedFragment::aligned("a\nb");
        let html = LineFormatter::new(None, emphasis(&[2])).format(&fragment, 2);
        assert_eq!(html, "a\n<span class=\"hll\">b\n</span>");
    }

    #[test]
    fn test_table_with_offset() {
        let numbering = LineNumbering::new(LinenumsMode::Table, Some(9));
        let fragment = RenderedFragment::aligned("puts 1\nputs 2");
        let formatter = LineFormatter::new(Some(numbering), LineHighlightSet::default());
        let html = formatter.format(&fragment, 2);
        insta::assert_snapshot!(html, @r#"
        <table class="linenotable"><tbody><tr><td class="linenos"><pre class="lineno"> 9
        10
        </pre></td><td class="code"><pre>puts 1
        puts 2
        </pre></td></tr></tbody></table>
        "#);
    }

    #[test]
    fn test_inline_with_offset() {
        let numbering = LineNumbering::new(LinenumsMode::Inline, Some(9));
        let fragment = RenderedFragment::aligned("puts 1\nputs 2");
        let formatter = LineFormatter::new(Some(numbering), LineHighlightSet::default());
        let html = formatter.format(&fragment, 2);
        assert_eq!(
            html,
            "<span class=\"lineno\"> 9 </span>puts 1\n<span class=\"lineno\">10 </span>puts 2"
        );
    }

    #[test]
    fn test_inline_with_emphasis() {
        let numbering = LineNumbering::new(LinenumsMode::Inline, None);
        let fragment = RenderedFragment::aligned("a\nb\nc");
        let html = LineFormatter::new(Some(numbering), emphasis(&[2])).format(&fragment, 3);
        assert_eq!(
            html,
            concat!(
                "<span class=\"lineno\">1 </span>a\n",
                "<span class=\"hll\"><span class=\"lineno\">2 </span>b\n</span>",
                "<span class=\"lineno\">3 </span>c"
            )
        );
    }

    #[test]
    fn test_emphasis_uses_source_lines_not_displayed_numbers() {
        let numbering = LineNumbering::new(LinenumsMode::Table, Some(10));
        let fragment = RenderedFragment::aligned("a\nb");
        let html = LineFormatter::new(Some(numbering), emphasis(&[1])).format(&fragment, 2);
        assert!(html.contains("<td class=\"code\"><pre><span class=\"hll\">a\n</span>b\n</pre>"));
        assert!(html.contains("<pre class=\"lineno\">10\n11\n</pre>"));
    }

    #[test]
    fn test_inline_falls_back_to_table_for_opaque_fragment() {
        let numbering = LineNumbering::new(LinenumsMode::Inline, None);
        let fragment = RenderedFragment::opaque("<div>a b</div>");
        let html = LineFormatter::new(Some(numbering), emphasis(&[1])).format(&fragment, 2);
        assert!(html.starts_with("<table class=\"linenotable\">"));
        assert!(html.contains("<pre class=\"lineno\">1\n2\n</pre>"));
        assert!(html.contains("<pre><div>a b</div>\n</pre>"));
        assert!(!html.contains("hll"));
    }

    #[test]
    fn test_table_for_empty_block() {
        let numbering = LineNumbering::new(LinenumsMode::Table, None);
        let html = LineFormatter::new(Some(numbering), LineHighlightSet::default())
            .format(&RenderedFragment::aligned(""), 0);
        assert!(html.contains("<pre class=\"lineno\"></pre>"));
        assert!(html.contains("<td class=\"code\"><pre></pre>"));
    }
}
