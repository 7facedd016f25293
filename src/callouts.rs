//! Callout bubble rendering

use crate::markup;
use crate::shield::{CalloutMark, CalloutNumber};
use serde::{Deserialize, Serialize};

/// How callout numbers are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutIcons {
    /// `(1)` in bold text
    #[default]
    Text,
    /// An icon-font glyph with the text as fallback
    Font,
}

impl CalloutIcons {
    /// Interpret the document's `icons` attribute
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("font") => CalloutIcons::Font,
            _ => CalloutIcons::Text,
        }
    }
}

/// Renders the markup that replaces a callout sentinel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalloutRenderer {
    icons: CalloutIcons,
}

impl CalloutRenderer {
    pub fn new(icons: CalloutIcons) -> Self {
        CalloutRenderer { icons }
    }

    pub fn icons(&self) -> CalloutIcons {
        self.icons
    }

    /// Markup for a single callout number
    pub fn bubble(&self, number: u32) -> String {
        match self.icons {
            CalloutIcons::Text => format!(r#"<b class="conum">({number})</b>"#),
            CalloutIcons::Font => {
                format!(r#"<i class="conum" data-value="{number}"></i><b>({number})</b>"#)
            }
        }
    }

    /// Markup for one number, kept inside an XML comment when it was written as one
    fn number(&self, number: &CalloutNumber) -> String {
        let bubble = self.bubble(number.value);
        if number.xml {
            format!("&lt;!--{bubble}--&gt;")
        } else {
            bubble
        }
    }

    /// Markup for every number of a mark, preceded by the line comment it was written behind
    pub fn render(&self, mark: &CalloutMark) -> String {
        let bubbles: Vec<String> = mark.numbers.iter().map(|n| self.number(n)).collect();
        let mut html = String::new();
        if let Some(guard) = &mark.guard {
            html.push_str(&markup::escape(guard));
        }
        html.push_str(&bubbles.join(" "));
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(numbers: &[u32], guard: Option<&str>) -> CalloutMark {
        CalloutMark {
            line: 1,
            column: 0,
            guard: guard.map(str::to_string),
            numbers: numbers
                .iter()
                .map(|&value| CalloutNumber { value, xml: false })
                .collect(),
        }
    }

    #[test]
    fn test_text_bubble() {
        let renderer = CalloutRenderer::default();
        assert_eq!(renderer.bubble(1), r#"<b class="conum">(1)</b>"#);
    }

    #[test]
    fn test_font_bubble() {
        let renderer = CalloutRenderer::new(CalloutIcons::Font);
        insta::assert_snapshot!(
            renderer.bubble(2),
            @r#"<i class="conum" data-value="2"></i><b>(2)</b>"#
        );
    }

    #[test]
    fn test_multiple_numbers_are_space_joined() {
        let html = CalloutRenderer::default().render(&mark(&[2, 3], None));
        assert_eq!(html, r#"<b class="conum">(2)</b> <b class="conum">(3)</b>"#);
    }

    #[test]
    fn test_guard_precedes_bubbles() {
        let html = CalloutRenderer::default().render(&mark(&[1], Some("// ")));
        assert_eq!(html, r#"// <b class="conum">(1)</b>"#);
    }

    #[test]
    fn test_xml_mark_keeps_comment_delimiters() {
        let mut xml = mark(&[1, 2], None);
        xml.numbers[0].xml = true;
        let html = CalloutRenderer::default().render(&xml);
        assert_eq!(
            html,
            r#"&lt;!--<b class="conum">(1)</b>--&gt; <b class="conum">(2)</b>"#
        );
    }

    #[test]
    fn test_icons_attribute() {
        assert_eq!(CalloutIcons::from_attribute(Some("font")), CalloutIcons::Font);
        assert_eq!(CalloutIcons::from_attribute(Some("image")), CalloutIcons::Text);
        assert_eq!(CalloutIcons::from_attribute(None), CalloutIcons::Text);
    }
}
