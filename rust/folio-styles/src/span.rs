use std::ops::Range;

use folio_format::annotations::{AnnoFormatting, AnnoHighlight, FormatFlags};

/// A formatting span over the half-open token range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpan {
    pub range: Range<u32>,
    pub flags: FormatFlags,
    pub style_id: u16,
    pub layer: u16,
    pub priority: u16,
}

impl FormatSpan {
    pub fn new(range: Range<u32>, flags: FormatFlags) -> FormatSpan {
        FormatSpan {
            range,
            flags,
            style_id: 0,
            layer: 0,
            priority: 0,
        }
    }

    pub fn with_order(mut self, layer: u16, priority: u16) -> FormatSpan {
        self.layer = layer;
        self.priority = priority;
        self
    }

    /// Whether a newly started `self` sorts before the active span `other`.
    pub(crate) fn precedes(&self, other: &FormatSpan) -> bool {
        self.layer < other.layer || (self.layer == other.layer && self.priority <= other.priority)
    }
}

impl From<&AnnoFormatting> for FormatSpan {
    fn from(entry: &AnnoFormatting) -> Self {
        FormatSpan {
            range: entry.anchor_start..entry.anchor_end,
            flags: entry.flags,
            style_id: entry.style_id,
            layer: entry.layer,
            priority: entry.priority,
        }
    }
}

/// A highlight span over the half-open token range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub range: Range<u32>,
    pub color_id: u16,
    pub category_id: u16,
}

impl HighlightSpan {
    pub fn new(range: Range<u32>, color_id: u16) -> HighlightSpan {
        HighlightSpan {
            range,
            color_id,
            category_id: 0,
        }
    }
}

impl From<&AnnoHighlight> for HighlightSpan {
    fn from(entry: &AnnoHighlight) -> Self {
        HighlightSpan {
            range: entry.anchor_start..entry.anchor_end,
            color_id: entry.color_id,
            category_id: entry.category_id,
        }
    }
}

/// Effective style of a token: the bits of the topmost formatting span and the
/// color and category of the most recent highlight. Zero color means no highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub flags: FormatFlags,
    pub color_id: u16,
    pub category_id: u16,
}

impl Style {
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }

    pub fn bold(&self) -> bool {
        self.flags.contains(FormatFlags::BOLD)
    }

    pub fn italic(&self) -> bool {
        self.flags.contains(FormatFlags::ITALIC)
    }

    pub fn underline(&self) -> bool {
        self.flags.contains(FormatFlags::UNDERLINE)
    }

    pub fn small_caps(&self) -> bool {
        self.flags.contains(FormatFlags::SMALL_CAPS)
    }
}

/// A maximal token range sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<u32>,
    pub style: Style,
}

impl StyleRun {
    pub fn len(&self) -> u32 {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}
