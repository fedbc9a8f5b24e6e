use std::ops::Range;

use folio_format::annotations::{AnnotationsFile, FormatFlags};

use crate::span::{FormatSpan, HighlightSpan, Style, StyleRun};

/// Span boundary. Variant order is the processing order at equal positions;
/// payloads are indices into the input slices and serve as span identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Event {
    EndFormat(usize),
    EndHighlight(usize),
    StartFormat(usize),
    StartHighlight(usize),
}

/// Clamps `range` to `[0, token_count]`; `None` if nothing is left.
fn clamp(range: &Range<u32>, token_count: u32) -> Option<Range<u32>> {
    let clamped = range.start.min(token_count)..range.end.min(token_count);
    (!clamped.is_empty()).then_some(clamped)
}

fn collect_events(
    token_count: u32,
    formats: &[FormatSpan],
    highlights: &[HighlightSpan],
) -> Vec<(u32, Event)> {
    let mut events = Vec::with_capacity(2 * (formats.len() + highlights.len()));
    for (i, span) in formats.iter().enumerate() {
        if let Some(range) = clamp(&span.range, token_count) {
            events.push((range.start, Event::StartFormat(i)));
            events.push((range.end, Event::EndFormat(i)));
        }
    }
    for (i, span) in highlights.iter().enumerate() {
        if let Some(range) = clamp(&span.range, token_count) {
            events.push((range.start, Event::StartHighlight(i)));
            events.push((range.end, Event::EndHighlight(i)));
        }
    }
    events.sort_unstable();
    events
}

struct ActiveSpans<'a> {
    formats: &'a [FormatSpan],
    highlights: &'a [HighlightSpan],
    /// Ascending by `(layer, priority)`; a new span goes below its equals.
    active_formats: Vec<usize>,
    /// Start order; the last one is visible.
    active_highlights: Vec<usize>,
}

impl ActiveSpans<'_> {
    fn apply(&mut self, event: Event) {
        match event {
            Event::StartFormat(i) => {
                let span = &self.formats[i];
                let at = self
                    .active_formats
                    .iter()
                    .position(|&j| span.precedes(&self.formats[j]))
                    .unwrap_or(self.active_formats.len());
                self.active_formats.insert(at, i);
            }
            Event::EndFormat(i) => self.active_formats.retain(|&j| j != i),
            Event::StartHighlight(i) => self.active_highlights.push(i),
            Event::EndHighlight(i) => self.active_highlights.retain(|&j| j != i),
        }
    }

    fn style(&self) -> Style {
        let mut style = Style::default();
        if let Some(&top) = self.active_formats.last() {
            style.flags = FormatFlags::from_bits_truncate(self.formats[top].flags.bits());
        }
        if let Some(&last) = self.active_highlights.last() {
            style.color_id = self.highlights[last].color_id;
            style.category_id = self.highlights[last].category_id;
        }
        style
    }
}

/// Merges formatting and highlight spans into style runs over `[0, token_count)`.
///
/// Runs are ordered, non-overlapping, never empty and, for a positive
/// `token_count`, cover the whole range; adjacent runs have different styles.
/// Spans are clamped to the range and spans left empty are ignored. With no spans
/// the result is a single default-styled run; `token_count == 0` yields no runs.
///
/// Among active formatting spans the one with the highest `(layer, priority)`
/// wins, and among equals the earliest started one. Among active highlights the
/// most recently started one wins.
pub fn merge(
    token_count: u32,
    formats: &[FormatSpan],
    highlights: &[HighlightSpan],
) -> Vec<StyleRun> {
    let mut runs = Vec::new();
    if token_count == 0 {
        return runs;
    }

    let events = collect_events(token_count, formats, highlights);
    let mut active = ActiveSpans {
        formats,
        highlights,
        active_formats: Vec::new(),
        active_highlights: Vec::new(),
    };

    let mut next = 0;
    let mut apply_at = |pos: u32, active: &mut ActiveSpans| {
        while let Some(&(at, event)) = events.get(next) {
            if at != pos {
                break;
            }
            active.apply(event);
            next += 1;
        }
    };

    apply_at(0, &mut active);
    let mut cur_start = 0;
    let mut cur_style = active.style();

    // Styles only change at span boundaries, so the sweep visits those and the end.
    let mut boundaries: Vec<u32> = events
        .iter()
        .map(|&(pos, _)| pos)
        .filter(|&pos| pos > 0)
        .collect();
    boundaries.push(token_count);
    boundaries.dedup();

    for pos in boundaries {
        apply_at(pos, &mut active);
        let style = active.style();
        if style != cur_style || pos == token_count {
            if pos > cur_start {
                runs.push(StyleRun {
                    range: cur_start..pos,
                    style: cur_style,
                });
            }
            cur_start = pos;
            cur_style = style;
        }
    }
    runs
}

/// Style runs of `page_id`, from the page's formatting and non-deleted highlights.
pub fn page_styles(anno: &AnnotationsFile, page_id: u32, token_count: u32) -> Vec<StyleRun> {
    let formats: Vec<FormatSpan> = anno
        .page_formatting(page_id)
        .map(|entry| FormatSpan::from(&entry))
        .collect();
    let highlights: Vec<HighlightSpan> = anno
        .page_highlights(page_id)
        .map(|entry| HighlightSpan::from(&entry))
        .collect();
    merge(token_count, &formats, &highlights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(range: Range<u32>) -> FormatSpan {
        FormatSpan::new(range, FormatFlags::BOLD)
    }

    fn italic(range: Range<u32>) -> FormatSpan {
        FormatSpan::new(range, FormatFlags::ITALIC)
    }

    fn style(flags: FormatFlags, color_id: u16) -> Style {
        Style {
            flags,
            color_id,
            category_id: 0,
        }
    }

    fn run(range: Range<u32>, style: Style) -> StyleRun {
        StyleRun { range, style }
    }

    fn check_coverage(token_count: u32, runs: &[StyleRun]) {
        if token_count == 0 {
            assert!(runs.is_empty());
            return;
        }
        assert_eq!(runs.first().unwrap().range.start, 0);
        assert_eq!(runs.last().unwrap().range.end, token_count);
        for run in runs {
            assert!(!run.is_empty());
        }
        for pair in runs.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
            assert_ne!(pair[0].style, pair[1].style);
        }
    }

    #[test]
    fn test_bold_with_highlight() {
        let runs = merge(10, &[bold(0..10)], &[HighlightSpan::new(4..6, 3)]);
        assert_eq!(
            runs,
            vec![
                run(0..4, style(FormatFlags::BOLD, 0)),
                run(4..6, style(FormatFlags::BOLD, 3)),
                run(6..10, style(FormatFlags::BOLD, 0)),
            ]
        );
        assert!(runs[1].style.bold());
        assert!(!runs[1].style.italic());
    }

    #[test]
    fn test_no_spans() {
        assert_eq!(merge(7, &[], &[]), vec![run(0..7, Style::default())]);
        assert!(merge(0, &[], &[]).is_empty());
        assert!(merge(0, &[bold(0..3)], &[]).is_empty());
    }

    #[test]
    fn test_layers_and_priorities() {
        let low = italic(0..8).with_order(1, 5);
        let high = bold(2..6).with_order(2, 0);
        let runs = merge(8, &[high, low], &[]);
        assert_eq!(
            runs,
            vec![
                run(0..2, style(FormatFlags::ITALIC, 0)),
                run(2..6, style(FormatFlags::BOLD, 0)),
                run(6..8, style(FormatFlags::ITALIC, 0)),
            ]
        );

        // A lower layer never covers a higher one, whatever the start order.
        let formats = [bold(0..8).with_order(2, 0), italic(2..6).with_order(1, 9)];
        let runs = merge(8, &formats, &[]);
        assert_eq!(runs, vec![run(0..8, style(FormatFlags::BOLD, 0))]);
    }

    #[test]
    fn test_equal_order_ties() {
        // A span started later with the same (layer, priority) stays below.
        let runs = merge(6, &[bold(0..6), italic(2..4)], &[]);
        assert_eq!(runs, vec![run(0..6, style(FormatFlags::BOLD, 0))]);

        // Once the older span ends, the newer one shows.
        let runs = merge(6, &[bold(0..3), italic(2..6)], &[]);
        assert_eq!(
            runs,
            vec![
                run(0..3, style(FormatFlags::BOLD, 0)),
                run(3..6, style(FormatFlags::ITALIC, 0)),
            ]
        );

        // Same start position: input order decides.
        let runs = merge(4, &[bold(0..4), italic(0..4)], &[]);
        assert_eq!(runs, vec![run(0..4, style(FormatFlags::BOLD, 0))]);
    }

    #[test]
    fn test_highlight_stack() {
        let runs = merge(
            10,
            &[],
            &[HighlightSpan::new(0..10, 1), HighlightSpan::new(3..5, 2)],
        );
        assert_eq!(
            runs,
            vec![
                run(0..3, style(FormatFlags::empty(), 1)),
                run(3..5, style(FormatFlags::empty(), 2)),
                run(5..10, style(FormatFlags::empty(), 1)),
            ]
        );
    }

    #[test]
    fn test_boundary_order() {
        // At position 4 the bold span ends before the italic one starts.
        let runs = merge(8, &[bold(0..4), italic(4..8)], &[]);
        assert_eq!(
            runs,
            vec![
                run(0..4, style(FormatFlags::BOLD, 0)),
                run(4..8, style(FormatFlags::ITALIC, 0)),
            ]
        );

        // Identical styles on touching spans produce one run.
        let runs = merge(8, &[bold(0..4), bold(4..8)], &[]);
        assert_eq!(runs, vec![run(0..8, style(FormatFlags::BOLD, 0))]);
    }

    #[test]
    fn test_clamping() {
        let highlights = [HighlightSpan::new(5..6, 4)];
        let runs = merge(5, &[bold(3..50), italic(7..9)], &highlights);
        assert_eq!(
            runs,
            vec![
                run(0..3, Style::default()),
                run(3..5, style(FormatFlags::BOLD, 0)),
            ]
        );

        // Empty spans never leak into later positions.
        let runs = merge(6, &[bold(2..2)], &[HighlightSpan::new(4..1, 9)]);
        assert_eq!(runs, vec![run(0..6, Style::default())]);
    }

    #[test]
    fn test_unknown_flag_bits_ignored() {
        let span = FormatSpan::new(0..2, FormatFlags::from_bits_retain(0x8001));
        let runs = merge(4, &[span, bold(2..4)], &[]);
        assert_eq!(runs, vec![run(0..4, style(FormatFlags::BOLD, 0))]);
    }

    #[test]
    fn test_random_coverage_and_idempotence() {
        let mut rng = fastrand::Rng::with_seed(0x5171e5);
        let flags = [
            FormatFlags::BOLD,
            FormatFlags::ITALIC,
            FormatFlags::UNDERLINE,
            FormatFlags::SMALL_CAPS,
            FormatFlags::BOLD | FormatFlags::ITALIC,
        ];
        for _ in 0..300 {
            let token_count = rng.u32(0..40);
            let span = |rng: &mut fastrand::Rng| {
                let start = rng.u32(0..45);
                start..start + rng.u32(0..15)
            };
            let formats: Vec<FormatSpan> = (0..rng.usize(0..6))
                .map(|_| {
                    FormatSpan::new(span(&mut rng), flags[rng.usize(..flags.len())])
                        .with_order(rng.u16(0..3), rng.u16(0..3))
                })
                .collect();
            let highlights: Vec<HighlightSpan> = (0..rng.usize(0..4))
                .map(|_| HighlightSpan::new(span(&mut rng), rng.u16(1..4)))
                .collect();

            let runs = merge(token_count, &formats, &highlights);
            check_coverage(token_count, &runs);
            assert_eq!(runs, merge(token_count, &formats, &highlights));

            // Feeding the runs back reproduces them.
            let formats: Vec<FormatSpan> = runs
                .iter()
                .filter(|r| !r.style.flags.is_empty())
                .map(|r| FormatSpan::new(r.range.clone(), r.style.flags))
                .collect();
            let highlights: Vec<HighlightSpan> = runs
                .iter()
                .filter(|r| r.style.color_id != 0)
                .map(|r| HighlightSpan::new(r.range.clone(), r.style.color_id))
                .collect();
            assert_eq!(merge(token_count, &formats, &highlights), runs);
        }
    }
}
