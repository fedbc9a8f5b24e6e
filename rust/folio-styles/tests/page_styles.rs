use folio_format::annotations::{AnnotationsFile, FormatFlags};
use folio_styles::{Style, page_styles};
use folio_testkit::{corpus::ANNOTATIONS_BIN, sample_corpus};

#[test]
fn test_page_styles_from_annotations() {
    let files = sample_corpus().build();
    let anno = AnnotationsFile::open(files.get(ANNOTATIONS_BIN).unwrap()).unwrap();

    // The deleted highlight over [0, 2) does not show.
    let runs = page_styles(&anno, 1, 10);
    let ranges: Vec<_> = runs.iter().map(|r| r.range.clone()).collect();
    assert_eq!(ranges, vec![0..4, 4..6, 6..10]);
    assert!(runs.iter().all(|r| r.style.flags == FormatFlags::BOLD));
    assert_eq!(runs[1].style.color_id, 3);
    assert_eq!(runs[0].style.color_id, 0);

    let runs = page_styles(&anno, 2, 5);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].range, 0..5);
    assert_eq!(runs[0].style, Style::default());

    assert!(page_styles(&anno, 1, 0).is_empty());
}
