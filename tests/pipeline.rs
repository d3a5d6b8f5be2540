//! End-to-end tests for the conversion pipeline, exercising only the public
//! API. The external converter is pointed at a binary that cannot exist so
//! every run is deterministic and offline.

use ocr2doc::pipeline::docx::{parse_blocks, ColumnAlign, DocBlock};
use ocr2doc::{
    convert, convert_to_files, ConversionWarning, DocxEngine, RenderConfig, PAGE_BREAK_SENTINEL,
};
use serde_json::json;

fn builder_only(title: Option<&str>) -> RenderConfig {
    let mut b = RenderConfig::builder().use_converter(false);
    if let Some(t) = title {
        b = b.title(t);
    }
    b.build().unwrap()
}

#[tokio::test]
async fn mixed_page_shapes_convert_end_to_end() {
    let raw = json!({"pages": [
        {"markdown_text": "# Section\n\nProse."},
        {"lines": ["First line", "Second line"]},
        {"paragraphs": ["Para one.", "Para two."]},
        {"blocks": [{"rows": [["H1", "H2"], ["a", "b"]]}, "closing note"]},
    ]});

    let out = convert(&raw, &builder_only(Some("Mixed"))).await.unwrap();

    assert!(out.markdown.starts_with("# Mixed\n\n"));
    assert_eq!(out.markdown.matches(PAGE_BREAK_SENTINEL).count(), 3);
    assert!(out.markdown.contains("First line\nSecond line"));
    assert!(out.markdown.contains("Para one.\n\nPara two."));
    assert!(out.markdown.contains("| H1 | H2 |"));
    assert_eq!(out.pages.len(), 4);
    assert_eq!(&out.docx[..2], b"PK");
    assert!(out.warnings.is_empty());
}

#[tokio::test]
async fn extraction_priority_is_markdown_lines_paragraphs_blocks() {
    let raw = json!({"pages": [
        {"markdown": "MD wins", "lines": ["not used"], "paragraphs": ["not used"]},
        {"lines": ["lines win"], "paragraphs": ["not used"]},
        {"paragraphs": ["paragraphs win"], "blocks": ["not used"]},
    ]});
    let out = convert(&raw, &builder_only(None)).await.unwrap();
    assert_eq!(out.pages[0].text, "MD wins");
    assert_eq!(out.pages[1].text, "lines win");
    assert_eq!(out.pages[2].text, "paragraphs win");
}

#[tokio::test]
async fn nested_envelope_and_top_level_text_fallback() {
    let nested = json!({"result": {"pages": [{"markdown": "nested page"}]}});
    let out = convert(&nested, &builder_only(None)).await.unwrap();
    assert_eq!(out.markdown, "nested page");

    let text_only = json!({"full_text": "the whole document"});
    let out = convert(&text_only, &builder_only(None)).await.unwrap();
    assert_eq!(out.pages.len(), 1);
    assert_eq!(out.markdown, "the whole document");
}

#[tokio::test]
async fn table_survives_into_docx_structure() {
    let raw = json!({"pages": [
        {"blocks": [{"rows": [["Name", "Qty"], ["Bolt", 4], ["Nut", 9]]}]}
    ]});
    let out = convert(&raw, &builder_only(None)).await.unwrap();

    let blocks = parse_blocks(&out.markdown);
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        DocBlock::Table {
            aligns,
            header,
            rows,
        } => {
            assert_eq!(header, &["Name", "Qty"]);
            assert_eq!(aligns, &[ColumnAlign::Left, ColumnAlign::Left]);
            assert_eq!(rows, &[vec!["Bolt", "4"], vec!["Nut", "9"]]);
        }
        other => panic!("expected a table block, got {other:?}"),
    }
    assert_eq!(&out.docx[..2], b"PK");
}

#[tokio::test]
async fn page_break_toggle_controls_sentinels() {
    let raw = json!({"pages": [
        {"markdown": "one"}, {"markdown": "two"}, {"markdown": "three"},
    ]});

    let with = convert(&raw, &builder_only(None)).await.unwrap();
    assert_eq!(with.markdown.matches(PAGE_BREAK_SENTINEL).count(), 2);

    let config = RenderConfig::builder()
        .use_converter(false)
        .page_breaks(false)
        .build()
        .unwrap();
    let without = convert(&raw, &config).await.unwrap();
    assert_eq!(without.markdown, "one\n\ntwo\n\nthree");
}

#[tokio::test]
async fn missing_converter_falls_back_and_warns() {
    let raw = json!({"pages": [{"markdown": "plain prose, no tables"}]});
    let config = RenderConfig::builder()
        .converter_command("ocr2doc-no-such-binary")
        .build()
        .unwrap();

    let out = convert(&raw, &config).await.unwrap();
    assert_eq!(&out.docx[..2], b"PK", "fallback must still produce a DOCX");
    assert_eq!(out.stats.docx_engine, DocxEngine::Builder);
    assert_eq!(out.warnings.len(), 1);
    assert!(matches!(
        out.warnings[0],
        ConversionWarning::ConverterUnavailable { .. }
    ));
}

#[tokio::test]
async fn malformed_page_degrades_without_aborting() {
    let raw = json!({"pages": [
        {"markdown": "good"},
        {"lines": "not-an-array"},
        {"markdown": "also good"},
    ]});
    let out = convert(&raw, &builder_only(None)).await.unwrap();

    assert_eq!(out.pages.len(), 3);
    assert_eq!(out.pages[1].text, "");
    assert!(out.pages[1].warning.is_some());
    assert_eq!(out.stats.malformed_pages, 1);
    assert!(out.markdown.contains("good"));
    assert!(out.markdown.contains("also good"));
}

#[tokio::test]
async fn empty_response_with_title_yields_title_only_documents() {
    let raw = json!({"pages": []});
    let out = convert(&raw, &builder_only(Some("Empty"))).await.unwrap();
    assert_eq!(out.markdown, "# Empty");
    assert_eq!(out.stats.total_pages, 0);
    assert_eq!(&out.docx[..2], b"PK");
}

#[tokio::test]
async fn exact_two_page_scenario() {
    let raw = json!({"pages": [
        {"markdown_text": "Hello"},
        {"lines": ["A", "B"]},
    ]});
    let out = convert(&raw, &builder_only(Some("Doc"))).await.unwrap();
    assert_eq!(out.markdown, "# Doc\n\nHello\n\n<!-- pagebreak -->\n\nA\nB");
}

#[tokio::test]
async fn unusable_responses_are_fatal() {
    for raw in [
        json!({"status": "ok"}),
        json!({"pages": "not an array"}),
        json!({"pages": 17}),
    ] {
        let err = convert(&raw, &builder_only(None)).await.unwrap_err();
        assert!(
            err.to_string().contains("pages"),
            "error should name the missing page sequence: {err}"
        );
    }
}

#[tokio::test]
async fn image_embeds_are_stripped_from_output() {
    let raw = json!({"pages": [
        {"markdown": "Intro ![scan](data:image/jpeg;base64,AAAA) outro"}
    ]});
    let out = convert(&raw, &builder_only(None)).await.unwrap();
    assert!(!out.markdown.contains("!["));
    assert!(out.markdown.contains("Intro"));
    assert!(out.markdown.contains("outro"));
}

#[tokio::test]
async fn files_written_atomically_with_both_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("artifacts").join("scan");
    let raw = json!({"pages": [{"markdown": "# Report\n\nBody"}]});

    let out = convert_to_files(&raw, &builder_only(None), &base)
        .await
        .unwrap();

    let md = std::fs::read_to_string(base.with_extension("md")).unwrap();
    assert_eq!(md, out.markdown);
    let docx = std::fs::read(base.with_extension("docx")).unwrap();
    assert_eq!(docx, out.docx);
}

#[tokio::test]
async fn conversion_is_deterministic() {
    let raw = json!({"pages": [
        {"markdown": "stable"},
        {"blocks": [{"rows": [["a", "b"], ["c", "d"]]}]},
    ]});
    let config = builder_only(Some("Same"));
    let first = convert(&raw, &config).await.unwrap();
    let second = convert(&raw, &config).await.unwrap();
    assert_eq!(first.markdown, second.markdown);
}
