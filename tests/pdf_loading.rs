mod support;

use docqa::processing::{
    LoadError,
    chunking::Chunker,
    loader::{extract_pages, load_pdf},
};

#[tokio::test]
async fn loads_generated_pdf_page_by_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lorem.pdf");
    std::fs::write(&path, support::pdf_with_pages(&support::lorem_pages())).expect("write pdf");

    let pages = load_pdf(&path).await.expect("pages");

    assert_eq!(pages.len(), 3);
    assert_eq!(
        pages.iter().map(|page| page.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(pages[0].text.contains("Lorem"), "{:?}", pages[0].text);
    assert!(pages[1].text.contains("veniam"), "{:?}", pages[1].text);
    assert!(pages[2].text.contains("excepteur"), "{:?}", pages[2].text);
}

#[test]
fn chunks_keep_page_order() {
    let pages = extract_pages(&support::pdf_with_pages(&support::lorem_pages())).expect("pages");

    let chunks: Vec<_> = Chunker::default().chunks(&pages).collect();

    assert_eq!(chunks.len(), 3);
    assert_eq!(
        chunks.iter().map(|chunk| chunk.page).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        chunks.iter().map(|chunk| chunk.sequence).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn long_pages_split_into_bounded_chunks() {
    let sentence = "Lorem ipsum dolor sit amet consectetur adipiscing elit.";
    let page: Vec<String> = (0..40).map(|_| sentence.to_string()).collect();
    let pages = extract_pages(&support::pdf_with_pages(&[page])).expect("pages");

    let chunker = Chunker::new(300, 60).expect("chunker");
    let chunks: Vec<_> = chunker.chunks(&pages).collect();

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|chunk| chunk.text.chars().count() <= 300));
    assert!(chunks.iter().all(|chunk| chunk.page == 1));
}

#[test]
fn text_files_are_not_pdfs() {
    let error = extract_pages(b"just some notes").unwrap_err();
    assert!(matches!(error, LoadError::NotPdf));
}
