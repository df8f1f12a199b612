use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

/// Stylesheet that hardcodes typography.
pub const STYLED_CSS: &str = "body { font-family: \"Georgia\", serif; line-height: 1.5; }";

/// Stylesheet that leaves typography to the reader.
pub const CLEAN_CSS: &str = "p { margin: 0 0 1em 0; text-indent: 1em; }";

/// Writes a minimal EPUB with the given metadata and optional stylesheet.
pub fn write_epub(path: &Path, title: &str, author: &str, css: Option<&str>) {
    let file = File::create(path).expect("create epub");
    let mut zip = zip::ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("mimetype", stored).expect("mimetype");
    zip.write_all(b"application/epub+zip").expect("mimetype body");

    zip.start_file("META-INF/container.xml", SimpleFileOptions::default())
        .expect("container");
    zip.write_all(
        br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    )
    .expect("container body");

    zip.start_file("OEBPS/content.opf", SimpleFileOptions::default())
        .expect("opf");
    let opf = format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:identifier id="bookid">urn:uuid:6f1c0a52-3b5e-4e0e-9d63-1f0d3b7a2c11</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator opf:role="aut">{author}</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="chapter1" href="chapter1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="chapter1"/>
  </spine>
</package>"#
    );
    zip.write_all(opf.as_bytes()).expect("opf body");

    zip.start_file("OEBPS/chapter1.xhtml", SimpleFileOptions::default())
        .expect("chapter");
    zip.write_all(b"<html><body><p>Once upon a time.</p></body></html>")
        .expect("chapter body");

    if let Some(css) = css {
        zip.start_file("OEBPS/styles/main.css", SimpleFileOptions::default())
            .expect("css");
        zip.write_all(css.as_bytes()).expect("css body");
    }

    zip.finish().expect("finish epub");
}

/// Builds EPUB bytes in memory, for serving from a mock server.
pub fn epub_bytes(title: &str, author: &str, css: Option<&str>) -> Vec<u8> {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("book.epub");
    write_epub(&path, title, author, css);
    std::fs::read(&path).expect("read epub")
}
