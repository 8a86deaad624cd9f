use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const NOTICE_XSL: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:template match="/">
    <html>
      <head><title>n</title></head>
      <body><pre class="oshirase"><xsl:value-of select="notice"/></pre></body>
    </html>
  </xsl:template>
</xsl:stylesheet>
"#;

fn write_pair(dir: &Path, stem: &str, body: &str) {
    fs::write(
        dir.join(format!("{stem}.xml")),
        format!("<?xml-stylesheet href=\"{stem}.xsl\"?><notice>{body}</notice>"),
    )
    .unwrap();
    fs::write(dir.join(format!("{stem}.xsl")), NOTICE_XSL).unwrap();
}

fn converter() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xml2html"))
}

fn viewer() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xml2htmlviewer"))
}

#[test]
fn no_arguments_is_fatal() {
    converter().assert().failure().stderr(contains("Usage"));
    viewer().assert().failure().stderr(contains("Usage"));
}

#[test]
fn converts_a_single_xml_file() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "notice", "Hello");

    converter()
        .arg(dir.path().join("notice.xml"))
        .assert()
        .success()
        .stderr(contains("wrote"));

    let html = fs::read_to_string(dir.path().join("notice.html")).unwrap();
    assert!(html.contains(r#"<div class="oshirase">Hello</div>"#));
}

#[test]
fn bad_inputs_are_skipped_and_the_run_continues() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "good", "ok");
    fs::write(dir.path().join("plain.txt"), "not xml").unwrap();

    converter()
        .arg(dir.path().join("missing.xml"))
        .arg(dir.path().join("plain.txt"))
        .arg(dir.path().join("good.xml"))
        .assert()
        .success()
        .stderr(contains("skipping"));

    assert!(dir.path().join("good.html").exists());
}

#[test]
fn unresolvable_stylesheet_is_logged_not_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("orphan.xml"),
        "<?xml-stylesheet href=\"gone.xsl\"?><notice/>",
    )
    .unwrap();

    converter()
        .arg(dir.path().join("orphan.xml"))
        .assert()
        .success()
        .stderr(contains("no resolvable stylesheet reference"));
    assert!(!dir.path().join("orphan.html").exists());
}

#[test]
fn archive_members_land_beside_the_archive() {
    let dir = TempDir::new().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    let file = File::create(&zip_path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for stem in ["one", "two"] {
        zip.start_file(format!("{stem}.xml"), opt).unwrap();
        zip.write_all(
            format!("<?xml-stylesheet href=\"{stem}.xsl\"?><notice>{stem}</notice>").as_bytes(),
        )
        .unwrap();
        zip.start_file(format!("{stem}.xsl"), opt).unwrap();
        zip.write_all(NOTICE_XSL.as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    converter().arg(&zip_path).assert().success();

    assert!(dir.path().join("one.html").exists());
    assert!(dir.path().join("two.html").exists());
}

#[test]
fn empty_archive_is_an_informational_no_op() {
    let dir = TempDir::new().unwrap();
    let zip_path = dir.path().join("empty.zip");
    let file = File::create(&zip_path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("readme.txt", opt).unwrap();
    zip.write_all(b"nothing to convert").unwrap();
    zip.finish().unwrap();

    converter()
        .arg(&zip_path)
        .assert()
        .success()
        .stderr(contains("no XML files"));
}

// Closing the picker without a selection (EOF on stdin here) must leave the
// viewer running normally and open nothing.
#[test]
fn viewer_cancelled_picker_opens_nothing() {
    let dir = TempDir::new().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    let file = File::create(&zip_path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("a.xml", opt).unwrap();
    zip.write_all(b"<?xml-stylesheet href=\"a.xsl\"?><notice>x</notice>")
        .unwrap();
    zip.start_file("a.xsl", opt).unwrap();
    zip.write_all(NOTICE_XSL.as_bytes()).unwrap();
    zip.finish().unwrap();

    viewer()
        .arg(&zip_path)
        .assert()
        .success()
        .stdout(contains("[1] a.xml"))
        .stderr(contains("selection cancelled"));
}

#[test]
fn viewer_reports_empty_archives() {
    let dir = TempDir::new().unwrap();
    let zip_path = dir.path().join("empty.zip");
    let file = File::create(&zip_path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("readme.txt", opt).unwrap();
    zip.write_all(b"no xml").unwrap();
    zip.finish().unwrap();

    viewer()
        .arg(&zip_path)
        .assert()
        .success()
        .stderr(contains("no XML files"));
}
