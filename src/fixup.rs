/// Wrapping override for the notice block; the stylesheet wraps it in a
/// `<pre>` whose default whitespace handling breaks long lines in browsers.
const NOTICE_STYLE: &str = "\n<style>\n.oshirase {\n    white-space: normal !important;\n    word-break: break-all !important;\n}\n</style>\n";

/// Post-process transformed HTML.
///
/// Swaps the notice `<pre>` wrapper for a `<div>` and injects the wrapping
/// override immediately before the first `</head>`. The `</pre>` rewrite is
/// global and unconditional, matching the stylesheets this tool is pointed
/// at, which emit a single notice block. No `</head>`, no injection.
pub fn fix_markup(html: &str) -> String {
    let mut out = html.replace(r#"<pre class="oshirase">"#, r#"<div class="oshirase">"#);
    out = out.replace("</pre>", "</div>");
    if let Some(pos) = out.find("</head>") {
        out.insert_str(pos, NOTICE_STYLE);
    }
    out
}
