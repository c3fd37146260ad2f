//! Standalone HTML document used for exports.

const DOCUMENT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Exported Markdown Document</title>
<style>
body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  line-height: 1.6;
  max-width: 800px;
  margin: 40px auto;
  padding: 0 20px;
  color: #333;
  background: #fff;
}
pre { background: #f5f5f5; color: #333; }
@media (prefers-color-scheme: dark) {
  body { color: #e0e0e0; background: #121212; }
  pre { background: #1e1e1e; color: #e0e0e0; }
  code { background: #2a2a2a; }
  blockquote { color: #aaa; }
}
h1 { font-size: 2em; margin: 0.67em 0; }
h2 { font-size: 1.5em; margin: 0.83em 0; }
h3 { font-size: 1.17em; margin: 1em 0; }
p { margin: 1em 0; }
ul, ol { padding-left: 2em; margin: 1em 0; }
blockquote {
  border-left: 4px solid #ccc;
  padding-left: 1em;
  margin: 1em 0;
  color: #555;
}
a { color: #007bff; text-decoration: none; }
a:hover { text-decoration: underline; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #ccc; padding: 0.3em 0.8em; }
.code-block-wrapper { position: relative; margin: 1em 0; }
.code-header {
  display: flex;
  justify-content: space-between;
  align-items: center;
  background: #2d2d2d;
  padding: 0.5em 1em;
  border-top-left-radius: 6px;
  border-top-right-radius: 6px;
  font-size: 0.85em;
  color: #ccc;
}
.code-header .lang { font-weight: bold; text-transform: uppercase; }
.copy-btn {
  background: #444;
  color: white;
  border: none;
  padding: 0.25em 0.5em;
  border-radius: 3px;
  cursor: pointer;
  font-size: 0.85em;
}
.copy-btn:hover { background: #555; }
.code-block-wrapper pre { margin-top: 0; border-top-left-radius: 0; border-top-right-radius: 0; }
pre { padding: 16px; border-radius: 6px; overflow-x: auto; }
code { background: #f0f0f0; padding: 0.2em 0.4em; border-radius: 3px; font-family: monospace; }
pre code { background: transparent; padding: 0; }
</style>
</head>
<body>
"#;

const DOCUMENT_TAIL: &str = r"
<script>
document.addEventListener('click', function (event) {
  var button = event.target.closest('.copy-btn');
  if (!button) { return; }
  var bytes = Uint8Array.from(atob(button.dataset.code), function (c) { return c.charCodeAt(0); });
  navigator.clipboard.writeText(new TextDecoder().decode(bytes)).then(function () {
    button.textContent = 'Copied!';
    setTimeout(function () { button.textContent = 'Copy'; }, 1500);
  });
});
</script>
</body>
</html>
";

/// Wrap rendered body HTML in the export page.
pub fn standalone_document(body_html: &str) -> String {
    let mut out =
        String::with_capacity(DOCUMENT_HEAD.len() + body_html.len() + DOCUMENT_TAIL.len());
    out.push_str(DOCUMENT_HEAD);
    out.push_str(body_html);
    out.push_str(DOCUMENT_TAIL);
    out
}
