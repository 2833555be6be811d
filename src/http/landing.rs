//! Landing page served at `/`.
//!
//! The page only builds a proxied URL client-side: it loads
//! `<path>?<query>&<base_param>=<scheme>://<host>/` into the frame, and every
//! later request from the frame is resolved through the session cookie.

use axum::response::Html;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>funky-proxy</title>
    <style>
        body { margin: 0; font-family: sans-serif; }
        #bar { padding: 8px; }
        #view { border: 0; width: 100%; height: calc(100vh - 48px); }
    </style>
</head>
<body>
<div id="bar">
    URL: <input id="target" type="text" size="60" />
    <input type="button" value="Fetch" onclick="fetchIt()" />
</div>
<iframe id="view"></iframe>
<script>
    function fetchIt() {
        var raw = document.getElementById('target').value.trim();
        if (!/^https?:\/\//i.test(raw)) {
            raw = 'http://' + raw;
        }

        var target;
        try {
            target = new URL(raw);
        } catch (e) {
            alert('Not a valid URL: ' + raw);
            return;
        }

        var base = target.protocol + '//' + target.host + '/';
        var params = new URLSearchParams(target.search);
        params.append('{{BASE_PARAM}}', base);

        document.getElementById('view').src = target.pathname + '?' + params.toString();
    }
</script>
</body>
</html>
"#;

/// Render the landing page for the configured base parameter name.
pub fn landing_page(base_param: &str) -> Html<String> {
    Html(PAGE.replace("{{BASE_PARAM}}", base_param))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_uses_base_param() {
        let Html(page) = landing_page("__base");
        assert!(page.contains("params.append('__base', base);"));
        assert!(page.contains("<iframe id=\"view\"></iframe>"));
        assert!(!page.contains("{{BASE_PARAM}}"));
    }
}
