//! Control panel page - a single HTML form over the config plus the
//! current watch set, mirroring what the daemon is doing right now.

use std::path::PathBuf;

use treesync_core::Config;

/// Renders the control panel for `GET /`.
pub fn render(config: &Config, watched: &[PathBuf]) -> String {
    let watched_list = if watched.is_empty() {
        "<li><em>nothing watched</em></li>".to_string()
    } else {
        watched
            .iter()
            .map(|p| format!("<li><code>{}</code></li>", escape(&p.display().to_string())))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>treesync</title></head>
<body>
<h2>Peer configuration</h2>
<form action="/config" method="post">
  <label>Remote host:
    <input type="text" name="targetHost" value="{host}">
  </label><br>
  <label>Remote port:
    <input type="number" name="targetPort" value="{port}">
  </label><br>
  <label>Listen port:
    <input type="number" name="listen" value="{listen}">
  </label><br>
  <label>Sync directory:
    <input type="text" name="targetDir" value="{dir}">
  </label><br>
  <label>Ignored (comma separated):
    <input type="text" name="ignored" value="{ignored}">
  </label><br>
  <input type="submit" value="Save">
</form>
<h2>Operations</h2>
<p>
  <a href="/start">Start watching</a> |
  <a href="/refresh">Refresh watches</a> |
  <button onclick="syncLocal()">Sync local to remote</button>
</p>
<div id="result"></div>
<h2>Watched directories ({count})</h2>
<ul>
{watched_list}
</ul>
<script>
function syncLocal() {{
  fetch("/sync?action=remote", {{ method: "put" }})
    .then(res => res.json())
    .then(msg => {{ document.getElementById("result").innerText = msg["message"]; }})
    .catch(err => {{ document.getElementById("result").innerText = err; }});
}}
</script>
</body>
</html>
"#,
        host = escape(&config.remote.host),
        port = config.remote.port,
        listen = config.server.listen,
        dir = escape(&config.sync.target_dir.display().to_string()),
        ignored = escape(&config.sync.ignored.join(",")),
        count = watched.len(),
        watched_list = watched_list,
    )
}

/// Minimal HTML escaping for attribute and text positions.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
