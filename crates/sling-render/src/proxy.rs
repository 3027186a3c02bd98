use sling_core::{DeploymentOptions, OptionKey};

use crate::RenderError;

/// Document root the static variant copies build output into.
pub const DOCUMENT_ROOT: &str = "/var/www/html";

/// Render an nginx virtual host serving the static build from [`DOCUMENT_ROOT`].
pub fn render(options: &DeploymentOptions) -> Result<String, RenderError> {
    let port = options.require(OptionKey::HostPort)?;
    let server_name = options.require(OptionKey::ServerName)?;

    Ok(format!(
        r#"server {{
    listen {port};
    listen [::]:{port};

    root {DOCUMENT_ROOT};
    index index.html index.htm;

    server_name {server_name};

    location / {{
        try_files $uri $uri/ /index.html;
    }}
}}
"#
    ))
}
