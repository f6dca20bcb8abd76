//! HTML preview generation
//!
//! Writes a small standalone page showing every resolved image, where it came
//! from, and the final montage.

use crate::pipeline::ResolvedImage;
use std::path::Path;

const PREVIEW_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Image Montage Preview</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            margin: 20px;
            background-color: #f0f0f0;
        }
        h1 {
            color: #333;
        }
        .images {
            display: flex;
            flex-wrap: wrap;
            gap: 10px;
            margin-top: 20px;
        }
        .image-container {
            border: 1px solid #ddd;
            padding: 10px;
            background-color: white;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        img {
            max-width: 200px;
            max-height: 200px;
            display: block;
        }
        .montage {
            margin-top: 40px;
            border: 1px solid #ddd;
            padding: 10px;
            background-color: white;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
            max-width: 100%;
        }
        .cache-info {
            font-size: 12px;
            color: #666;
            margin-top: 3px;
        }
        .cached {
            color: green;
        }
        .downloaded {
            color: blue;
        }
    </style>
</head>
<body>
    <h1>Individual Images</h1>
    <div class="images">
"#;

/// Writes the HTML preview to `preview_path`
pub async fn write_preview(
    images: &[ResolvedImage],
    montage_path: &Path,
    preview_path: &Path,
) -> std::io::Result<()> {
    tracing::info!("Generating HTML preview as {}", preview_path.display());
    let html = format_preview(images, montage_path);
    tokio::fs::write(preview_path, html).await?;
    tracing::debug!(
        "[HTML] Preview file created successfully: {}",
        preview_path.display()
    );
    Ok(())
}

/// Formats the preview page
///
/// Images are listed in the order given, numbered from 1.
pub fn format_preview(images: &[ResolvedImage], montage_path: &Path) -> String {
    let mut html = String::from(PREVIEW_HEAD);

    for (i, image) in images.iter().enumerate() {
        let path = escape_html(&image.local_path.display().to_string());
        let status = if image.origin.is_cached() {
            r#"<div class="cache-info cached">✓ From cache</div>"#
        } else {
            r#"<div class="cache-info downloaded">↓ Downloaded</div>"#
        };

        tracing::debug!("[HTML] Adding image {}: {}", i + 1, path);
        html.push_str(&format!(
            r#"        <div class="image-container">
            <img src="{path}" alt="Image {n}">
            <p>Image {n}: {path}</p>
            <p class="cache-info">{source}</p>
            {status}
        </div>
"#,
            path = path,
            n = i + 1,
            source = escape_html(&image.source_url),
            status = status,
        ));
    }

    let montage = escape_html(&montage_path.display().to_string());
    html.push_str(&format!(
        r#"    </div>

    <h1>Montage</h1>
    <div class="montage">
        <img src="{montage}" alt="Montage" style="max-width: 100%;">
    </div>
</body>
</html>
"#,
        montage = montage
    ));

    html
}

/// Escapes text for use in HTML content and double-quoted attributes
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
