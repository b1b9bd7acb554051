use crate::types::{AnalysisResult, NicheAnalysis};

const BRAND_COLOR: &str = "#00CC6A";

/// Accent color for an app's developer classification. The reasoning service
/// writes these strings, so anything unrecognized gets the brand color
/// instead of breaking the layout.
fn classification_color(dev_type: &str) -> &'static str {
    match dev_type {
        "indie" => "#27AE60",
        "small_studio" => "#3498DB",
        "publisher" => "#9B59B6",
        _ => BRAND_COLOR,
    }
}

fn score_color(score: u8) -> &'static str {
    match score {
        80.. => "#00CC6A",
        60..=79 => "#F39C12",
        40..=59 => "#FF9F43",
        _ => "#E74C3C",
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) / 10;
    let empty = 10 - filled;
    let color = score_color(percent);
    format!(
        "<span style=\"font-family:monospace;white-space:nowrap;font-size:10px;letter-spacing:-1px;\">\
         <span style=\"color:{color};\">{}</span>\
         <span style=\"color:#e0e0e0;\" class=\"dm-text-muted-dark\">{}</span> \
         <span style=\"font-family:Helvetica,Arial,sans-serif;font-size:11px;color:#888;font-weight:400;letter-spacing:0;\" class=\"dm-text-muted\">{percent}%</span>\
         </span>",
        "\u{25AE}".repeat(filled),
        "\u{25AE}".repeat(empty),
    )
}

/// Split prose on sentence boundaries and rejoin with double line breaks.
fn to_line_breaks(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= 1 {
        return text.to_string();
    }
    sentences.join("<br><br>")
}

fn to_bullet_points(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= 1 {
        return format!(
            "<p style=\"margin:0;color:#333;font-size:15px;line-height:1.6;\" class=\"dm-text-body\">{text}</p>"
        );
    }

    let mut html = String::from(
        "<ul style=\"margin:0;padding-left:18px;color:#333;font-size:15px;line-height:1.7;\" class=\"dm-text-body\">",
    );
    for sentence in sentences {
        html.push_str(&format!("<li style=\"margin-bottom:8px;\">{sentence}</li>"));
    }
    html.push_str("</ul>");
    html
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split(". ")
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            let mut sentence = s.trim().to_string();
            if !sentence.ends_with('.') {
                sentence.push('.');
            }
            sentence
        })
        .collect()
}

const CSS_STYLES: &str = r#"
  <style>
    :root { color-scheme: light dark; supported-color-schemes: light dark; }
    body { margin: 0; padding: 0; -webkit-text-size-adjust: 100%; background-color: #ffffff; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; }

    @media only screen and (max-width: 480px) {
      .container { padding: 16px !important; width: 100% !important; }
    }

    @media (prefers-color-scheme: dark) {
      body, .bg-body { background-color: #000000 !important; color: #e0e0e0 !important; }
      .container { background-color: #000000 !important; }
      .dm-text-white { color: #ffffff !important; }
      .dm-text-body { color: #d0d0d0 !important; }
      .dm-text-muted { color: #888888 !important; }
      .dm-text-muted-dark { color: #444444 !important; }
      .dm-bg-summary { border-left-color: #00CC6A !important; background-color: rgba(0,204,106,0.05) !important; }
      .dm-action-box { background-color: #1a1a1a !important; border: 1px solid #333 !important; }
      .dm-card { background-color: #111 !important; }
    }
  </style>
"#;

/// Render the validated analysis into a self-contained HTML document.
///
/// Pure function, no external calls, no validation: data arriving here is
/// assumed schema-valid. Unknown category names fall back to the brand accent
/// color instead of failing.
pub fn render_newsletter(analysis: &AnalysisResult) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    html.push_str("<meta name=\"color-scheme\" content=\"light dark\"><meta name=\"supported-color-schemes\" content=\"light dark\">");
    html.push_str(CSS_STYLES);
    html.push_str("</head><body class=\"bg-body\"><div class=\"container\">");

    // Header
    html.push_str("<div style=\"padding-bottom:24px; text-align:center;\">");
    html.push_str(&format!(
        "<div style=\"font-size:11px;font-weight:700;color:{BRAND_COLOR};text-transform:uppercase;letter-spacing:2px;margin-bottom:16px;\">Niches Hunter</div>"
    ));
    html.push_str(&format!(
        "<h1 style=\"font-size:24px;font-weight:800;color:#111;margin:0 0 8px 0;letter-spacing:-0.5px;line-height:1.3;\" class=\"dm-text-white\">{}</h1>",
        analysis.title
    ));
    html.push_str(&format!(
        "<div style=\"font-size:14px;color:#888;\" class=\"dm-text-muted\">{} \u{2022} Daily Intel</div>",
        analysis.date
    ));
    html.push_str("</div>");

    // Hook
    html.push_str(&format!(
        "<div style=\"margin-bottom:32px;padding:16px 20px;border-left:3px solid {BRAND_COLOR};background:rgba(0,204,106,0.05);\" class=\"dm-bg-summary\">\
         <p style=\"margin:0;font-size:16px;color:#333;line-height:1.6;font-weight:500;\" class=\"dm-text-body\">{}</p></div>",
        analysis.hook
    ));

    for (index, niche) in analysis.niches.iter().enumerate() {
        html.push_str(&render_niche(index, niche));
    }

    // Action box
    html.push_str(&format!(
        "<div style=\"margin-bottom:32px;padding:20px;background:#f5f5f5;border-radius:8px;\" class=\"dm-action-box\">\
         <div style=\"font-size:11px;font-weight:700;color:{BRAND_COLOR};text-transform:uppercase;letter-spacing:1px;margin-bottom:8px;\">Your Move</div>\
         <p style=\"margin:0;font-size:15px;color:#111;line-height:1.6;font-weight:600;\" class=\"dm-text-white\">{}</p></div>",
        analysis.action
    ));

    // Footer
    html.push_str(&format!(
        "<div style=\"padding-top:24px;border-top:1px solid #eee;text-align:center;font-size:12px;color:#888;\" class=\"dm-text-muted\">\
         Niches Hunter \u{2022} {} \u{2022} You receive this because you subscribed.</div>",
        analysis.date
    ));

    html.push_str("</div></body></html>");
    html
}

fn render_niche(index: usize, niche: &NicheAnalysis) -> String {
    let accent = score_color(niche.potential);
    let mut html = String::new();

    html.push_str(&format!(
        "<div style=\"margin-bottom:32px;padding:20px;background:#fafafa;border-radius:8px;border-left:4px solid {accent};\" class=\"dm-card\">"
    ));
    html.push_str(&format!(
        "<h3 style=\"font-size:18px;margin:0 0 4px 0;color:#111;font-weight:700;\" class=\"dm-text-white\">{} Niche #{}: {}</h3>",
        niche.emoji,
        index + 1,
        niche.name
    ));
    html.push_str(&format!(
        "<div style=\"font-size:12px;color:#888;margin-bottom:12px;\" class=\"dm-text-muted\">{} apps spotted in this cluster today</div>",
        niche.cluster_size
    ));
    html.push_str(&format!(
        "<div style=\"margin-bottom:14px;font-size:12px;color:#666;\" class=\"dm-text-muted\">\
         <span style=\"margin-right:20px;\">Competition: {}</span>\
         <span>Potential: {}</span></div>",
        progress_bar(niche.competition),
        progress_bar(niche.potential)
    ));
    html.push_str(&format!(
        "<p style=\"margin:0 0 12px 0;font-size:15px;color:#333;line-height:1.6;\" class=\"dm-text-body\">{}</p>",
        niche.intro
    ));
    html.push_str(&format!(
        "<div style=\"margin-bottom:12px;\"><div style=\"font-size:12px;font-weight:700;color:#111;text-transform:uppercase;letter-spacing:1px;margin-bottom:6px;\" class=\"dm-text-white\">The Opportunity</div>{}</div>",
        to_bullet_points(&niche.why_hot)
    ));
    html.push_str(&format!(
        "<div style=\"margin-bottom:16px;\"><div style=\"font-size:12px;font-weight:700;color:#111;text-transform:uppercase;letter-spacing:1px;margin-bottom:6px;\" class=\"dm-text-white\">The Gap</div>{}</div>",
        to_bullet_points(&niche.gap)
    ));

    for app in &niche.apps {
        let app_accent = classification_color(&app.dev_type);
        html.push_str(&format!(
            "<div style=\"margin-bottom:20px;padding-left:16px;border-left:3px solid {app_accent};\">\
             <div style=\"margin-bottom:4px;\">\
             <span style=\"font-size:16px;font-weight:700;color:#111;\" class=\"dm-text-white\">{}</span>\
             <span style=\"font-size:13px;color:#888;margin-left:8px;\" class=\"dm-text-muted\">#{} {} {}</span>\
             </div>\
             <div style=\"font-size:12px;color:{app_accent};margin-bottom:8px;font-weight:500;\">{}</div>\
             <p style=\"margin:0;font-size:14px;color:#333;line-height:1.6;\" class=\"dm-text-body\">{}</p>\
             </div>",
            app.name,
            app.rank,
            app.flag,
            app.country,
            app.dev_type.replace('_', " "),
            to_line_breaks(&app.insight)
        ));
    }

    html.push_str("</div>");
    html
}
