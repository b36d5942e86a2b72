//! HTML templates for the share-preview pages.
//!
//! The output is consumed twice: by social-network crawlers reading the meta
//! tags, and by humans who follow the link and get a minimal inline player.
//! Pages are deterministic functions of their inputs so responses stay
//! cacheable.

pub const AUDIO_PLACEHOLDER_IMAGE: &str =
    "https://via.placeholder.com/640x640/8B5CF6/FFFFFF?text=Voice+Message";
pub const VIDEO_PLACEHOLDER_IMAGE: &str =
    "https://via.placeholder.com/640x360/8B5CF6/FFFFFF?text=Voice+Cast";

/// Escape a value for interpolation into HTML text or attribute context.
pub fn html_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub struct AudioPage<'a> {
    /// Canonical URL of this page, reconstructed from the request.
    pub wrapper_url: &'a str,
    /// Origin to point the frame button and CTA at.
    pub app_origin: &'a str,
    pub audio_url: &'a str,
    pub preview_url: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub username: Option<&'a str>,
}

impl AudioPage<'_> {
    fn title(&self) -> String {
        if let Some(name) = self.display_name {
            format!("Voice message from {}", name)
        } else if let Some(username) = self.username {
            format!("Voice message from @{}", username)
        } else {
            "Voice Message".to_string()
        }
    }

    pub fn render(&self) -> String {
        let title = html_escape(&self.title());
        let wrapper = html_escape(self.wrapper_url);
        let origin = html_escape(self.app_origin);
        let audio = html_escape(self.audio_url);
        let image = html_escape(self.preview_url.unwrap_or(AUDIO_PLACEHOLDER_IMAGE));

        let avatar_block = match self.avatar_url {
            Some(avatar) => format!(
                r#"<img src="{}" alt="Profile" class="profile-image" />"#,
                html_escape(avatar)
            ),
            None => r#"<div class="mic-fallback">&#127908;</div>"#.to_string(),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta property="og:title" content="Voice Message via VoiceCaster" />
    <meta property="og:type" content="website" />
    <meta property="og:description" content="Listen to this voice message created with VoiceCaster" />
    <meta property="og:url" content="{wrapper}" />
    <meta property="og:site_name" content="VoiceCaster" />
    <meta property="og:audio" content="{audio}" />
    <meta property="og:audio:url" content="{audio}" />
    <meta property="og:audio:secure_url" content="{audio}" />
    <meta property="og:audio:type" content="audio/wav" />
    <meta property="og:image" content="{image}" />
    <meta property="og:image:width" content="640" />
    <meta property="og:image:height" content="640" />
    <meta name="twitter:card" content="summary_large_image" />
    <meta name="twitter:title" content="Voice Message via VoiceCaster" />
    <meta name="twitter:description" content="Listen to this voice message created with VoiceCaster" />
    <meta name="twitter:image" content="{image}" />
    <meta property="fc:frame" content="vNext" />
    <meta property="fc:frame:image" content="{image}" />
    <meta property="fc:frame:image:aspect_ratio" content="1:1" />
    <meta property="fc:frame:button:1" content="Play Voice Message" />
    <meta property="fc:frame:button:1:action" content="link" />
    <meta property="fc:frame:button:1:target" content="{audio}" />
    <meta property="fc:frame:button:2" content="Open in App" />
    <meta property="fc:frame:button:2:action" content="launch_frame" />
    <meta property="fc:frame:button:2:target" content="{origin}" />
    <title>{title}</title>
    <style>
      body {{
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
        margin: 0;
        background: linear-gradient(135deg, #a855f7, #9333ea);
        color: white;
        min-height: 100vh;
        display: flex;
        flex-direction: column;
        justify-content: center;
        align-items: center;
      }}
      .voice-card {{
        background: rgba(255, 255, 255, 0.1);
        border-radius: 24px;
        padding: 40px;
        max-width: 400px;
        width: 90%;
        text-align: center;
      }}
      .profile-circle {{
        width: 120px;
        height: 120px;
        border-radius: 50%;
        background: rgba(255, 255, 255, 0.1);
        margin: 0 auto 20px;
        display: flex;
        align-items: center;
        justify-content: center;
        font-size: 48px;
        overflow: hidden;
      }}
      .profile-image {{
        width: 100%;
        height: 100%;
        object-fit: cover;
        border-radius: 50%;
      }}
      audio {{
        width: 100%;
        margin-top: 20px;
      }}
      .cta-button {{
        display: inline-block;
        background: white;
        color: #8B5CF6;
        padding: 15px 30px;
        border-radius: 12px;
        text-decoration: none;
        font-weight: bold;
      }}
    </style>
</head>
<body>
    <div class="voice-card">
        <div class="header-text">{title}</div>
        <div class="profile-circle">{avatar_block}</div>
        <audio controls preload="none" playsinline>
            <source src="{audio}" type="audio/wav">
            <source src="{audio}" type="audio/mpeg">
            <source src="{audio}" type="audio/mp4">
            <source src="{audio}" type="audio/webm">
            Your browser does not support the audio element.
        </audio>
        <a href="{origin}" class="cta-button">Create your own voice message</a>
    </div>
</body>
</html>"#
        )
    }
}

pub struct VideoPage<'a> {
    pub wrapper_url: &'a str,
    pub app_origin: &'a str,
    pub video_url: &'a str,
}

impl VideoPage<'_> {
    pub fn render(&self) -> String {
        let wrapper = html_escape(self.wrapper_url);
        let origin = html_escape(self.app_origin);
        let video = html_escape(self.video_url);
        let image = VIDEO_PLACEHOLDER_IMAGE;

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta property="og:title" content="Voice Cast via VoiceCaster" />
    <meta property="og:type" content="video.other" />
    <meta property="og:description" content="Listen to this voice recording created with VoiceCaster" />
    <meta property="og:url" content="{wrapper}" />
    <meta property="og:site_name" content="VoiceCaster" />
    <meta property="og:video" content="{video}" />
    <meta property="og:video:url" content="{video}" />
    <meta property="og:video:secure_url" content="{video}" />
    <meta property="og:video:type" content="video/webm" />
    <meta property="og:video:width" content="640" />
    <meta property="og:video:height" content="360" />
    <meta property="og:image" content="{image}" />
    <meta property="og:image:width" content="640" />
    <meta property="og:image:height" content="360" />
    <meta name="twitter:card" content="player" />
    <meta name="twitter:title" content="Voice Cast via VoiceCaster" />
    <meta name="twitter:description" content="Listen to this voice recording created with VoiceCaster" />
    <meta name="twitter:image" content="{image}" />
    <meta name="twitter:player" content="{video}" />
    <meta name="twitter:player:width" content="640" />
    <meta name="twitter:player:height" content="360" />
    <title>Voice Cast via VoiceCaster</title>
    <style>
      body {{
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
        margin: 0;
        padding: 50px 20px;
        text-align: center;
        background: linear-gradient(135deg, #8B5CF6, #3B82F6);
        color: white;
        min-height: 100vh;
      }}
      video {{
        max-width: 100%;
        width: 640px;
        border-radius: 12px;
      }}
      .cta-button {{
        display: inline-block;
        background: white;
        color: #8B5CF6;
        padding: 15px 30px;
        border-radius: 12px;
        text-decoration: none;
        font-weight: bold;
      }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Voice Cast</h1>
        <p>Created with VoiceCaster</p>
        <video controls preload="metadata">
            <source src="{video}" type="video/webm">
            <source src="{video}" type="video/mp4">
            Your browser does not support the video tag.
        </video>
        <br>
        <a href="{origin}" class="cta-button">Create your own voice cast</a>
    </div>
</body>
</html>"#
        )
    }
}
