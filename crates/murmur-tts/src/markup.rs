//! SSML document builder.

/// Language declared on the `<speak>` root. The multilingual neural voices
/// detect the spoken language themselves, so this only sets the default.
pub const MARKUP_LANGUAGE: &str = "zh-CN";

/// MIME type of the documents produced by [`build_markup`].
pub const MARKUP_CONTENT_TYPE: &str = "application/ssml+xml";

/// Escapes the five XML-significant characters.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders `text` as an SSML document for `voice_id` at `rate`.
///
/// Volume and pitch stay at neutral values. The text and voice name are
/// escaped; the rate is written in its shortest decimal form (`1`, `1.5`).
pub fn build_markup(text: &str, voice_id: &str, rate: f32) -> String {
    let text = escape_markup(text);
    let voice = escape_markup(voice_id);
    format!(
        r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xmlns:mstts="https://www.w3.org/2001/mstts" xml:lang="{MARKUP_LANGUAGE}">
    <voice name="{voice}">
        <mstts:express-as styleDegree="1">
            <prosody volume="0%" rate="{rate}" pitch="0%">
                {text}
            </prosody>
        </mstts:express-as>
    </voice>
</speak>"#
    )
}
