//! HTML page for one live drawing.

/// Client hints asked for so the image stream can match the viewport.
pub const ACCEPT_CH: &str =
    "Width, Sec-CH-Width, Viewport-Width, Sec-CH-Viewport-Width, DPR, Sec-CH-DPR";

/// Render the live page.
///
/// Clicking the image submits its pixel coordinates together with the
/// session id to the click endpoint. Both ids must already be URL- and
/// HTML-safe.
pub fn live_page(drawing_id: &str, session_id: &str, default_width: u32) -> String {
    format!(
        r##"<!DOCTYPE html>
<meta charset="utf-8">
<title>LiveDraw</title>
<link rel="stylesheet" href="/style.css">
<form class="edit" action="/live/{id}.click">
<input name="session" value="{session}" type="hidden">
<input type="image" src="/live/{id}.png?session={session}" alt="Live drawing" draggable="false">
<fieldset>
<legend>Circle tool</legend>
<input name="color" type="color" value="#ff0000">
<input name="radius" type="range" min="1" max="100" value="20">
</fieldset>
</form>
<form class="save" action="/download/{id}.png">
Image width: <input name="width" type="number" min="1" value="{width}">
<input type="submit" value="Save">
</form>
"##,
        id = drawing_id,
        session = session_id,
        width = default_width,
    )
}
