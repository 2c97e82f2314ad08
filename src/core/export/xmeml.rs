//! FCP7 XMEML v5 sequence writer.
//!
//! One clipitem per best take, on an optional video track (video-like
//! sources only) and an audio track. Source in/out points come from the
//! frame primitive in `timecode`; record positions accumulate frame
//! counts and are never re-rounded. Every clipitem's `<duration>` is the
//! total sequence frame count, a quirk kept for compatibility with
//! editors that import the legacy format.

use crate::core::export::escape_xml;
use crate::core::session::Session;
use crate::core::timecode::frames;

const SAMPLE_RATE: u32 = 48_000;
const SAMPLE_DEPTH: u32 = 16;
const VIDEO_WIDTH: u32 = 1920;
const VIDEO_HEIGHT: u32 = 1080;

struct ClipWindow {
    in_frame: i64,
    out_frame: i64,
    start_frame: i64,
    end_frame: i64,
    segment_index: usize,
}

/// Frame windows for all takes plus the total sequence length.
fn clip_windows(session: &Session) -> (Vec<ClipWindow>, i64) {
    let fps = session.fps;
    let mut windows = Vec::new();
    let mut running = 0_i64;
    for take in &session.edit.best_takes {
        let in_frame = frames(take.source_start, fps);
        let out_frame = frames(take.source_end, fps);
        let length = out_frame - in_frame;
        windows.push(ClipWindow {
            in_frame,
            out_frame,
            start_frame: running,
            end_frame: running + length,
            segment_index: take.segment_index,
        });
        running += length;
    }
    (windows, running)
}

fn push_rate(xml: &mut String, indent: &str, fps: u32) {
    xml.push_str(&format!(
        "{indent}<rate>\n{indent}  <timebase>{fps}</timebase>\n{indent}  <ntsc>FALSE</ntsc>\n{indent}</rate>\n"
    ));
}

fn push_file(xml: &mut String, indent: &str, session: &Session, first: bool) {
    if !first {
        xml.push_str(&format!("{indent}<file id=\"file-1\"/>\n"));
        return;
    }
    let name = escape_xml(&session.source.file_name);
    let pathurl = escape_xml(&format!(
        "file://localhost/{}",
        session.source.path.to_string_lossy().trim_start_matches('/')
    ));
    xml.push_str(&format!("{indent}<file id=\"file-1\">\n"));
    xml.push_str(&format!("{indent}  <name>{name}</name>\n"));
    xml.push_str(&format!("{indent}  <pathurl>{pathurl}</pathurl>\n"));
    push_rate(xml, &format!("{indent}  "), session.fps);
    xml.push_str(&format!("{indent}  <media>\n"));
    if session.source.is_video {
        xml.push_str(&format!(
            "{indent}    <video>\n{indent}      <samplecharacteristics>\n{indent}        <width>{VIDEO_WIDTH}</width>\n{indent}        <height>{VIDEO_HEIGHT}</height>\n{indent}      </samplecharacteristics>\n{indent}    </video>\n"
        ));
    }
    xml.push_str(&format!(
        "{indent}    <audio>\n{indent}      <samplecharacteristics>\n{indent}        <depth>{SAMPLE_DEPTH}</depth>\n{indent}        <samplerate>{SAMPLE_RATE}</samplerate>\n{indent}      </samplecharacteristics>\n{indent}    </audio>\n"
    ));
    xml.push_str(&format!("{indent}  </media>\n"));
    xml.push_str(&format!("{indent}</file>\n"));
}

fn push_track(
    xml: &mut String,
    session: &Session,
    windows: &[ClipWindow],
    total_frames: i64,
    clip_id_offset: usize,
    file_declared: &mut bool,
) {
    xml.push_str("        <track>\n");
    for (i, window) in windows.iter().enumerate() {
        let clip_id = clip_id_offset + i + 1;
        xml.push_str(&format!(
            "          <clipitem id=\"clipitem-{clip_id}\">\n"
        ));
        xml.push_str(&format!(
            "            <name>Take {}</name>\n",
            window.segment_index
        ));
        xml.push_str(&format!(
            "            <duration>{total_frames}</duration>\n"
        ));
        push_rate(xml, "            ", session.fps);
        xml.push_str(&format!("            <in>{}</in>\n", window.in_frame));
        xml.push_str(&format!("            <out>{}</out>\n", window.out_frame));
        xml.push_str(&format!(
            "            <start>{}</start>\n",
            window.start_frame
        ));
        xml.push_str(&format!("            <end>{}</end>\n", window.end_frame));
        push_file(xml, "            ", session, !*file_declared);
        *file_declared = true;
        xml.push_str("          </clipitem>\n");
    }
    xml.push_str("        </track>\n");
}

/// Render the session's edit decision as an XMEML v5 document.
pub fn render_xmeml(session: &Session) -> String {
    let (windows, total_frames) = clip_windows(session);
    let sequence_name = escape_xml(&format!("{}_edit", session.source.base_name));

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE xmeml>\n");
    xml.push_str("<xmeml version=\"5\">\n");
    xml.push_str("  <sequence id=\"sequence-1\">\n");
    xml.push_str(&format!("    <name>{sequence_name}</name>\n"));
    xml.push_str(&format!("    <duration>{total_frames}</duration>\n"));
    push_rate(&mut xml, "    ", session.fps);
    xml.push_str("    <media>\n");

    let mut file_declared = false;
    if session.source.is_video {
        xml.push_str("      <video>\n");
        xml.push_str(&format!(
            "        <format>\n          <samplecharacteristics>\n            <width>{VIDEO_WIDTH}</width>\n            <height>{VIDEO_HEIGHT}</height>\n          </samplecharacteristics>\n        </format>\n"
        ));
        push_track(&mut xml, session, &windows, total_frames, 0, &mut file_declared);
        xml.push_str("      </video>\n");
    }

    xml.push_str("      <audio>\n");
    let audio_offset = if session.source.is_video {
        windows.len()
    } else {
        0
    };
    push_track(
        &mut xml,
        session,
        &windows,
        total_frames,
        audio_offset,
        &mut file_declared,
    );
    xml.push_str("      </audio>\n");

    xml.push_str("    </media>\n");
    xml.push_str("  </sequence>\n");
    xml.push_str("</xmeml>\n");
    xml
}
