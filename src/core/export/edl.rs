//! CMX3600 EDL writer.
//!
//! One event per best take: the edit line, the source clip name, and a
//! comment carrying the take's overall score and transcription. Record
//! timecodes accumulate source frame counts, so an event is always
//! exactly as long on the record side as on the source side.

use crate::core::session::Session;
use crate::core::timecode::{frames, timecode};

/// Maximum transcription length carried in the comment line.
const COMMENT_TEXT_CHARS: usize = 60;

fn comment_text(text: &str) -> String {
    text.chars().take(COMMENT_TEXT_CHARS).collect()
}

/// Render the session's edit decision as a CMX3600 EDL document.
pub fn render_edl(session: &Session) -> String {
    let fps = session.fps;
    // Audio-only sources cut audio channels only; video sources cut both.
    let channel = if session.source.is_video {
        "AA/V"
    } else {
        "AA  "
    };

    let mut edl = String::new();
    edl.push_str("TITLE: Silence Cutter Edit\n");
    edl.push_str("FCM: NON-DROP FRAME\n\n");

    let mut record_frame = 0_i64;
    for (event, take) in session.edit.best_takes.iter().enumerate() {
        let src_in = frames(take.source_start, fps);
        let src_out = frames(take.source_end, fps);
        let length = src_out - src_in;
        let rec_in = record_frame;
        let rec_out = record_frame + length;
        record_frame = rec_out;

        edl.push_str(&format!(
            "{:03}  AX       {}  C        {} {} {} {}\n",
            event + 1,
            channel,
            timecode(src_in, fps),
            timecode(src_out, fps),
            timecode(rec_in, fps),
            timecode(rec_out, fps),
        ));
        edl.push_str(&format!(
            "* FROM CLIP NAME: {}\n",
            session.source.file_name
        ));

        let score = session
            .segments
            .get(take.segment_index)
            .and_then(|seg| seg.ai_scores.as_ref())
            .map(|scores| format!("{:.1}", scores.overall))
            .unwrap_or_else(|| "N/A".to_string());
        let text = session
            .segments
            .get(take.segment_index)
            .map(|seg| comment_text(seg.text()))
            .unwrap_or_default();
        edl.push_str(&format!(
            "* COMMENT: Take {} | Score: {} | {}\n\n",
            take.segment_index, score, text
        ));
    }

    edl
}
