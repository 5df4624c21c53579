/// Codecs whose `a=rtpmap` lines get a bandwidth cap.
pub const BITRATE_CODECS: [&str; 2] = ["VP8", "H264"];

/// Injects `b=AS:<kbps>` and `b=TIAS:<kbps * 1000>` right after every capped
/// codec map line of the video media section.
///
/// The section opens on `m=video` and closes on the next `m=` line of any
/// kind. Line endings of the input are kept as they are.
pub fn apply_max_bitrate(sdp: &str, max_kbps: u32) -> String {
    let eol = if sdp.contains("\r\n") { "\r\n" } else { "\n" };
    let as_line = format!("b=AS:{}", max_kbps);
    let tias_line = format!("b=TIAS:{}", u64::from(max_kbps) * 1000);

    let mut lines: Vec<&str> = Vec::new();
    let mut in_video = false;

    for line in sdp.split(eol) {
        lines.push(line);

        if line.starts_with("m=video") {
            in_video = true;
        } else if line.starts_with("m=") {
            in_video = false;
        }

        if in_video && is_capped_rtpmap(line) {
            lines.push(&as_line);
            lines.push(&tias_line);
        }
    }

    lines.join(eol)
}

fn is_capped_rtpmap(line: &str) -> bool {
    line.starts_with("a=rtpmap") && BITRATE_CODECS.iter().any(|codec| line.contains(codec))
}
