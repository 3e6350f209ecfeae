use crate::trail::{Snapshot, Trail, TrailKind};

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Build the ordered URL-trail candidate list from a stripped request path
/// (spec §4.3 "HTTP extractor"):
///
/// 1. the stripped path itself,
/// 2. if that path has a filename extension, the path with it removed,
/// 3. if the *last appended* candidate contains more than one `/`, that
///    candidate truncated at its last `/`.
fn build_candidates(path: &str) -> Vec<String> {
    let mut candidates = vec![path.to_string()];

    let last_slash = path.rfind('/').unwrap_or(0);
    if let Some(dot) = path.rfind('.') {
        if dot > last_slash {
            candidates.push(path[..dot].to_string());
        }
    }

    if let Some(last) = candidates.last() {
        if last.matches('/').count() > 1 {
            if let Some(slash) = last.rfind('/') {
                let truncated = last[..slash].to_string();
                candidates.push(truncated);
            }
        }
    }

    candidates
}

/// Parse an HTTP/1.x request (spec §4.3 "HTTP extractor") out of `payload`
/// and look up its URL candidates against `snapshot`. Returns the matched
/// trail value (the candidate or `host + candidate` that hit) and the
/// trail it matched, or `None` if the request is malformed, has no `Host`
/// header, or no candidate matches.
pub fn extract_match(payload: &[u8], snapshot: &Snapshot) -> Option<(String, Trail)> {
    let line_end = find(payload, b"\r\n")?;
    let line = &payload[..line_end];

    let space_count = line.iter().filter(|&&b| b == b' ').count();
    if space_count != 2 || find(line, b" HTTP/").is_none() {
        return None;
    }
    let mut parts = line.split(|&b| b == b' ');
    parts.next()?; // method
    let uri = parts.next()?;

    const HOST_MARKER: &[u8] = b"\r\nHost:";
    let host_marker_at = find(payload, HOST_MARKER)?;
    let host_start = host_marker_at + HOST_MARKER.len();
    let rest = &payload[host_start..];
    let host_end = find(rest, b"\r\n")?;
    let host = String::from_utf8_lossy(&rest[..host_end]).trim().to_string();

    let uri_str = String::from_utf8_lossy(uri);
    let path_no_query = uri_str.split('?').next().unwrap_or("");
    let path = path_no_query.strip_suffix('/').unwrap_or(path_no_query);

    for candidate in build_candidates(path) {
        if candidate.is_empty() {
            continue;
        }
        if let Some(trail) = snapshot.get(TrailKind::Url, &candidate) {
            return Some((candidate, trail.clone()));
        }
        let url = format!("{host}{candidate}");
        if let Some(trail) = snapshot.get(TrailKind::Url, &url) {
            return Some((url, trail.clone()));
        }
    }
    None
}
